//! 跳过/续跑账本 - 业务能力层
//!
//! 只负责回答"这个游戏是否已经处理过"，以及记录低产出跳过。
//! 检查与之后的写入不在同一个事务里：跨进程、崩溃后续跑时可能重复处理同一项（至少一次语义）。

use crate::error::{PersistError, PersistResult};
use crate::models::{item_slug, SkipLedgerEntry};
use crate::persistence::{ArtifactLock, SharedTable};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 共享表格里用作键的列
pub const STORE_LINK_COLUMN: &str = "store_link";

/// 跳过账本
///
/// 权威状态 = 共享表格中的 store_link 列 ∪ 跳过日志中的条目名
#[derive(Debug, Clone)]
pub struct SkipLedger {
    catalog: SharedTable,
    log_path: PathBuf,
}

impl SkipLedger {
    pub fn new(catalog: SharedTable, log_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            log_path: log_path.into(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 先扫共享表格，再查跳过日志，任一命中即为已处理
    pub fn is_processed(&self, store_link: &str) -> PersistResult<bool> {
        if self.catalog.column_contains(STORE_LINK_COLUMN, store_link)? {
            debug!("共享表格中已有: {}", store_link);
            return Ok(true);
        }

        let slug = item_slug(store_link);
        let found = self.entries()?.iter().any(|e| e.item_name == slug);
        if found {
            debug!("跳过日志中已有: {}", slug);
        }
        Ok(found)
    }

    /// 读出跳过日志中所有可解析的行
    pub fn entries(&self) -> PersistResult<Vec<SkipLedgerEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let _lock = ArtifactLock::shared(&self.log_path)?;
        let content = std::fs::read_to_string(&self.log_path)
            .map_err(|e| PersistError::read(&self.log_path, e))?;
        Ok(content.lines().filter_map(SkipLedgerEntry::parse_line).collect())
    }

    /// 追加一行
    pub fn record(&self, entry: &SkipLedgerEntry) -> PersistResult<()> {
        let _lock = ArtifactLock::exclusive(&self.log_path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| PersistError::write(&self.log_path, e))?;
        file.write_all(entry.to_line().as_bytes())
            .map_err(|e| PersistError::write(&self.log_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogRow, SkipReason};
    use serde_json::json;

    fn ledger(dir: &Path) -> SkipLedger {
        SkipLedger::new(
            SharedTable::with_mirror(dir.join("g.csv"), dir.join("g.json")),
            dir.join("skipped.log"),
        )
    }

    #[test]
    fn test_catalog_row_marks_processed() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        assert!(!ledger.is_processed("https://x/superhot").unwrap());

        SharedTable::with_mirror(dir.path().join("g.csv"), dir.path().join("g.json"))
            .append_row(&CatalogRow::new(vec![(
                STORE_LINK_COLUMN.to_string(),
                json!("https://x/superhot"),
            )]))
            .unwrap();

        assert!(ledger.is_processed("https://x/superhot").unwrap());
        assert!(!ledger.is_processed("https://x/other").unwrap());
    }

    #[test]
    fn test_skip_log_marks_processed_by_item_name() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());

        ledger
            .record(&SkipLedgerEntry::new(
                "superhot",
                "https://x/superhot",
                SkipReason::LowYield,
            ))
            .unwrap();

        // 查询链接不同但条目名相同
        assert!(ledger.is_processed("https://x/superhot/?ref=home").unwrap());
        assert_eq!(ledger.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_unparseable_log_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        std::fs::write(
            ledger.log_path(),
            "hand-written note\n2024-01-01 10:00:00\tprocessed\tbeat-saber\thttps://x/beat-saber\n",
        )
        .unwrap();

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(ledger.is_processed("https://x/beat-saber").unwrap());
    }
}
