//! 多个工作者共同写入的表格产物
//!
//! 每次追加：拿独占锁 → 读全表 → 列并集合并 → 整表重写 → 释放锁。
//! 写入代价与当前表大小成正比，目录规模（数千行）下可以接受。

use crate::error::PersistResult;
use crate::models::CatalogRow;
use crate::persistence::json_mirror::{merge_objects, read_mirror, write_mirror};
use crate::persistence::lock::ArtifactLock;
use crate::persistence::table::{cell_text, Table};
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 共享表格，可带一个 JSON 镜像
#[derive(Debug, Clone)]
pub struct SharedTable {
    table_path: PathBuf,
    mirror_path: Option<PathBuf>,
}

impl SharedTable {
    pub fn new(table_path: impl Into<PathBuf>) -> Self {
        Self {
            table_path: table_path.into(),
            mirror_path: None,
        }
    }

    pub fn with_mirror(table_path: impl Into<PathBuf>, mirror_path: impl Into<PathBuf>) -> Self {
        Self {
            table_path: table_path.into(),
            mirror_path: Some(mirror_path.into()),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    pub fn mirror_path(&self) -> Option<&Path> {
        self.mirror_path.as_deref()
    }

    /// 追加一行到表格和镜像
    ///
    /// 表格里的行就是"已处理"的标记，所以镜像先写，表格最后写；
    /// 任何一步失败都向上返回，不重试
    pub fn append_row(&self, row: &CatalogRow) -> PersistResult<()> {
        let _lock = ArtifactLock::exclusive(&self.table_path)?;
        let mut table = Table::read(&self.table_path)?;
        let cells: Vec<(String, String)> = row
            .cells
            .iter()
            .map(|(k, v)| (k.clone(), cell_text(v)))
            .collect();
        table.merge_row(&cells);

        if let Some(mirror_path) = &self.mirror_path {
            append_to_mirror(mirror_path, row)?;
        }

        table.write(&self.table_path)?;
        debug!(
            "已追加到 {} (共 {} 行)",
            self.table_path.display(),
            table.rows.len()
        );
        Ok(())
    }

    /// 在共享锁下读取整张表
    pub fn snapshot(&self) -> PersistResult<Table> {
        let _lock = ArtifactLock::shared(&self.table_path)?;
        Table::read(&self.table_path)
    }

    /// 某列是否含有给定值（全列扫描）
    pub fn column_contains(&self, column: &str, value: &str) -> PersistResult<bool> {
        let table = self.snapshot()?;
        let found = table.column(column).any(|cell| cell == value);
        Ok(found)
    }

    pub fn row_count(&self) -> PersistResult<usize> {
        Ok(self.snapshot()?.rows.len())
    }
}

// 调用方已持有表格锁，锁顺序固定为 表格 → 镜像
fn append_to_mirror(mirror_path: &Path, row: &CatalogRow) -> PersistResult<()> {
    let _lock = ArtifactLock::exclusive(mirror_path)?;
    let mut objects = read_mirror(mirror_path)?;
    let object: Map<String, JsonValue> = row.cells.iter().cloned().collect();
    merge_objects(&mut objects, vec![object]);
    write_mirror(mirror_path, &objects)
}
