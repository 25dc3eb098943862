//! 评论数核对 - 编排层
//!
//! 对每个新生成的评论文件：数行数，打开商店页读取 "N ratings, M reviews"，
//! 把两边的数字追加到核对表。核对表与目录表使用同样的加锁追加。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::{ItemDetailExtractor, SessionFactory};
use crate::models::CatalogRow;
use crate::persistence::{self, count_review_rows, ArtifactLayout, SharedTable};

/// 核对表中用来判断"是否已核对"的列
pub const FILENAME_COLUMN: &str = "filename";

fn summary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([\d,]+)\s*ratings,\s*([\d,]+)\s*reviews").expect("静态正则")
    })
}

/// 解析 "1,234 ratings, 56 reviews"
pub fn parse_review_summary(text: &str) -> Option<(u64, u64)> {
    let caps = summary_pattern().captures(text)?;
    let number = |s: &str| s.replace(',', "").parse::<u64>().ok();
    Some((number(&caps[1])?, number(&caps[2])?))
}

/// 核对表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub filename: String,
    pub url: String,
    pub ratings: Option<u64>,
    pub reviews: Option<u64>,
    pub file_reviews: usize,
    pub processed_at: chrono::NaiveDateTime,
}

impl VerificationRecord {
    fn into_row(self) -> CatalogRow {
        let opt = |v: Option<u64>| v.map(|n| json!(n)).unwrap_or(JsonValue::Null);
        CatalogRow::new(vec![
            (FILENAME_COLUMN.to_string(), json!(self.filename)),
            ("url".to_string(), json!(self.url)),
            ("ratings".to_string(), opt(self.ratings)),
            ("reviews".to_string(), opt(self.reviews)),
            ("file_reviews".to_string(), json!(self.file_reviews)),
            (
                "processed_at".to_string(),
                json!(self.processed_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ),
        ])
    }
}

/// 一次扫描的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub verified: usize,
    pub already_verified: usize,
    pub failed: usize,
}

/// 评论数核对器
pub struct Verifier<F: SessionFactory> {
    factory: Arc<F>,
    table_dir: PathBuf,
    log: SharedTable,
    base_url: String,
    page_load_timeout: Duration,
    interval: Duration,
}

impl<F: SessionFactory> Verifier<F> {
    pub fn new(factory: Arc<F>, layout: &ArtifactLayout, config: &Config) -> Self {
        Self {
            factory,
            table_dir: layout.reviews_table_dir(),
            log: SharedTable::new(layout.verification_log()),
            base_url: config.verify_base_url.trim_end_matches('/').to_string(),
            page_load_timeout: config.page_load_timeout(),
            interval: Duration::from_secs(config.verify_interval_secs),
        }
    }

    /// 扫描一次评论目录
    pub async fn scan_once(&self) -> Result<ScanStats> {
        let files = list_review_files(&self.table_dir).await?;
        let log = self.log.clone();
        let done: Vec<String> = persistence::blocking(move || {
            let table = log.snapshot()?;
            Ok(table.column(FILENAME_COLUMN).map(str::to_string).collect())
        })
        .await?;

        let mut stats = ScanStats::default();
        for path in files {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
            else {
                continue;
            };
            if done.contains(&filename) {
                debug!("已核对过: {}", filename);
                stats.already_verified += 1;
                continue;
            }

            match self.verify_file(&path, filename.clone()).await {
                Ok(record) => {
                    info!(
                        "🔎 {}: 页面 {:?} ratings / {:?} reviews，文件 {} 条",
                        record.filename, record.ratings, record.reviews, record.file_reviews
                    );
                    let log = self.log.clone();
                    persistence::blocking(move || log.append_row(&record.into_row())).await?;
                    stats.verified += 1;
                }
                Err(e) => {
                    error!("❌ 核对 {} 失败: {:#}", filename, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "✓ 核对完成: 新核对 {}，已核对 {}，失败 {}",
            stats.verified, stats.already_verified, stats.failed
        );
        Ok(stats)
    }

    /// 持续监控，直到收到 Ctrl-C
    pub async fn watch(&self) -> Result<()> {
        info!("👀 进入监控模式，每 {:?} 扫描一次", self.interval);
        loop {
            if let Err(e) = self.scan_once().await {
                error!("❌ 扫描失败: {:#}", e);
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("收到中断信号，退出监控");
                    return Ok(());
                }
            }
        }
    }

    async fn verify_file(&self, path: &Path, filename: String) -> Result<VerificationRecord> {
        let counted = path.to_path_buf();
        let file_reviews = persistence::blocking(move || count_review_rows(&counted)).await?;

        let slug = filename.trim_end_matches(".tsv");
        let url = format!("{}/{}", self.base_url, slug);
        let (ratings, reviews) = self.read_store_summary(&url).await?;

        Ok(VerificationRecord {
            filename,
            url,
            ratings,
            reviews,
            file_reviews,
            processed_at: chrono::Local::now().naive_local(),
        })
    }

    /// 会话启动或导航失败是错误；找不到摘要只记空值
    async fn read_store_summary(&self, url: &str) -> Result<(Option<u64>, Option<u64>)> {
        let mut session = self.factory.open().await.context("启动浏览器会话失败")?;

        let result = async {
            session.navigate(url, self.page_load_timeout).await?;
            session.review_summary_text().await
        }
        .await;

        if let Err(e) = session.close().await {
            warn!("⚠️ 关闭浏览器会话失败: {:#}", e);
        }

        let text = result?;
        match text.as_deref().and_then(parse_review_summary) {
            Some((ratings, reviews)) => Ok((Some(ratings), Some(reviews))),
            None => {
                warn!("⚠️ 页面上没有找到评论摘要: {}", url);
                Ok((None, None))
            }
        }
    }
}

/// 目录下所有 `.tsv`，按文件名排序；目录不存在时为空
async fn list_review_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("无法读取目录: {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tsv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
