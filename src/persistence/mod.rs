//! 并发持久化层
//!
//! - `lock` - 标记文件上的建议性锁和原子重写
//! - `table` / `json_mirror` - 表格与 JSON 镜像的读写和列并集合并
//! - `shared_table` - 加锁的读-改-写追加
//! - `review_writer` - 每个游戏一份的评论文件

pub mod json_mirror;
pub mod lock;
pub mod review_writer;
pub mod shared_table;
pub mod table;

use crate::error::PersistResult;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub use lock::ArtifactLock;
pub use review_writer::{count_review_rows, ReviewWriter, WrittenReviews};
pub use shared_table::SharedTable;
pub use table::Table;

/// 在 tokio 的阻塞线程池上执行文件读写
pub async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> PersistResult<T> + Send + 'static,
{
    let value = tokio::task::spawn_blocking(f)
        .await
        .context("文件读写任务异常退出")??;
    Ok(value)
}

/// 输出根目录下各产物的位置
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_table(&self) -> PathBuf {
        self.root.join("games_with_reviews.csv")
    }

    pub fn catalog_mirror(&self) -> PathBuf {
        self.root.join("games_with_reviews.json")
    }

    pub fn skip_log(&self) -> PathBuf {
        self.root.join("skipped_games.log")
    }

    pub fn reviews_table_dir(&self) -> PathBuf {
        self.root.join("games_reviews").join("tsv")
    }

    pub fn reviews_csv_dir(&self) -> PathBuf {
        self.root.join("games_reviews").join("csv")
    }

    pub fn verification_log(&self) -> PathBuf {
        self.root.join("reviews_verification.csv")
    }

    pub fn catalog(&self) -> SharedTable {
        SharedTable::with_mirror(self.catalog_table(), self.catalog_mirror())
    }

    pub fn review_writer(&self) -> ReviewWriter {
        ReviewWriter::new(self.reviews_table_dir(), self.reviews_csv_dir())
    }
}
