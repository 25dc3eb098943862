//! 单个游戏的评论文件
//!
//! 每个游戏只由一个工作者写一次，不需要加锁

use crate::error::PersistResult;
use crate::models::ReviewRecord;
use crate::persistence::table::Table;
use std::path::{Path, PathBuf};

pub const REVIEW_COLUMNS: [&str; 6] = [
    "title",
    "rating",
    "time",
    "content",
    "author",
    "helpful_votes",
];

/// 评论文件写入器
#[derive(Debug, Clone)]
pub struct ReviewWriter {
    table_dir: PathBuf,
    csv_dir: PathBuf,
}

/// 一次写入产生的两个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReviews {
    pub table_path: PathBuf,
    pub csv_path: PathBuf,
}

impl ReviewWriter {
    pub fn new(table_dir: impl Into<PathBuf>, csv_dir: impl Into<PathBuf>) -> Self {
        Self {
            table_dir: table_dir.into(),
            csv_dir: csv_dir.into(),
        }
    }

    pub fn table_dir(&self) -> &Path {
        &self.table_dir
    }

    /// `<table_dir>/<slug>.tsv`
    pub fn table_path(&self, slug: &str) -> PathBuf {
        self.table_dir.join(format!("{}.tsv", slug))
    }

    /// `<csv_dir>/<slug>_<条数>.csv`
    pub fn csv_path(&self, slug: &str, count: usize) -> PathBuf {
        self.csv_dir.join(format!("{}_{}.csv", slug, count))
    }

    pub fn write(&self, slug: &str, reviews: &[ReviewRecord]) -> PersistResult<WrittenReviews> {
        let table = to_table(reviews);

        let table_path = self.table_path(slug);
        table.write_with_delimiter(&table_path, b'\t')?;

        let csv_path = self.csv_path(slug, reviews.len());
        table.write(&csv_path)?;

        Ok(WrittenReviews {
            table_path,
            csv_path,
        })
    }
}

fn to_table(reviews: &[ReviewRecord]) -> Table {
    Table {
        headers: REVIEW_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: reviews
            .iter()
            .map(|r| {
                vec![
                    r.title.clone(),
                    r.rating.to_string(),
                    r.timestamp.clone(),
                    r.content.clone(),
                    r.author.clone(),
                    r.helpful_votes.to_string(),
                ]
            })
            .collect(),
    }
}

/// 统计一个评论文件的行数（不含表头）
pub fn count_review_rows(path: &Path) -> PersistResult<usize> {
    let delimiter = if path.extension().and_then(|e| e.to_str()) == Some("tsv") {
        b'\t'
    } else {
        b','
    };
    Ok(Table::read_with_delimiter(path, delimiter)?.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HelpfulVotes;

    fn review(n: u32) -> ReviewRecord {
        ReviewRecord {
            title: format!("Title {}", n),
            rating: 4,
            timestamp: "01-05-2024 15:00".to_string(),
            content: "Great, really\tgreat".to_string(),
            author: "someone".to_string(),
            helpful_votes: if n % 2 == 0 {
                HelpfulVotes::Count(n)
            } else {
                HelpfulVotes::Unknown
            },
        }
    }

    #[test]
    fn test_writes_tsv_and_count_suffixed_csv() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReviewWriter::new(dir.path().join("tsv"), dir.path().join("csv"));
        let reviews: Vec<_> = (0..3).map(review).collect();

        let written = writer.write("beat-saber", &reviews).unwrap();
        assert_eq!(written.table_path, dir.path().join("tsv").join("beat-saber.tsv"));
        assert_eq!(written.csv_path, dir.path().join("csv").join("beat-saber_3.csv"));

        assert_eq!(count_review_rows(&written.table_path).unwrap(), 3);
        assert_eq!(count_review_rows(&written.csv_path).unwrap(), 3);

        let table = Table::read_with_delimiter(&written.table_path, b'\t').unwrap();
        assert_eq!(table.headers, REVIEW_COLUMNS);
        assert_eq!(table.rows[0][3], "Great, really\tgreat");
        assert_eq!(table.rows[0][5], "0");
        assert_eq!(table.rows[1][5], "unknown");
    }
}
