use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Processed,
    LowYield,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Processed => "processed",
            SkipReason::LowYield => "low-yield",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkipReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(SkipReason::Processed),
            "low-yield" => Ok(SkipReason::LowYield),
            other => Err(format!("未知的跳过原因: {}", other)),
        }
    }
}

/// 跳过日志中的一行
///
/// 格式：`时间\t原因\t条目名\t商店链接`
#[derive(Debug, Clone, PartialEq)]
pub struct SkipLedgerEntry {
    pub item_name: String,
    pub store_link: String,
    pub reason: SkipReason,
    pub timestamp: NaiveDateTime,
}

impl SkipLedgerEntry {
    pub fn new(
        item_name: impl Into<String>,
        store_link: impl Into<String>,
        reason: SkipReason,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            store_link: store_link.into(),
            reason,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.reason,
            self.item_name,
            self.store_link
        )
    }

    /// 解析一行日志，格式不对时返回 `None`
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        let timestamp = NaiveDateTime::parse_from_str(fields.next()?, TIMESTAMP_FORMAT).ok()?;
        let reason = fields.next()?.parse().ok()?;
        let item_name = fields.next()?.to_string();
        let store_link = fields.next().unwrap_or_default().to_string();

        Some(Self {
            item_name,
            store_link,
            reason,
            timestamp,
        })
    }
}
