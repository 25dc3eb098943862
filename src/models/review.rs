use serde::{Deserialize, Serialize};
use std::fmt;

/// 字段无法提取时使用的占位值
pub const UNKNOWN: &str = "unknown";

/// 一条用户评论
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewRecord {
    pub title: String,
    /// 0..=5 颗星
    pub rating: u8,
    /// `MM-DD-YYYY HH:MM` 或 "unknown"
    pub timestamp: String,
    pub content: String,
    pub author: String,
    pub helpful_votes: HelpfulVotes,
}

/// 有用票数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpfulVotes {
    Count(u32),
    Unknown,
}

impl fmt::Display for HelpfulVotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelpfulVotes::Count(n) => write!(f, "{}", n),
            HelpfulVotes::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for HelpfulVotes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            HelpfulVotes::Count(n) => serializer.serialize_u32(*n),
            HelpfulVotes::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl<'de> Deserialize<'de> for HelpfulVotes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => HelpfulVotes::Count(n),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(HelpfulVotes::Count)
                .unwrap_or(HelpfulVotes::Unknown),
        })
    }
}

/// 页面上一个评论容器的原始数据
///
/// 每个字段都是按选择器单独查找的结果，找不到为 `None`；
/// `text` 是容器的完整可见文本，用于位置兜底
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawReview {
    pub text: String,
    pub title: Option<String>,
    pub stars: Option<usize>,
    pub timestamp: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub helpful: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpful_votes_serialization() {
        assert_eq!(serde_json::to_string(&HelpfulVotes::Count(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&HelpfulVotes::Unknown).unwrap(),
            "\"unknown\""
        );

        let parsed: HelpfulVotes = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(parsed, HelpfulVotes::Count(12));
        let parsed: HelpfulVotes = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(parsed, HelpfulVotes::Unknown);
    }

    #[test]
    fn test_raw_review_tolerates_missing_keys() {
        let raw: RawReview = serde_json::from_str(r#"{"text": "a\nb", "stars": 3}"#).unwrap();
        assert_eq!(raw.stars, Some(3));
        assert!(raw.author.is_none());
    }
}
