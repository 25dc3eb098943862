//! 从页面原始数据构建结构化结果 - 业务能力层
//!
//! 只做纯文本处理，不接触浏览器。每个字段按"选择器结果 → 位置猜测 → unknown"
//! 的顺序依次尝试，第一个有值的策略胜出。

use crate::models::{
    AttributeLabel, EnrichedAttributes, HelpfulVotes, RawReview, ReviewRecord, UNKNOWN,
};
use crate::services::timestamp::normalize_timestamp;
use chrono::NaiveDateTime;

/// 一个提取策略：给定评论容器，返回可选的字段值
pub type Strategy<'a, T> = Box<dyn Fn(&RawReview) -> Option<T> + 'a>;

/// 按顺序尝试策略，返回第一个非空结果
pub fn first_present<T>(raw: &RawReview, chain: &[Strategy<'_, T>]) -> Option<T> {
    chain.iter().find_map(|strategy| strategy(raw))
}

/// 容器文本按行切分，去掉空行
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn line_at(index: usize) -> Strategy<'static, String> {
    Box::new(move |raw: &RawReview| text_lines(&raw.text).get(index).map(|l| l.to_string()))
}

/// 评论容器文本中各字段的位置
pub mod positions {
    pub const TITLE: usize = 0;
    pub const TIMESTAMP: usize = 1;
    pub const CONTENT: usize = 2;
    pub const AUTHOR: usize = 3;
}

fn text_field(raw: &RawReview, pick: fn(&RawReview) -> &Option<String>, line: usize) -> String {
    let chain: [Strategy<'_, String>; 2] = [
        Box::new(move |r: &RawReview| non_blank(pick(r))),
        line_at(line),
    ];
    first_present(raw, &chain).unwrap_or_else(|| UNKNOWN.to_string())
}

fn first_integer(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|token| !token.is_empty())
        .and_then(|token| token.parse().ok())
}

/// 有用票数：选择器文本第三个词 → 选择器文本中第一个整数 → 含 "helpful" 的行中第一个整数
pub fn helpful_votes(raw: &RawReview) -> HelpfulVotes {
    let chain: [Strategy<'_, u32>; 3] = [
        Box::new(|r: &RawReview| {
            r.helpful
                .as_deref()
                .and_then(|t| t.split_whitespace().nth(2))
                .and_then(|t| t.parse().ok())
        }),
        Box::new(|r: &RawReview| r.helpful.as_deref().and_then(first_integer)),
        Box::new(|r: &RawReview| {
            text_lines(&r.text)
                .into_iter()
                .find(|line| line.to_lowercase().contains("helpful"))
                .and_then(first_integer)
        }),
    ];
    first_present(raw, &chain)
        .map(HelpfulVotes::Count)
        .unwrap_or(HelpfulVotes::Unknown)
}

/// 星级：填充星的数量，最多 5，找不到为 0
pub fn rating(raw: &RawReview) -> u8 {
    raw.stars.map(|n| n.min(5) as u8).unwrap_or(0)
}

/// 构建一条评论，任何字段缺失都不会影响其他字段
pub fn build_review(raw: &RawReview, now: NaiveDateTime) -> ReviewRecord {
    let timestamp_text = text_field(raw, |r| &r.timestamp, positions::TIMESTAMP);

    ReviewRecord {
        title: text_field(raw, |r| &r.title, positions::TITLE),
        rating: rating(raw),
        timestamp: normalize_timestamp(&timestamp_text, now),
        content: text_field(raw, |r| &r.content, positions::CONTENT),
        author: text_field(raw, |r| &r.author, positions::AUTHOR),
        helpful_votes: helpful_votes(raw),
    }
}

pub fn build_reviews(raws: &[RawReview], now: NaiveDateTime) -> Vec<ReviewRecord> {
    raws.iter().map(|raw| build_review(raw, now)).collect()
}

/// 详情面板：标签词与紧随其后的词配对
///
/// 同一个标签出现多次时以最后一次为准
pub fn pair_attributes(tokens: &[&str]) -> EnrichedAttributes {
    let mut attributes = EnrichedAttributes::default();
    for (i, token) in tokens.iter().enumerate() {
        let Some(label) = AttributeLabel::from_label(token.trim()) else {
            continue;
        };
        if let Some(value) = tokens.get(i + 1) {
            attributes.values.insert(label, value.trim().to_string());
        }
    }
    attributes
}

/// 详情面板的完整文本 → 属性
pub fn attributes_from_text(text: &str) -> EnrichedAttributes {
    let tokens: Vec<&str> = text.split('\n').collect();
    pair_attributes(&tokens)
}

/// 简介块文本：去掉最后一行（展开/收起按钮），其余用空格拼接
pub fn description_from_text(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let body = lines[..lines.len().saturating_sub(1)]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}
