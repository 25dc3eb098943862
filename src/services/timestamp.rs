//! 评论时间归一化为 `MM-DD-YYYY HH:MM`

use crate::models::UNKNOWN;
use chrono::{Datelike, Duration, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

pub const OUTPUT_FORMAT: &str = "%m-%d-%Y %H:%M";

const ABSOLUTE_FORMAT: &str = "%b %d, %Y at %I:%M %p";

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(\d+|an?)\s+(minute|hour|day|week)s?\s+ago$").expect("静态正则")
    })
}

/// 把页面上的时间文本转换为 `MM-DD-YYYY HH:MM`
///
/// - 相对时间（"2 days ago" / "an hour ago"）以 `now` 为基准
/// - 缺年份的绝对时间（"Jan 5 at 3:00 PM"）取 `now` 的年份
/// - 无法解析时返回 "unknown"
pub fn normalize_timestamp(raw: &str, now: NaiveDateTime) -> String {
    parse_timestamp(raw, now)
        .map(|t| t.format(OUTPUT_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn parse_timestamp(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    if text.to_lowercase().ends_with("ago") {
        return parse_relative(&text, now);
    }
    parse_absolute(&text, now.year())
}

fn parse_relative(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = relative_pattern().captures(text)?;
    let amount: i64 = match caps[1].to_lowercase().as_str() {
        "a" | "an" => 1,
        n => n.parse().ok()?,
    };

    let delta = match caps[2].to_lowercase().as_str() {
        "minute" => Duration::try_minutes(amount)?,
        "hour" => Duration::try_hours(amount)?,
        "day" => Duration::try_days(amount)?,
        "week" => Duration::try_weeks(amount)?,
        _ => return None,
    };
    now.checked_sub_signed(delta)
}

fn parse_absolute(text: &str, current_year: i32) -> Option<NaiveDateTime> {
    let (date_part, time_part) = text.split_once(" at ")?;
    let with_year = if date_part.contains(',') {
        text.to_string()
    } else {
        format!("{}, {} at {}", date_part, current_year, time_part)
    };
    NaiveDateTime::parse_from_str(&with_year, ABSOLUTE_FORMAT).ok()
}
