use crate::error::CatalogError;
use crate::models::game::GameRecord;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;

/// 目录文件中的原始记录，必填字段在校验前都是可选的
#[derive(Debug, Deserialize)]
struct RawGameRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    genres: Option<Vec<String>>,
    #[serde(default, alias = "storeLink")]
    store_link: Option<String>,

    #[serde(default)]
    developer: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    platforms: Option<Vec<String>>,
    #[serde(default, alias = "releaseDate")]
    release_date: Option<String>,
    #[serde(default, alias = "ratingScore")]
    rating_score: Option<f64>,
    #[serde(default, alias = "ratingCount")]
    rating_count: Option<u64>,
    #[serde(default, alias = "gameMode")]
    game_mode: Option<String>,
    #[serde(default)]
    languages: Option<Vec<String>>,
    #[serde(default, alias = "ageRating")]
    age_rating: Option<String>,
    #[serde(default, alias = "spaceRequired")]
    space_required: Option<String>,
    #[serde(default, alias = "priceAmount")]
    price_amount: Option<f64>,
    #[serde(default, alias = "priceFormatted")]
    price_formatted: Option<String>,
}

// id 既可能是字符串也可能是数字
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawGameRecord {
    fn validate(self) -> Option<GameRecord> {
        Some(GameRecord {
            id: non_empty(self.id)?,
            name: non_empty(self.name)?,
            genres: self.genres?,
            store_link: non_empty(self.store_link)?,
            developer: self.developer,
            publisher: self.publisher,
            platforms: self.platforms,
            release_date: self.release_date,
            rating_score: self.rating_score,
            rating_count: self.rating_count,
            game_mode: self.game_mode,
            languages: self.languages,
            age_rating: self.age_rating,
            space_required: self.space_required,
            price_amount: self.price_amount,
            price_formatted: self.price_formatted,
        })
    }
}

/// 解析目录 JSON 文本
///
/// 只要有一条记录缺少必填字段，整批拒绝
pub fn parse_catalog(content: &str, source: &str) -> Result<Vec<GameRecord>, CatalogError> {
    let raw: Vec<RawGameRecord> =
        serde_json::from_str(content).map_err(|source_err| CatalogError::ParseFailed {
            path: source.to_string(),
            source: source_err,
        })?;

    let mut records = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for (index, item) in raw.into_iter().enumerate() {
        match item.validate() {
            Some(record) => records.push(record),
            None => rejected.push(index),
        }
    }

    if !rejected.is_empty() {
        return Err(CatalogError::Rejected { indexes: rejected });
    }

    Ok(records)
}

/// 从 JSON 文件加载目录
pub async fn load_catalog(path: &Path) -> Result<Vec<GameRecord>, CatalogError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let records = parse_catalog(&content, &path.display().to_string())?;
    tracing::info!("成功加载 {} 个游戏: {}", records.len(), path.display());

    Ok(records)
}
