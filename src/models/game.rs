use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// 目录中的一个游戏
///
/// 四个必填字段（id / name / genres / store_link）在加载时已校验，
/// 交给分区器后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub store_link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_formatted: Option<String>,
}

impl GameRecord {
    /// 构造只含必填字段的记录
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        genres: Vec<String>,
        store_link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            genres,
            store_link: store_link.into(),
            developer: None,
            publisher: None,
            platforms: None,
            release_date: None,
            rating_score: None,
            rating_count: None,
            game_mode: None,
            languages: None,
            age_rating: None,
            space_required: None,
            price_amount: None,
            price_formatted: None,
        }
    }

    /// 由商店链接推导出的条目名，用于文件名和跳过日志
    pub fn slug(&self) -> String {
        item_slug(&self.store_link)
    }

    /// 基础字段按固定列序展开，缺失值为 Null
    pub fn base_cells(&self) -> Vec<(String, JsonValue)> {
        fn opt<T: Serialize>(v: &Option<T>) -> JsonValue {
            v.as_ref().map(|x| json!(x)).unwrap_or(JsonValue::Null)
        }

        vec![
            ("id".to_string(), json!(self.id)),
            ("name".to_string(), json!(self.name)),
            ("genres".to_string(), json!(self.genres)),
            ("store_link".to_string(), json!(self.store_link)),
            ("developer".to_string(), opt(&self.developer)),
            ("publisher".to_string(), opt(&self.publisher)),
            ("platforms".to_string(), opt(&self.platforms)),
            ("release_date".to_string(), opt(&self.release_date)),
            ("rating_score".to_string(), opt(&self.rating_score)),
            ("rating_count".to_string(), opt(&self.rating_count)),
            ("game_mode".to_string(), opt(&self.game_mode)),
            ("languages".to_string(), opt(&self.languages)),
            ("age_rating".to_string(), opt(&self.age_rating)),
            ("space_required".to_string(), opt(&self.space_required)),
            ("price_amount".to_string(), opt(&self.price_amount)),
            ("price_formatted".to_string(), opt(&self.price_formatted)),
        ]
    }
}

/// 从商店链接提取条目名
///
/// 去掉查询串和片段、末尾的 `/`，取最后一段路径，并把不适合做文件名的字符换成 `_`
pub fn item_slug(store_link: &str) -> String {
    let without_query = store_link
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let last = without_query.rsplit('/').next().unwrap_or_default();

    let slug: String = last
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}

/// 详情面板中可识别的属性名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeLabel {
    GameModes,
    Multiplayer,
    SupportedPlayerModes,
    SupportedControllers,
    SupportedPlatforms,
    Category,
    Genres,
    Languages,
    Version,
    Developer,
    Publisher,
    Website,
    ReleaseDate,
    SpaceRequired,
    ComfortLevel,
    InternetConnection,
}

impl AttributeLabel {
    /// 全部属性，顺序即输出列序
    pub const ALL: [AttributeLabel; 16] = [
        AttributeLabel::GameModes,
        AttributeLabel::Multiplayer,
        AttributeLabel::SupportedPlayerModes,
        AttributeLabel::SupportedControllers,
        AttributeLabel::SupportedPlatforms,
        AttributeLabel::Category,
        AttributeLabel::Genres,
        AttributeLabel::Languages,
        AttributeLabel::Version,
        AttributeLabel::Developer,
        AttributeLabel::Publisher,
        AttributeLabel::Website,
        AttributeLabel::ReleaseDate,
        AttributeLabel::SpaceRequired,
        AttributeLabel::ComfortLevel,
        AttributeLabel::InternetConnection,
    ];

    /// 页面上显示的标签文本
    pub fn label(self) -> &'static str {
        match self {
            AttributeLabel::GameModes => "Game modes",
            AttributeLabel::Multiplayer => "Multiplayer",
            AttributeLabel::SupportedPlayerModes => "Supported player modes",
            AttributeLabel::SupportedControllers => "Supported controllers",
            AttributeLabel::SupportedPlatforms => "Supported platforms",
            AttributeLabel::Category => "Category",
            AttributeLabel::Genres => "Genres",
            AttributeLabel::Languages => "Languages",
            AttributeLabel::Version => "Version",
            AttributeLabel::Developer => "Developer",
            AttributeLabel::Publisher => "Publisher",
            AttributeLabel::Website => "Website",
            AttributeLabel::ReleaseDate => "Release date",
            AttributeLabel::SpaceRequired => "Space required",
            AttributeLabel::ComfortLevel => "Comfort level",
            AttributeLabel::InternetConnection => "Internet connection",
        }
    }

    /// 从标签文本解析
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == text)
    }
}

impl fmt::Display for AttributeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 详情页补充的属性和简介
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedAttributes {
    pub values: BTreeMap<AttributeLabel, String>,
    pub description: Option<String>,
}

impl EnrichedAttributes {
    pub fn get(&self, label: AttributeLabel) -> Option<&str> {
        self.values.get(&label).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.description.is_none()
    }
}

/// 写入共享表格的一行：基础字段 + 属性 + 简介
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub cells: Vec<(String, JsonValue)>,
}

impl CatalogRow {
    pub fn new(cells: Vec<(String, JsonValue)>) -> Self {
        Self { cells }
    }

    pub fn from_harvest(record: &GameRecord, attributes: &EnrichedAttributes) -> Self {
        let mut cells = record.base_cells();
        for (label, value) in &attributes.values {
            cells.push((label.label().to_string(), json!(value)));
        }
        if let Some(description) = &attributes.description {
            cells.push(("description".to_string(), json!(description)));
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_store_link() {
        assert_eq!(
            item_slug("https://www.meta.com/experiences/beat-saber/2448060205267927/?utm_source=x"),
            "2448060205267927"
        );
        assert_eq!(
            item_slug("https://www.meta.com/experiences/superhot-vr"),
            "superhot-vr"
        );
        assert_eq!(item_slug("https://example.com/a b#frag"), "a_b");
        assert_eq!(item_slug(""), "unnamed");
    }

    #[test]
    fn test_label_roundtrip_covers_vocabulary() {
        for label in AttributeLabel::ALL {
            assert_eq!(AttributeLabel::from_label(label.label()), Some(label));
        }
        assert_eq!(AttributeLabel::from_label("Rating"), None);
    }

    #[test]
    fn test_catalog_row_layout() {
        let record = GameRecord::new("1", "Beat Saber", vec!["Music".into()], "https://x/beat");
        let mut attributes = EnrichedAttributes::default();
        attributes
            .values
            .insert(AttributeLabel::Publisher, "Beat Games".to_string());
        attributes.description = Some("Slash the beats".to_string());

        let row = CatalogRow::from_harvest(&record, &attributes);
        assert_eq!(row.cells[0].0, "id");
        assert_eq!(row.get("store_link"), Some(&json!("https://x/beat")));
        assert_eq!(row.get("developer"), Some(&JsonValue::Null));
        assert_eq!(row.get("Publisher"), Some(&json!("Beat Games")));
        assert_eq!(row.cells.last().map(|(k, _)| k.as_str()), Some("description"));
    }
}
