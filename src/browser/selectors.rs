//! 页面选择器集合
//!
//! 站点改版时只需换一份 TOML，不用改抓取流程

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一套站点选择器（CSS）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorSet {
    /// 详情面板
    pub details_panel: String,
    /// 简介"展开"按钮
    pub description_more_control: String,
    pub description_more_text: String,
    /// 简介文本块
    pub description_block: String,
    /// "加载更多评论"按钮
    pub load_more_control: String,
    pub load_more_text: String,
    /// 单条评论容器
    pub review_container: String,
    pub review_title: String,
    pub star_container: String,
    pub filled_star: String,
    pub review_content: String,
    pub review_author: String,
    pub review_helpful: String,
    pub review_timestamp: String,
    /// "N ratings, M reviews" 摘要
    pub review_summary: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self::meta_store()
    }
}

impl SelectorSet {
    /// Meta Horizon 商店页面
    pub fn meta_store() -> Self {
        Self {
            details_panel: "div.x78zum5.x1l7klhg.x1iyjqo2.x2lah0s.x1a02dak.xd2bs7b.x5bj0eh.x1sje56t.x2b88hg.x17tu2g0.xnjo89n.xo2o5nc.xv9pgs7.xjfzuef".to_string(),
            description_more_control: "div[role='button'].x1i10hfl".to_string(),
            description_more_text: "more...".to_string(),
            description_block: "div.xeuugli.x2lwn1j.x78zum5.xdt5ytf.xozqiw3.x3pnbk8".to_string(),
            load_more_control: "div.x78zum5.xl56j7k > span".to_string(),
            load_more_text: "Show more reviews".to_string(),
            review_container: "div.xeuugli.x2lwn1j.x78zum5.xdt5ytf.xgpatz3.x40hh3e".to_string(),
            review_title: "div[class='x16g9bbj x17gzxuv xv6bue1 xm5vtmc xsp84uj x1j402mz x1wsgf3v x14imz66 x1k03ns3 xcxolhg xjbavb x1npfmwo x16b4c32 xrm2kyc x1i6xp69 xvyeec0 x12429cg x6tc29j xbq7h4v x6jdkww xq9mrsl']".to_string(),
            star_container: ".x3nfvp2".to_string(),
            filled_star: ".xjbqb8w".to_string(),
            review_content: "div[class='x17gzxuv x3a6nna xm5vtmc x1t2x7uc x1o1n6r0 x1wsgf3v x1c773n9 x1k03ns3 xpbi8i2 x9820fh x1npfmwo xhj0du5 xrm2kyc xjprkx4 xlu1awn']".to_string(),
            review_author: "span.x16g9bbj.x17gzxuv.x1rujz1s.xm5vtmc.x3voqp2.x658qfi.x1wsgf3v.xn1wy4v.x1k03ns3.xpbi8i2.xh2n1af.x1npfmwo.xg94uf4.xrm2kyc.xjprkx4.xawl3gl.x12429cg.x6tc29j.xbq7h4v.x6jdkww.xq9mrsl".to_string(),
            review_helpful: ".x1heor9g.x17gzxuv.x1rujz1s.xex5isp.xsp84uj.x658qfi.x1wsgf3v.xn1wy4v.xby3lk6.xcxolhg.xh2n1af.x1npfmwo.xg94uf4.x1yyhlu9.x1i6xp69.xawl3gl.x12429cg.x6tc29j.xbq7h4v.x6jdkww.xq9mrsl.x1iorvi4.xjkvuk6".to_string(),
            review_timestamp: ".x16g9bbj.x17gzxuv.x3a6nna.xm5vtmc.x1t2x7uc.x1o1n6r0.x1wsgf3v.x1c773n9.x1k03ns3.xpbi8i2.x9820fh.x1npfmwo.xhj0du5.xrm2kyc.xjprkx4.xlu1awn.x12429cg.x6tc29j.xbq7h4v.x6jdkww.xq9mrsl".to_string(),
            review_summary: "span.x16g9bbj".to_string(),
        }
    }

    /// 从 TOML 文件加载，未写出的字段使用默认值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::SelectorsInvalid {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// 配置了文件就加载文件，否则用默认
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selectors.toml");
        std::fs::write(
            &path,
            "load_more_text = \"Load more\"\nreview_container = \"article.review\"\n",
        )
        .unwrap();

        let set = SelectorSet::load(&path).unwrap();
        assert_eq!(set.load_more_text, "Load more");
        assert_eq!(set.review_container, "article.review");
        assert_eq!(set.filled_star, SelectorSet::meta_store().filled_star);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "load_more_text = [").unwrap();
        assert!(matches!(
            SelectorSet::load(&path),
            Err(ConfigError::SelectorsInvalid { .. })
        ));
        assert!(SelectorSet::from_optional_file(None).is_ok());
    }
}
