//! 集成测试共用的内存会话实现

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use vr_review_harvester::{
    Config, GameRecord, ItemDetailExtractor, PageLoad, RawReview, SessionFactory,
};

/// 每次点击"加载更多"多露出的评论数
pub const PAGE_SIZE: usize = 10;

/// 一个假商店页面
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub total_reviews: usize,
    pub details: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub fail_navigation: bool,
    pub panic_on_reviews: bool,
    /// 导航以超时结束，但内容照常可读
    pub time_out: bool,
    /// 点击这么多次之后，再点"加载更多"就报错
    pub click_error_after: Option<usize>,
    /// 详情面板和简介读取都报错
    pub details_error: bool,
}

impl FakePage {
    pub fn with_reviews(total_reviews: usize) -> Self {
        Self {
            total_reviews,
            details: Some("Genres\nRhythm\nDeveloper\nBeat Games\nVersion\n1.40.0".to_string()),
            description: Some("Slash the beats.\nFeel the rhythm.\nless".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// 按商店链接返回假页面的会话工厂
#[derive(Debug, Default)]
pub struct FakeFactory {
    pages: HashMap<String, FakePage>,
    fail_open: bool,
    pub counters: Arc<Counters>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// 所有会话都启动失败
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            bail!("浏览器启动失败");
        }
        Ok(FakeSession {
            pages: self.pages.clone(),
            current: None,
            clicks: 0,
            counters: self.counters.clone(),
        })
    }
}

pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: Option<FakePage>,
    clicks: usize,
    counters: Arc<Counters>,
}

impl FakeSession {
    fn page(&self) -> Result<&FakePage> {
        match &self.current {
            Some(page) => Ok(page),
            None => bail!("还没有打开页面"),
        }
    }

    fn visible(&self) -> Result<usize> {
        let page = self.page()?;
        Ok(page.total_reviews.min(PAGE_SIZE * (self.clicks + 1)))
    }
}

pub fn raw_review(n: usize) -> RawReview {
    RawReview {
        text: format!(
            "Review {}\n2 days ago\nBody {}\nplayer{}\n{} people found this helpful",
            n, n, n, n
        ),
        title: Some(format!("Review {}", n)),
        stars: Some(n % 6),
        timestamp: Some("Jan 5, 2024 at 3:00 PM".to_string()),
        content: Some(format!("Body {}", n)),
        author: Some(format!("player{}", n)),
        helpful: None,
    }
}

impl ItemDetailExtractor for FakeSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<PageLoad> {
        let Some(page) = self.pages.get(url).cloned() else {
            bail!("404: {}", url);
        };
        if page.fail_navigation {
            bail!("导航失败: {}", url);
        }
        let load = if page.time_out {
            PageLoad::TimedOut
        } else {
            PageLoad::Loaded
        };
        self.current = Some(page);
        self.clicks = 0;
        Ok(load)
    }

    async fn details_text(&mut self) -> Result<Option<String>> {
        if self.page()?.details_error {
            bail!("详情面板脚本执行失败");
        }
        Ok(self.page()?.details.clone())
    }

    async fn expand_description(&mut self) -> Result<bool> {
        Ok(self.page()?.description.is_some())
    }

    async fn description_text(&mut self) -> Result<Option<String>> {
        if self.page()?.details_error {
            bail!("简介脚本执行失败");
        }
        Ok(self.page()?.description.clone())
    }

    async fn click_load_more(&mut self) -> Result<bool> {
        if self.page()?.click_error_after.is_some_and(|n| self.clicks >= n) {
            bail!("加载更多按钮已脱离文档");
        }
        if self.visible()? >= self.page()?.total_reviews {
            return Ok(false);
        }
        self.clicks += 1;
        Ok(true)
    }

    async fn review_containers(&mut self) -> Result<Vec<RawReview>> {
        if self.page()?.panic_on_reviews {
            panic!("评论容器结构异常");
        }
        Ok((1..=self.visible()?).map(raw_review).collect())
    }

    async fn review_summary_text(&mut self) -> Result<Option<String>> {
        Ok(self.page()?.summary.clone())
    }

    async fn close(self) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn game(slug: &str) -> GameRecord {
    GameRecord::new(
        slug.len().to_string(),
        slug.replace('-', " "),
        vec!["Action".to_string()],
        store_link(slug),
    )
}

pub fn store_link(slug: &str) -> String {
    format!("https://www.meta.com/experiences/{}", slug)
}

/// 测试用配置：无等待，两个工作者
pub fn test_config(root: &Path) -> Config {
    Config {
        worker_count: Some(2),
        settle_delay_ms: 0,
        output_root: root.to_path_buf(),
        ..Config::default()
    }
}
