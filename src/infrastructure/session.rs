//! 浏览器会话能力接口 - 基础设施层
//!
//! 抓取流程只依赖这两个 trait，不直接接触 chromiumoxide；
//! 换站点时换选择器集合，测试时换成内存实现。

use crate::models::RawReview;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// 页面加载的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoad {
    /// 页面报告加载完成
    Loaded,
    /// 超时，继续使用已渲染的内容
    TimedOut,
}

/// 单个详情页上的提取能力
///
/// 除 `navigate` 和 `close` 外，所有方法失败都被调用方视为软失败
pub trait ItemDetailExtractor: Send {
    /// 打开详情页，在加载完成或超时后返回
    fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<PageLoad>> + Send;

    /// 详情面板的可见文本
    fn details_text(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// 点击简介的"展开"按钮；没找到返回 false
    fn expand_description(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// 简介块的可见文本
    fn description_text(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// 点击一次"加载更多评论"；按钮不存在返回 false
    fn click_load_more(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// 当前已渲染的所有评论容器
    fn review_containers(&mut self) -> impl Future<Output = Result<Vec<RawReview>>> + Send;

    /// "N ratings, M reviews" 摘要文本
    fn review_summary_text(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// 释放会话
    fn close(self) -> impl Future<Output = Result<()>> + Send;
}

/// 会话工厂：每次调用得到一个全新的、隔离的会话
pub trait SessionFactory: Send + Sync + 'static {
    type Session: ItemDetailExtractor + 'static;

    fn open(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}
