//! 单个游戏的抓取流程 - 流程层
//!
//! 状态顺序：
//! Idle → SessionStarting → PageLoading → EnrichmentExtraction → DisclosureLoop
//! → ReviewExtraction → Persisting → SessionClosing → Idle
//!
//! 会话一旦建立，无论后面哪一步出错（包括 panic），都会走到 SessionClosing。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::{ItemDetailExtractor, PageLoad, SessionFactory};
use crate::models::{
    CatalogRow, EnrichedAttributes, GameRecord, ReviewRecord, SkipLedgerEntry, SkipReason,
};
use crate::persistence::{self, ArtifactLayout, ReviewWriter, SharedTable};
use crate::services::extraction::{attributes_from_text, build_reviews, description_from_text};
use crate::services::SkipLedger;
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 抓取状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    Idle,
    SessionStarting,
    PageLoading,
    EnrichmentExtraction,
    DisclosureLoop,
    ReviewExtraction,
    Persisting,
    SessionClosing,
}

/// 单个游戏的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// 评论和目录行都已写入
    Persisted { reviews: usize },
    /// 评论数不超过阈值，结果丢弃并记入跳过日志
    LowYield { reviews: usize },
    /// 会话启动或导航失败，下次运行会重试
    SessionFailed { reason: String },
    /// 持久化失败或处理过程 panic
    Failed { reason: String },
}

/// 抓取流程
///
/// - 编排单个游戏从打开会话到关闭会话的全过程
/// - 只通过 `ItemDetailExtractor` 接触页面
/// - 提取失败一律降级为空值，只有会话和持久化错误会改变结果
pub struct HarvestFlow<F: SessionFactory> {
    factory: Arc<F>,
    catalog: SharedTable,
    ledger: SkipLedger,
    review_writer: ReviewWriter,
    settle_delay: Duration,
    max_load_more_clicks: usize,
    low_yield_threshold: usize,
    page_load_timeout: Duration,
}

impl<F: SessionFactory> Clone for HarvestFlow<F> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            catalog: self.catalog.clone(),
            ledger: self.ledger.clone(),
            review_writer: self.review_writer.clone(),
            settle_delay: self.settle_delay,
            max_load_more_clicks: self.max_load_more_clicks,
            low_yield_threshold: self.low_yield_threshold,
            page_load_timeout: self.page_load_timeout,
        }
    }
}

impl<F: SessionFactory> HarvestFlow<F> {
    pub fn new(factory: Arc<F>, layout: &ArtifactLayout, config: &Config) -> Self {
        let catalog = layout.catalog();
        Self {
            factory,
            ledger: SkipLedger::new(catalog.clone(), layout.skip_log()),
            catalog,
            review_writer: layout.review_writer(),
            settle_delay: config.settle_delay(),
            max_load_more_clicks: config.max_load_more_clicks,
            low_yield_threshold: config.low_yield_threshold,
            page_load_timeout: config.page_load_timeout(),
        }
    }

    pub fn ledger(&self) -> &SkipLedger {
        &self.ledger
    }

    /// 处理一个游戏
    pub async fn run(&self, record: &GameRecord, ctx: &ItemCtx) -> HarvestOutcome {
        self.enter(ctx, HarvestState::SessionStarting);
        let mut session = match self.factory.open().await {
            Ok(session) => session,
            Err(e) => {
                error!("{} ❌ 浏览器会话启动失败: {:#}", ctx, e);
                return HarvestOutcome::SessionFailed {
                    reason: format!("{:#}", e),
                };
            }
        };

        let outcome = match AssertUnwindSafe(self.drive(&mut session, record, ctx))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!("{} 💥 处理过程中发生 panic: {}", ctx, reason);
                HarvestOutcome::Failed { reason }
            }
        };

        self.enter(ctx, HarvestState::SessionClosing);
        if let Err(e) = session.close().await {
            warn!("{} ⚠️ 关闭浏览器会话失败: {:#}", ctx, e);
        }
        self.enter(ctx, HarvestState::Idle);

        outcome
    }

    async fn drive(
        &self,
        session: &mut F::Session,
        record: &GameRecord,
        ctx: &ItemCtx,
    ) -> HarvestOutcome {
        self.enter(ctx, HarvestState::PageLoading);
        match session
            .navigate(&record.store_link, self.page_load_timeout)
            .await
        {
            Ok(PageLoad::Loaded) => debug!("{} 页面加载完成", ctx),
            Ok(PageLoad::TimedOut) => {
                warn!("{} ⏱️ 页面加载超时，继续使用已渲染内容", ctx)
            }
            Err(e) => {
                error!("{} ❌ 打开商店页面失败: {:#}", ctx, e);
                return HarvestOutcome::SessionFailed {
                    reason: format!("{:#}", e),
                };
            }
        }

        self.enter(ctx, HarvestState::EnrichmentExtraction);
        let attributes = self.extract_enrichment(session, ctx).await;

        self.enter(ctx, HarvestState::DisclosureLoop);
        let clicks = self.disclose_reviews(session, ctx).await;

        self.enter(ctx, HarvestState::ReviewExtraction);
        let reviews = self.extract_reviews(session, ctx).await;
        info!(
            "{} 📝 提取到 {} 条评论 (加载更多 {} 次)",
            ctx,
            reviews.len(),
            clicks
        );

        self.enter(ctx, HarvestState::Persisting);
        if reviews.len() <= self.low_yield_threshold {
            return self.record_low_yield(record, reviews.len(), ctx).await;
        }
        self.persist(record, &attributes, reviews, ctx).await
    }

    /// 详情面板属性 + 简介，任何失败都降级为空
    async fn extract_enrichment(
        &self,
        session: &mut F::Session,
        ctx: &ItemCtx,
    ) -> EnrichedAttributes {
        let mut attributes = match session.details_text().await {
            Ok(Some(text)) => attributes_from_text(&text),
            Ok(None) => {
                debug!("{} 未找到详情面板", ctx);
                EnrichedAttributes::default()
            }
            Err(e) => {
                warn!("{} ⚠️ 读取详情面板失败: {:#}", ctx, e);
                EnrichedAttributes::default()
            }
        };

        match session.expand_description().await {
            Ok(true) => debug!("{} 已展开简介", ctx),
            Ok(false) => debug!("{} 简介没有展开按钮", ctx),
            Err(e) => debug!("{} 展开简介失败: {:#}", ctx, e),
        }

        attributes.description = match session.description_text().await {
            Ok(text) => text.as_deref().and_then(description_from_text),
            Err(e) => {
                warn!("{} ⚠️ 读取简介失败: {:#}", ctx, e);
                None
            }
        };

        debug!(
            "{} 属性 {} 项, 简介: {}",
            ctx,
            attributes.values.len(),
            attributes
                .description
                .as_deref()
                .map(|d| truncate_text(d, 40))
                .unwrap_or_else(|| "缺失".to_string())
        );
        attributes
    }

    /// 反复点击"加载更多"，返回点击次数
    ///
    /// 按钮消失、达到上限或点击出错都结束循环，不回头重试
    async fn disclose_reviews(&self, session: &mut F::Session, ctx: &ItemCtx) -> usize {
        let mut clicks = 0;
        while clicks < self.max_load_more_clicks {
            match session.click_load_more().await {
                Ok(true) => {
                    clicks += 1;
                    if clicks % 50 == 0 {
                        debug!("{} 已点击加载更多 {} 次", ctx, clicks);
                    }
                    tokio::time::sleep(self.settle_delay).await;
                }
                Ok(false) => {
                    debug!("{} 加载更多按钮已消失", ctx);
                    return clicks;
                }
                Err(e) => {
                    debug!("{} 点击加载更多出错，按已展开处理: {:#}", ctx, e);
                    return clicks;
                }
            }
        }

        warn!(
            "{} ⚠️ 达到加载更多点击上限 ({})",
            ctx, self.max_load_more_clicks
        );
        clicks
    }

    async fn extract_reviews(&self, session: &mut F::Session, ctx: &ItemCtx) -> Vec<ReviewRecord> {
        match session.review_containers().await {
            Ok(raws) => build_reviews(&raws, chrono::Local::now().naive_local()),
            Err(e) => {
                warn!("{} ⚠️ 读取评论容器失败: {:#}", ctx, e);
                Vec::new()
            }
        }
    }

    async fn record_low_yield(
        &self,
        record: &GameRecord,
        reviews: usize,
        ctx: &ItemCtx,
    ) -> HarvestOutcome {
        warn!(
            "{} ⏭️ 评论数 {} 不超过阈值 {}，丢弃结果并记入跳过日志",
            ctx, reviews, self.low_yield_threshold
        );

        let ledger = self.ledger.clone();
        let entry = SkipLedgerEntry::new(record.slug(), &record.store_link, SkipReason::LowYield);
        match persistence::blocking(move || ledger.record(&entry)).await {
            Ok(()) => HarvestOutcome::LowYield { reviews },
            Err(e) => {
                error!("{} ❌ 写入跳过日志失败: {:#}", ctx, e);
                HarvestOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    /// 先写评论文件，再追加目录行
    ///
    /// 目录行是"已处理"的标志，所以必须最后写
    async fn persist(
        &self,
        record: &GameRecord,
        attributes: &EnrichedAttributes,
        reviews: Vec<ReviewRecord>,
        ctx: &ItemCtx,
    ) -> HarvestOutcome {
        let count = reviews.len();
        let slug = record.slug();
        let row = CatalogRow::from_harvest(record, attributes);
        let catalog = self.catalog.clone();
        let writer = self.review_writer.clone();

        let result = persistence::blocking(move || {
            let written = writer.write(&slug, &reviews)?;
            catalog.append_row(&row)?;
            Ok(written)
        })
        .await;

        match result {
            Ok(written) => {
                info!(
                    "{} 💾 已保存 {} 条评论 → {}",
                    ctx,
                    count,
                    written.table_path.display()
                );
                HarvestOutcome::Persisted { reviews: count }
            }
            Err(e) => {
                error!("{} ❌ 持久化失败: {:#}", ctx, e);
                HarvestOutcome::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    fn enter(&self, ctx: &ItemCtx, state: HarvestState) {
        debug!("{} → {:?}", ctx, state);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知 panic".to_string()
    }
}
