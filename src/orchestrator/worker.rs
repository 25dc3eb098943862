//! 单个工作者 - 编排层
//!
//! 按分区顺序逐个处理游戏：
//! 1. 查跳过账本，已处理的直接跳过，不启动浏览器
//! 2. 委托 `HarvestFlow` 处理单个游戏
//! 3. 单个游戏的 panic 在这里截住，分区继续
//! 4. 每成功处理 K 个游戏冷却一次

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::SessionFactory;
use crate::models::GameRecord;
use crate::persistence;
use crate::utils::logging::{log_worker_complete, log_worker_start};
use crate::workflow::{HarvestFlow, HarvestOutcome, ItemCtx};

/// 一个工作者的处理统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub low_yield: usize,
    pub session_failed: usize,
    pub failed: usize,
    /// 持久化失败或 panic 的游戏名
    pub failed_items: Vec<String>,
}

impl WorkerReport {
    fn new(worker_id: usize, total: usize) -> Self {
        Self {
            worker_id,
            total,
            ..Default::default()
        }
    }

    fn record(&mut self, record: &GameRecord, outcome: &HarvestOutcome) {
        match outcome {
            HarvestOutcome::Persisted { .. } => self.processed += 1,
            HarvestOutcome::LowYield { .. } => self.low_yield += 1,
            HarvestOutcome::SessionFailed { .. } => self.session_failed += 1,
            HarvestOutcome::Failed { .. } => {
                self.failed += 1;
                self.failed_items.push(record.name.clone());
            }
        }
    }
}

/// 工作者
pub struct Worker<F: SessionFactory> {
    id: usize,
    flow: HarvestFlow<F>,
    cooldown_interval: usize,
    cooldown: Duration,
}

impl<F: SessionFactory> Worker<F> {
    pub fn new(id: usize, flow: HarvestFlow<F>, config: &Config) -> Self {
        Self {
            id,
            flow,
            cooldown_interval: config.cooldown_interval,
            cooldown: config.cooldown(),
        }
    }

    /// 处理整个分区
    pub async fn run(self, partition: Vec<GameRecord>) -> WorkerReport {
        let total = partition.len();
        log_worker_start(self.id, total);

        let mut report = WorkerReport::new(self.id, total);

        for (index, record) in partition.iter().enumerate() {
            let ctx = ItemCtx::new(self.id, index + 1, total, record.slug());
            info!("{} 🎮 开始处理: {} ({}/{})", ctx, record.name, index + 1, total);

            if self.already_processed(record, &ctx).await {
                info!("{} ⏭️ 已处理过，跳过", ctx);
                report.skipped += 1;
                continue;
            }

            let outcome = match AssertUnwindSafe(self.flow.run(record, &ctx))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("{} 💥 处理过程中发生 panic，继续下一个", ctx);
                    HarvestOutcome::Failed {
                        reason: "panic".to_string(),
                    }
                }
            };
            report.record(record, &outcome);

            if matches!(outcome, HarvestOutcome::Persisted { .. }) {
                self.maybe_cool_down(report.processed, &ctx).await;
            }
        }

        log_worker_complete(&report);
        report
    }

    /// 账本读失败时按未处理继续
    async fn already_processed(&self, record: &GameRecord, ctx: &ItemCtx) -> bool {
        let ledger = self.flow.ledger().clone();
        let store_link = record.store_link.clone();
        match persistence::blocking(move || ledger.is_processed(&store_link)).await {
            Ok(done) => done,
            Err(e) => {
                warn!("{} ⚠️ 读取跳过账本失败，按未处理继续: {:#}", ctx, e);
                false
            }
        }
    }

    async fn maybe_cool_down(&self, processed: usize, ctx: &ItemCtx) {
        if self.cooldown_interval == 0 || self.cooldown.is_zero() {
            return;
        }
        if processed % self.cooldown_interval == 0 {
            info!("{} 😴 已处理 {} 个，冷却 {:?}", ctx, processed, self.cooldown);
            tokio::time::sleep(self.cooldown).await;
        }
    }
}
