//! 批量抓取处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责整批目录的调度和统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：准备输出目录，抓取开始时写运行日志表头
//! 2. **目录加载**：读取并校验目录 JSON（`Vec<GameRecord>`）
//! 3. **工作分区**：按工作者数量切成连续、保序的分区
//! 4. **并发处理**：每个分区一个 tokio 任务，任务之间只共享不可变配置
//! 5. **全局统计**：汇总各工作者的 `WorkerReport`，写入运行日志
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个游戏的细节
//! - **会话隔离**：不持有浏览器，每个游戏由工厂新建会话
//! - **向下委托**：委托 `Worker` 处理分区

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::browser::SelectorSet;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromiumSessionFactory, SessionFactory};
use crate::models::{load_catalog, GameRecord};
use crate::orchestrator::partition::partition;
use crate::orchestrator::verifier::{ScanStats, Verifier};
use crate::orchestrator::worker::{Worker, WorkerReport};
use crate::persistence::ArtifactLayout;
use crate::utils::logging::{
    append_run_log, init_log_file, log_catalog_loaded, log_startup, print_final_stats,
};
use crate::workflow::HarvestFlow;

/// 整次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub low_yield: usize,
    pub session_failed: usize,
    pub failed: usize,
    pub failed_items: Vec<String>,
}

impl RunSummary {
    fn absorb(&mut self, report: &WorkerReport) {
        self.processed += report.processed;
        self.skipped += report.skipped;
        self.low_yield += report.low_yield;
        self.session_failed += report.session_failed;
        self.failed += report.failed;
        self.failed_items.extend(report.failed_items.iter().cloned());
    }

    /// 是否有持久化失败（或 panic）
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// 写入运行日志的文本
    pub fn render(&self) -> String {
        let mut text = format!(
            "{}\n运行结束 - {}\n总数: {}\n成功: {}\n已处理跳过: {}\n低产出: {}\n会话失败: {}\n失败: {}\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.total,
            self.processed,
            self.skipped,
            self.low_yield,
            self.session_failed,
            self.failed,
        );
        for name in &self.failed_items {
            text.push_str(&format!("  - {}\n", name));
        }
        text
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    layout: ArtifactLayout,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        tokio::fs::create_dir_all(&config.output_root)
            .await
            .with_context(|| format!("无法创建输出目录: {}", config.output_root.display()))?;

        log_startup(&config);

        let layout = ArtifactLayout::new(&config.output_root);
        Ok(Self { config, layout })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行抓取：加载目录并用 Chromium 会话处理
    pub async fn run(&self) -> Result<RunSummary> {
        init_log_file(&self.config.run_log_path())?;
        let catalog = self.load_catalog().await?;
        if catalog.is_empty() {
            warn!("⚠️ 目录为空，程序结束");
            return Ok(RunSummary::default());
        }

        let factory = Arc::new(self.session_factory()?);
        self.harvest(catalog, factory).await
    }

    /// 运行评论数核对
    pub async fn verify(&self, watch: bool) -> Result<ScanStats> {
        let factory = Arc::new(self.session_factory()?);
        let verifier = Verifier::new(factory, &self.layout, &self.config);
        if watch {
            verifier.watch().await?;
            Ok(ScanStats::default())
        } else {
            verifier.scan_once().await
        }
    }

    /// 对给定目录执行一次完整抓取
    pub async fn harvest<F: SessionFactory>(
        &self,
        catalog: Vec<GameRecord>,
        factory: Arc<F>,
    ) -> Result<RunSummary> {
        let workers = self.config.resolved_worker_count();
        log_catalog_loaded(catalog.len(), workers);

        let flow = HarvestFlow::new(factory, &self.layout, &self.config);
        let mut summary = RunSummary {
            total: catalog.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();
        for (index, part) in partition(&catalog, workers).into_iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            let worker = Worker::new(index + 1, flow.clone(), &self.config);
            handles.push((index + 1, tokio::spawn(worker.run(part))));
        }

        for (worker_id, handle) in handles {
            match handle.await {
                Ok(report) => summary.absorb(&report),
                Err(e) => {
                    error!("[worker {}] 任务异常退出: {}", worker_id, e);
                    summary.failed += 1;
                    summary.failed_items.push(format!("worker {}", worker_id));
                }
            }
        }

        let log_path = self.config.run_log_path();
        print_final_stats(&summary, &log_path);
        append_run_log(&log_path, &summary.render())?;

        Ok(summary)
    }

    async fn load_catalog(&self) -> Result<Vec<GameRecord>> {
        info!("\n📁 正在加载目录: {}", self.config.catalog_path.display());
        let catalog = load_catalog(&self.config.catalog_path)
            .await
            .with_context(|| format!("目录加载失败: {}", self.config.catalog_path.display()))?;
        Ok(catalog)
    }

    fn session_factory(&self) -> AppResult<ChromiumSessionFactory> {
        let selectors = SelectorSet::from_optional_file(self.config.selectors_file.as_deref())?;
        Ok(ChromiumSessionFactory::new(
            selectors,
            self.config.chrome_executable.clone(),
        ))
    }
}
