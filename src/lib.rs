//! # VR Review Harvester
//!
//! 并行抓取 VR 游戏商店页面的用户评论，可中断、可续跑
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器、Page），只暴露能力
//! - `ItemDetailExtractor` / `SessionFactory` - 详情页提取能力接口
//! - `ChromiumSession` - 基于 chromiumoxide 的实现，选择器来自 `SelectorSet`
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services / Persistence）
//! - `services/extraction` - 评论字段的兜底链、属性配对
//! - `services/timestamp` - 时间归一化
//! - `services/skip_ledger` - 跳过/续跑账本
//! - `persistence/` - 加锁的读-改-写追加、每个游戏的评论文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个游戏"的完整处理流程
//! - `ItemCtx` - 上下文封装（worker + 分区索引 + 短名）
//! - `HarvestFlow` - 状态机（打开会话 → 加载 → 提取 → 展开 → 评论 → 持久化 → 关闭）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 加载目录、分区、并发、汇总
//! - `orchestrator/worker` - 按顺序处理一个分区
//! - `orchestrator/verifier` - 评论数核对
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ItemDetailExtractor, PageLoad, SessionFactory};
pub use models::{GameRecord, RawReview, ReviewRecord};
pub use orchestrator::{App, RunSummary};
pub use persistence::ArtifactLayout;
pub use workflow::{HarvestFlow, HarvestOutcome, ItemCtx};
