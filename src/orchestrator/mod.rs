//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整批调度和统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量抓取处理器
//! - 管理应用生命周期（初始化、运行、汇总）
//! - 加载目录（Vec<GameRecord>）
//! - 分区并为每个分区启动一个工作者任务
//! - 输出全局统计信息，写入运行日志
//!
//! ### `partition` - 工作分区
//! - 连续、保序，各分区大小最多相差 1
//!
//! ### `worker` - 单个工作者
//! - 按顺序遍历分区
//! - 查跳过账本、委托 HarvestFlow、截住单个游戏的 panic
//! - 冷却
//!
//! ### `verifier` - 评论数核对
//! - 对比评论文件行数与商店页面上的数字
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GameRecord>)
//!     ↓
//! worker (处理一个分区)
//!     ↓
//! workflow::HarvestFlow (处理单个游戏)
//!     ↓
//! services / persistence (提取、账本、加锁写入)
//!     ↓
//! infrastructure (会话能力：ItemDetailExtractor)
//! ```

pub mod batch_processor;
pub mod partition;
pub mod verifier;
pub mod worker;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
pub use partition::partition;
pub use verifier::{parse_review_summary, ScanStats, Verifier};
pub use worker::{Worker, WorkerReport};
