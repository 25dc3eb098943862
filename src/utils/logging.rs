//! 日志工具模块
//!
//! 提供订阅器初始化、运行日志文件和横幅式输出的辅助函数

use crate::config::Config;
use crate::orchestrator::{RunSummary, WorkerReport};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 默认级别 info，`RUST_LOG` 优先；`verbose` 为 true 时本 crate 降到 debug
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "info,vr_review_harvester=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件（覆盖旧内容，写入表头）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n评论抓取运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入运行日志: {}", log_file_path.display()))?;
    Ok(())
}

/// 追加一段文本到运行日志
pub fn append_run_log(log_file_path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开运行日志: {}", log_file_path.display()))?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多工作者评论抓取模式");
    info!("📊 工作者数量: {}", config.resolved_worker_count());
    info!("📂 输出目录: {}", config.output_root.display());
    info!(
        "⚙️ 点击间隔 {}ms / 点击上限 {} / 低产出阈值 {}",
        config.settle_delay_ms, config.max_load_more_clicks, config.low_yield_threshold
    );
    info!("{}", "=".repeat(60));
}

/// 记录目录加载信息
pub fn log_catalog_loaded(total: usize, workers: usize) {
    info!("✓ 目录中共有 {} 个游戏", total);
    info!("📋 分成 {} 个分区并行处理", workers.min(total.max(1)));
    info!("💡 已处理过的游戏会直接跳过\n");
}

/// 记录工作者开始
pub fn log_worker_start(worker_id: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("👷 [worker {}] 开始处理分区，共 {} 个游戏", worker_id, total);
    info!("{}", "=".repeat(60));
}

/// 记录工作者完成
pub fn log_worker_complete(report: &WorkerReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ [worker {}] 完成: 成功 {} / 跳过 {} / 低产出 {} / 会话失败 {} / 失败 {}",
        report.worker_id,
        report.processed,
        report.skipped,
        report.low_yield,
        report.session_failed,
        report.failed
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.processed, summary.total);
    info!("⏭️ 已处理跳过: {}", summary.skipped);
    info!("📉 低产出: {}", summary.low_yield);
    info!("🔌 会话失败: {}", summary.session_failed);
    info!("❌ 失败: {}", summary.failed);
    for name in &summary.failed_items {
        info!("   - {}", name);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("节奏光剑很好玩", 4), "节奏光剑...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_run_log_header_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest_run.log");
        init_log_file(&path).unwrap();
        append_run_log(&path, "总数: 3\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.ends_with("总数: 3\n"));
    }
}
