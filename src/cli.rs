//! 命令行参数
//!
//! 环境变量先填好 `Config`，命令行里给出的参数再覆盖

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "VR 游戏商店评论并行抓取")]
pub struct Cli {
    /// 产物根目录
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// 自定义选择器 TOML 文件
    #[arg(long, global = true)]
    pub selectors: Option<PathBuf>,

    /// 浏览器可执行文件
    #[arg(long, global = true)]
    pub chrome: Option<PathBuf>,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 抓取目录中所有游戏的评论
    Harvest {
        /// 目录 JSON 文件
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// 工作者数量（默认按 CPU 核数推导）
        #[arg(long)]
        workers: Option<usize>,

        /// 每次点击"加载更多"后的等待（毫秒）
        #[arg(long)]
        settle_delay_ms: Option<u64>,

        /// 低产出阈值
        #[arg(long)]
        low_yield_threshold: Option<usize>,
    },
    /// 核对评论文件行数与商店页面上的评论数
    Verify {
        /// 持续监控新文件
        #[arg(long)]
        watch: bool,

        /// 商店地址前缀
        #[arg(long)]
        base_url: Option<String>,
    },
}

impl Cli {
    /// 用命令行参数覆盖配置
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if let Some(selectors) = &self.selectors {
            config.selectors_file = Some(selectors.clone());
        }
        if let Some(chrome) = &self.chrome {
            config.chrome_executable = Some(chrome.clone());
        }
        if self.verbose {
            config.verbose_logging = true;
        }

        match &self.command {
            Command::Harvest {
                catalog,
                workers,
                settle_delay_ms,
                low_yield_threshold,
            } => {
                if let Some(catalog) = catalog {
                    config.catalog_path = catalog.clone();
                }
                if workers.is_some() {
                    config.worker_count = *workers;
                }
                if let Some(ms) = settle_delay_ms {
                    config.settle_delay_ms = *ms;
                }
                if let Some(threshold) = low_yield_threshold {
                    config.low_yield_threshold = *threshold;
                }
            }
            Command::Verify { base_url, .. } => {
                if let Some(url) = base_url {
                    config.verify_base_url = url.clone();
                }
            }
        }
    }
}
