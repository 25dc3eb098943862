use std::path::PathBuf;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 显式指定的工作者数量（为空时按 CPU 核数推导）
    pub worker_count: Option<usize>,
    /// 推导工作者数量时预留的核数
    pub reserved_cores: usize,
    /// 每次点击"加载更多"后的等待时间（毫秒）
    pub settle_delay_ms: u64,
    /// "加载更多"最大点击次数
    pub max_load_more_clicks: usize,
    /// 评论数小于等于该值时丢弃结果
    pub low_yield_threshold: usize,
    /// 页面加载超时（秒），超时后继续用已渲染的内容
    pub page_load_timeout_secs: u64,
    /// 产物根目录
    pub output_root: PathBuf,
    /// 目录 JSON 文件路径
    pub catalog_path: PathBuf,
    /// 自定义选择器 TOML 文件
    pub selectors_file: Option<PathBuf>,
    /// 浏览器可执行文件路径（为空时自动探测）
    pub chrome_executable: Option<PathBuf>,
    /// 每处理多少个游戏后冷却一次
    pub cooldown_interval: usize,
    /// 冷却时长（秒），0 表示不冷却
    pub cooldown_secs: u64,
    /// 评论数核对时使用的商店地址前缀
    pub verify_base_url: String,
    /// 核对监控模式的轮询间隔（秒）
    pub verify_interval_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: None,
            reserved_cores: 15,
            settle_delay_ms: 15_000,
            max_load_more_clicks: 2000,
            low_yield_threshold: 25,
            page_load_timeout_secs: 20,
            output_root: PathBuf::from("output"),
            catalog_path: PathBuf::from("VR_Games_Data.json"),
            selectors_file: None,
            chrome_executable: None,
            cooldown_interval: 10,
            cooldown_secs: 0,
            verify_base_url: "https://www.meta.com/experiences".to_string(),
            verify_interval_secs: 60,
            verbose_logging: false,
            output_log_file: "harvest_run.log".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            worker_count: std::env::var("WORKER_COUNT").ok().and_then(|v| v.parse().ok()).or(default.worker_count),
            reserved_cores: std::env::var("RESERVED_CORES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.reserved_cores),
            settle_delay_ms: std::env::var("SETTLE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_delay_ms),
            max_load_more_clicks: std::env::var("MAX_LOAD_MORE_CLICKS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_load_more_clicks),
            low_yield_threshold: std::env::var("LOW_YIELD_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.low_yield_threshold),
            page_load_timeout_secs: std::env::var("PAGE_LOAD_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_load_timeout_secs),
            output_root: std::env::var("OUTPUT_ROOT").map(PathBuf::from).unwrap_or(default.output_root),
            catalog_path: std::env::var("CATALOG_PATH").map(PathBuf::from).unwrap_or(default.catalog_path),
            selectors_file: std::env::var("SELECTORS_FILE").ok().map(PathBuf::from).or(default.selectors_file),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(default.chrome_executable),
            cooldown_interval: std::env::var("COOLDOWN_INTERVAL").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cooldown_interval),
            cooldown_secs: std::env::var("COOLDOWN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cooldown_secs),
            verify_base_url: std::env::var("VERIFY_BASE_URL").unwrap_or(default.verify_base_url),
            verify_interval_secs: std::env::var("VERIFY_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verify_interval_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 实际使用的工作者数量
    ///
    /// 显式配置优先；否则为 `可用核数 - 预留核数`，至少为 1
    pub fn resolved_worker_count(&self) -> usize {
        let derived = || {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            cores.saturating_sub(self.reserved_cores)
        };
        self.worker_count.unwrap_or_else(derived).max(1)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.output_root.join(&self.output_log_file)
    }
}
