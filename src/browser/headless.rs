use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

static PROFILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// 一个已启动的无头浏览器及其事件循环
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub profile_dir: PathBuf,
}

/// 每个会话独立的用户数据目录，避免多个浏览器争抢同一个 profile
fn next_profile_dir() -> PathBuf {
    let n = PROFILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("vr-review-harvester-{}-{}", std::process::id(), n))
}

/// 启动一个隔离的无头浏览器
pub async fn launch_headless_browser(
    chrome_executable: Option<&Path>,
) -> Result<LaunchedBrowser, BrowserError> {
    info!("🚀 启动无头浏览器...");

    let profile_dir = next_profile_dir();
    debug!("用户数据目录: {}", profile_dir.display());

    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .user_data_dir(&profile_dir)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",              // 容器内运行时没有沙盒权限
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--remote-debugging-port=0", // 多个浏览器并存，让浏览器自动选择端口
        ]);
    if let Some(path) = chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|reason| {
        error!("配置无头浏览器失败: {}", reason);
        BrowserError::ConfigurationFailed { reason }
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|source| {
        error!("启动无头浏览器失败: {}", source);
        BrowserError::LaunchFailed { source }
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok(LaunchedBrowser {
        browser,
        handler,
        profile_dir,
    })
}
