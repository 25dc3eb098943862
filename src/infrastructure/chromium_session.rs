//! 基于 chromiumoxide 的会话实现
//!
//! 所有 DOM 查找都用一段 JS 完成，选择器从 `SelectorSet` 以 JSON 字面量注入

use crate::browser::{launch_headless_browser, SelectorSet};
use crate::error::BrowserError;
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::session::{ItemDetailExtractor, PageLoad, SessionFactory};
use crate::models::RawReview;
use anyhow::Result;
use chromiumoxide::error::CdpError;
use chromiumoxide::Browser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 每次 `open` 都启动一个新的无头浏览器
#[derive(Debug, Clone)]
pub struct ChromiumSessionFactory {
    selectors: Arc<SelectorSet>,
    chrome_executable: Option<PathBuf>,
}

impl ChromiumSessionFactory {
    pub fn new(selectors: SelectorSet, chrome_executable: Option<PathBuf>) -> Self {
        Self {
            selectors: Arc::new(selectors),
            chrome_executable,
        }
    }
}

impl SessionFactory for ChromiumSessionFactory {
    type Session = ChromiumSession;

    async fn open(&self) -> Result<ChromiumSession> {
        let launched = launch_headless_browser(self.chrome_executable.as_deref()).await?;

        let page = match launched.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(source) => {
                // 页面没建起来，浏览器也要关掉
                let mut browser = launched.browser;
                let _ = browser.close().await;
                let _ = browser.wait().await;
                launched.handler.abort();
                let _ = tokio::fs::remove_dir_all(&launched.profile_dir).await;
                return Err(BrowserError::PageCreationFailed { source }.into());
            }
        };

        Ok(ChromiumSession {
            browser: launched.browser,
            executor: JsExecutor::new(page),
            handler: launched.handler,
            profile_dir: launched.profile_dir,
            selectors: self.selectors.clone(),
        })
    }
}

/// 一个浏览器 + 一个页面
pub struct ChromiumSession {
    browser: Browser,
    executor: JsExecutor,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    selectors: Arc<SelectorSet>,
}

/// 等待页面渲染时的轮询间隔
const RENDER_POLL_INTERVAL: Duration = Duration::from_millis(500);

fn js_literal(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// 读取第一个匹配元素的 innerText
async fn inner_text(executor: &JsExecutor, selector: &str) -> Result<Option<String>> {
    let js_code = format!(
        r#"
        (() => {{
            const el = document.querySelector({});
            return el ? el.innerText : null;
        }})()
        "#,
        js_literal(selector)?
    );
    Ok(executor.eval_as(js_code).await?)
}

/// 点击第一个文本满足条件的元素
async fn click_by_text(
    executor: &JsExecutor,
    selector: &str,
    text: &str,
    exact: bool,
) -> Result<bool> {
    let js_code = format!(
        r#"
        (() => {{
            const wanted = {text};
            const exact = {exact};
            const target = Array.from(document.querySelectorAll({selector})).find(el => {{
                const t = (el.innerText || el.textContent || '').trim();
                return exact ? t === wanted : t.includes(wanted);
            }});
            if (!target) return false;
            target.scrollIntoView({{ block: 'center' }});
            target.click();
            return true;
        }})()
        "#,
        text = js_literal(text)?,
        exact = exact,
        selector = js_literal(selector)?
    );
    Ok(executor.eval_as(js_code).await?)
}

/// goto 的结果归类，chromiumoxide 自己的请求超时也算超时
fn classify_goto<T>(result: Result<T, CdpError>) -> Result<PageLoad, CdpError> {
    match result {
        Ok(_) => Ok(PageLoad::Loaded),
        Err(CdpError::Timeout) => Ok(PageLoad::TimedOut),
        Err(source) => Err(source),
    }
}

/// 反复探测直到页面内容出现或到达截止时间
///
/// 探测出错按"还没渲染"处理，页面脚本执行上下文在加载中可能还不存在
async fn wait_until_rendered<P, Fut>(
    mut probe: P,
    deadline: Instant,
    interval: Duration,
) -> PageLoad
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    loop {
        match probe().await {
            Ok(true) => return PageLoad::Loaded,
            Ok(false) => {}
            Err(e) => debug!("渲染探测失败: {:#}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return PageLoad::TimedOut;
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

impl ItemDetailExtractor for ChromiumSession {
    /// 导航并等待详情面板或评论容器出现，两段共用同一个超时预算
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<PageLoad> {
        debug!("导航到: {}", url);
        let deadline = Instant::now() + timeout;

        let load = match tokio::time::timeout(timeout, self.executor.page().goto(url)).await {
            Ok(result) => {
                classify_goto(result).map_err(|source| BrowserError::NavigationFailed {
                    url: url.to_string(),
                    source,
                })?
            }
            Err(_) => PageLoad::TimedOut,
        };
        if load == PageLoad::TimedOut {
            warn!("页面加载超过 {:?}，使用已渲染内容继续: {}", timeout, url);
            return Ok(PageLoad::TimedOut);
        }

        // 商店页面在 load 事件之后才由脚本渲染内容
        let probe_js = format!(
            "!!(document.querySelector({}) || document.querySelector({}))",
            js_literal(&self.selectors.review_container)?,
            js_literal(&self.selectors.details_panel)?
        );
        let executor = &self.executor;
        let rendered = wait_until_rendered(
            || {
                let js = probe_js.clone();
                async move { executor.eval_as::<bool>(js).await.map_err(anyhow::Error::from) }
            },
            deadline,
            RENDER_POLL_INTERVAL,
        )
        .await;

        if rendered == PageLoad::TimedOut {
            warn!("等待页面内容渲染超过 {:?}，使用已渲染内容继续: {}", timeout, url);
        }
        Ok(rendered)
    }

    async fn details_text(&mut self) -> Result<Option<String>> {
        inner_text(&self.executor, &self.selectors.details_panel).await
    }

    async fn expand_description(&mut self) -> Result<bool> {
        click_by_text(
            &self.executor,
            &self.selectors.description_more_control,
            &self.selectors.description_more_text,
            false,
        )
        .await
    }

    async fn description_text(&mut self) -> Result<Option<String>> {
        inner_text(&self.executor, &self.selectors.description_block).await
    }

    async fn click_load_more(&mut self) -> Result<bool> {
        click_by_text(
            &self.executor,
            &self.selectors.load_more_control,
            &self.selectors.load_more_text,
            true,
        )
        .await
    }

    async fn review_containers(&mut self) -> Result<Vec<RawReview>> {
        let js_code = format!(
            r#"
            (() => {{
                const s = {};
                const textOf = (root, sel) => {{
                    const el = sel ? root.querySelector(sel) : null;
                    return el ? el.innerText : null;
                }};
                return Array.from(document.querySelectorAll(s.review_container)).map(c => {{
                    const starBox = c.querySelector(s.star_container);
                    return {{
                        text: c.innerText || '',
                        title: textOf(c, s.review_title),
                        stars: starBox ? starBox.querySelectorAll(s.filled_star).length : null,
                        timestamp: textOf(c, s.review_timestamp),
                        content: textOf(c, s.review_content),
                        author: textOf(c, s.review_author),
                        helpful: textOf(c, s.review_helpful),
                    }};
                }});
            }})()
            "#,
            serde_json::to_string(&*self.selectors)?
        );
        Ok(self.executor.eval_as(js_code).await?)
    }

    async fn review_summary_text(&mut self) -> Result<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = Array.from(document.querySelectorAll({})).find(e => {{
                    const t = e.innerText || '';
                    return t.includes('ratings') && t.includes('reviews');
                }});
                return el ? el.innerText : null;
            }})()
            "#,
            js_literal(&self.selectors.review_summary)?
        );
        Ok(self.executor.eval_as(js_code).await?)
    }

    async fn close(self) -> Result<()> {
        let ChromiumSession {
            mut browser,
            executor,
            handler,
            profile_dir,
            ..
        } = self;
        drop(executor);

        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            debug!("清理用户数据目录失败 {}: {}", profile_dir.display(), e);
        }

        closed
            .map(|_| ())
            .map_err(|source| BrowserError::CloseFailed { source }.into())
    }
}
