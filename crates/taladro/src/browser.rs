//! Real browser control via the Chrome DevTools Protocol.
//!
//! Enabled by the `browser` cargo feature. Element queries are executed as
//! JavaScript expressions generated from [`Selector`], so the live DOM is
//! re-queried on every operation; nothing is held on the Rust side beyond
//! the page connection. Existence checks poll per [`WaitOptions`]; click
//! primitives evaluate exactly once.

use crate::driver::{ElementHandle, ElementLocatorService};
use crate::locator::Selector;
use crate::result::{TaladroError, TaladroResult};
use crate::wait::{poll_until, WaitOptions};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Chromium command-line flags derived from the config
fn launch_args(config: &BrowserConfig) -> Vec<String> {
    config
        .user_agent
        .iter()
        .map(|ua| format!("--user-agent={ua}"))
        .collect()
}

/// Browser instance with a live CDP connection
#[derive(Debug)]
pub struct Browser {
    config: BrowserConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a new browser instance
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    pub async fn launch(config: BrowserConfig) -> TaladroResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .args(launch_args(&config));

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| TaladroError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| TaladroError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        // Drive CDP messages until the connection drops
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a new page
    ///
    /// # Errors
    ///
    /// Returns error if the page cannot be created
    pub async fn new_page(&self) -> TaladroResult<Page> {
        let browser = self.inner.lock().await;
        let cdp_page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| TaladroError::Page {
                message: e.to_string(),
            })?;

        Ok(Page {
            url: String::from("about:blank"),
            inner: Arc::new(Mutex::new(cdp_page)),
        })
    }

    /// Get the browser configuration
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Close the browser
    ///
    /// # Errors
    ///
    /// Returns error if the browser fails to shut down
    pub async fn close(self) -> TaladroResult<()> {
        let mut browser = self.inner.lock().await;
        browser
            .close()
            .await
            .map_err(|e| TaladroError::BrowserLaunch {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// A browser page holding the UI under test
#[derive(Debug)]
pub struct Page {
    url: String,
    inner: Arc<Mutex<CdpPage>>,
}

impl Page {
    /// Navigate to a URL
    ///
    /// # Errors
    ///
    /// Returns error if navigation fails
    pub async fn goto(&mut self, url: &str) -> TaladroResult<()> {
        let page = self.inner.lock().await;
        page.goto(url)
            .await
            .map_err(|e| TaladroError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.url = url.to_string();
        Ok(())
    }

    /// Last URL navigated to
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.url
    }

    /// Build a locator service over this page
    #[must_use]
    pub fn locator_service(&self, wait: WaitOptions) -> CdpLocatorService {
        CdpLocatorService {
            page: Arc::clone(&self.inner),
            wait,
        }
    }
}

/// Element descriptor as reported by the in-page JavaScript
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDescriptor {
    tag_name: String,
    test_subj: Option<String>,
    text: Option<String>,
    href: Option<String>,
    enabled: bool,
}

/// JS object literal describing the element bound to `el`
const DESCRIBE_JS: &str = "({ tagName: el.tagName.toLowerCase(), \
     testSubj: el.getAttribute('data-test-subj'), \
     text: (el.innerText || '').trim(), \
     href: el.getAttribute('href'), \
     enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true' })";

fn first_match_expr(css: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({css:?}); \
         if (!el) return null; return {DESCRIBE_JS}; }})()"
    )
}

fn all_matches_expr(css: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({css:?})).map((el) => {DESCRIBE_JS})"
    )
}

fn handle_expr(handle: &ElementHandle) -> String {
    format!(
        "document.querySelectorAll({:?})[{}]",
        handle.id, handle.index
    )
}

/// Attribute reads are wrapped in an object so a vanished element (null)
/// stays distinguishable from a present element without the attribute
/// (object with null value).
#[derive(Debug, Deserialize)]
struct RawAttribute {
    value: Option<String>,
}

fn attribute_expr(target: &str, name: &str) -> String {
    format!(
        "(() => {{ const el = {target}; if (!el) return null; \
         return {{ value: el.getAttribute({name:?}) }}; }})()"
    )
}

fn click_expr(target: &str) -> String {
    format!(
        "(() => {{ const el = {target}; if (!el) return 'missing'; \
         if (el.disabled || el.getAttribute('aria-disabled') === 'true') return 'disabled'; \
         el.click(); return 'clicked'; }})()"
    )
}

fn raw_to_handle(id: String, index: usize, raw: RawDescriptor) -> ElementHandle {
    ElementHandle {
        id,
        index,
        tag_name: raw.tag_name,
        test_subj: raw.test_subj,
        text: raw.text,
        href: raw.href,
        enabled: raw.enabled,
    }
}

/// Locator service backed by a live CDP page
#[derive(Debug, Clone)]
pub struct CdpLocatorService {
    page: Arc<Mutex<CdpPage>>,
    wait: WaitOptions,
}

impl CdpLocatorService {
    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> TaladroResult<T> {
        let page = self.page.lock().await;
        let result = page.evaluate(expr).await.map_err(|e| TaladroError::Page {
            message: e.to_string(),
        })?;
        result.into_value().map_err(|e| TaladroError::Page {
            message: e.to_string(),
        })
    }

    async fn click_outcome(&self, expr: &str, selector: &str) -> TaladroResult<()> {
        let outcome: String = self.eval(expr).await?;
        match outcome.as_str() {
            "clicked" => Ok(()),
            "disabled" => Err(TaladroError::ElementDisabled {
                selector: selector.to_string(),
            }),
            _ => Err(TaladroError::NotFound {
                selector: selector.to_string(),
            }),
        }
    }
}

#[async_trait]
impl ElementLocatorService for CdpLocatorService {
    async fn exists(&self, selector: &Selector) -> TaladroResult<bool> {
        let count: u64 = self.eval(&selector.to_count_query()).await?;
        Ok(count > 0)
    }

    async fn exists_or_fail(&self, selector: &Selector) -> TaladroResult<()> {
        match poll_until(self.wait, || self.exists(selector)).await {
            Err(TaladroError::Timeout { .. }) => Err(TaladroError::NotFound {
                selector: selector.to_css(),
            }),
            other => other,
        }
    }

    async fn missing_or_fail(&self, selector: &Selector) -> TaladroResult<()> {
        let absent = || async {
            let present = self.exists(selector).await?;
            Ok::<bool, TaladroError>(!present)
        };
        match poll_until(self.wait, absent).await {
            Err(TaladroError::Timeout { .. }) => Err(TaladroError::StillPresent {
                selector: selector.to_css(),
            }),
            other => other,
        }
    }

    async fn find(&self, selector: &Selector) -> TaladroResult<ElementHandle> {
        let css = selector.to_css();
        let raw: Option<RawDescriptor> = self.eval(&first_match_expr(&css)).await?;
        raw.map(|raw| raw_to_handle(css.clone(), 0, raw))
            .ok_or(TaladroError::NotFound { selector: css })
    }

    async fn find_all_within(
        &self,
        scope: &Selector,
        filter: &Selector,
    ) -> TaladroResult<Vec<ElementHandle>> {
        self.exists_or_fail(scope).await?;
        let css = format!("{} {}", scope.to_css(), filter.to_css());
        let raws: Vec<RawDescriptor> = self.eval(&all_matches_expr(&css)).await?;
        Ok(raws
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw_to_handle(css.clone(), index, raw))
            .collect())
    }

    async fn click(&self, handle: &ElementHandle) -> TaladroResult<()> {
        self.click_outcome(&click_expr(&handle_expr(handle)), &handle.describe())
            .await
    }

    async fn click_when_enabled_no_retry(&self, selector: &Selector) -> TaladroResult<()> {
        let css = selector.to_css();
        let target = format!("document.querySelector({css:?})");
        self.click_outcome(&click_expr(&target), &css).await
    }

    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> TaladroResult<Option<String>> {
        let expr = attribute_expr(&handle_expr(handle), name);
        let payload: Option<RawAttribute> = self.eval(&expr).await?;
        payload
            .map(|raw| raw.value)
            .ok_or_else(|| TaladroError::NotFound {
                selector: handle.describe(),
            })
    }

    async fn visible_text(&self, handle: &ElementHandle) -> TaladroResult<String> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return null; \
             return (el.innerText || '').trim(); }})()",
            handle_expr(handle)
        );
        let text: Option<String> = self.eval(&expr).await?;
        text.ok_or_else(|| TaladroError::NotFound {
            selector: handle.describe(),
        })
    }

    async fn open_href(&self, handle: &ElementHandle) -> TaladroResult<()> {
        let expr = format!(
            "(() => {{ const el = {}; if (!el) return 'missing'; \
             const href = el.getAttribute('href'); if (!href) return 'nohref'; \
             window.location.assign(href); return 'opened'; }})()",
            handle_expr(handle)
        );
        let outcome: String = self.eval(&expr).await?;
        match outcome.as_str() {
            "opened" => Ok(()),
            "nohref" => Err(TaladroError::Page {
                message: format!("element {} has no href", handle.describe()),
            }),
            _ => Err(TaladroError::NotFound {
                selector: handle.describe(),
            }),
        }
    }
}
