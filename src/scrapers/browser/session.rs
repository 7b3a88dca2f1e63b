//! Chromium-backed browser session.

use super::{BrowserEngineConfig, BrowserError, PageDriver};

#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use super::{clickable_script, presence_script};
#[cfg(feature = "browser")]
use crate::scrapers::http_client::resolve_browser_user_agent;

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(e.to_string())
    }
}

/// A single browser with one page, owned by the listing walk.
///
/// Call [`BrowserSession::close`] on every exit path; dropping the session
/// without closing still kills a launched browser process, but skips the
/// graceful shutdown.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
    remote: bool,
}

#[cfg(feature = "browser")]
impl BrowserSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Launch a browser (or connect to `remote_url`) and open a blank page.
    pub async fn launch(config: &BrowserEngineConfig) -> Result<Self, BrowserError> {
        let remote = config.remote_url.is_some();
        let (browser, mut handler) = match config.remote_url {
            Some(ref url) => Self::connect_remote(url, config).await?,
            None => Self::launch_local(config).await?,
        };

        // Spawn handler task
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        let user_agent = resolve_browser_user_agent(config.user_agent.as_deref());
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await?;

        Ok(Self {
            browser,
            page,
            handler,
            remote,
        })
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<PathBuf, BrowserError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(BrowserError::ChromeNotFound)
    }

    async fn launch_local(
        config: &BrowserEngineConfig,
    ) -> Result<(Browser, chromiumoxide::Handler), BrowserError> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(config.timeout));

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }

    /// Connect to a remote Chrome instance via its DevTools endpoint.
    async fn connect_remote(
        url: &str,
        config: &BrowserEngineConfig,
    ) -> Result<(Browser, chromiumoxide::Handler), BrowserError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("remote browser unreachable: {e}")))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("bad version info: {e}")))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(config.timeout),
            ..Default::default()
        };

        Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }

    async fn eval_bool(&self, script: String) -> Result<bool, BrowserError> {
        self.page
            .evaluate(script)
            .await?
            .into_value::<bool>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    /// Close the page and shut the browser down.
    pub async fn close(mut self) {
        if let Err(e) = self.page.close().await {
            debug!("Failed to close page: {}", e);
        }

        // A remote browser outlives us; only our own process gets shut down.
        if !self.remote {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("Failed waiting for browser exit: {}", e);
            }
        }

        self.handler.abort();
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        info!("Navigating to {}", url);
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn page_height(&mut self) -> Result<i64, BrowserError> {
        let height = self
            .page
            .evaluate("document.body.scrollHeight")
            .await?
            .into_value::<f64>()
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(height as i64)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn is_present(&mut self, selector: &str) -> Result<bool, BrowserError> {
        self.eval_bool(presence_script(selector)).await
    }

    async fn is_clickable(&mut self, selector: &str) -> Result<bool, BrowserError> {
        self.eval_bool(clickable_script(selector)).await
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserSession {
    _private: (),
}

#[cfg(not(feature = "browser"))]
impl BrowserSession {
    pub async fn launch(_config: &BrowserEngineConfig) -> Result<Self, BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    pub async fn close(self) {}
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn page_height(&mut self) -> Result<i64, BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn is_present(&mut self, _selector: &str) -> Result<bool, BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn is_clickable(&mut self, _selector: &str) -> Result<bool, BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn click(&mut self, _selector: &str) -> Result<(), BrowserError> {
        Err(BrowserError::NotCompiled)
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Err(BrowserError::NotCompiled)
    }
}
