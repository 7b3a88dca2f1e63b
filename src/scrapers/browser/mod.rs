//! Browser automation for the JS-rendered listing page.
//!
//! The listing walker only ever talks to a [`PageDriver`]; the real
//! implementation is [`BrowserSession`], backed by chromiumoxide (CDP).

mod config;
mod session;

pub use config::BrowserEngineConfig;
pub use session::BrowserSession;

use async_trait::async_trait;

/// Errors from browser operations.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    )]
    ChromeNotFound,
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Browser command failed: {0}")]
    Cdp(String),
    #[error("Unexpected script result: {0}")]
    Script(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    NotCompiled,
}

/// Minimal set of page operations the listing walker needs.
///
/// Implementations own a single page; all calls are sequential.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url` and wait for the navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Current `document.body.scrollHeight`.
    async fn page_height(&mut self) -> Result<i64, BrowserError>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    /// Whether any element matches `selector`.
    async fn is_present(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Whether the first element matching `selector` is visible and enabled.
    async fn is_clickable(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Currently rendered markup.
    async fn content(&mut self) -> Result<String, BrowserError>;
}

/// Quote a CSS selector as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Script returning whether `selector` matches anything.
pub(crate) fn presence_script(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(selector))
}

/// Script returning whether the first match of `selector` can be clicked.
pub(crate) fn clickable_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({});
            if (!el) return false;
            if (el.disabled || el.getAttribute('aria-disabled') === 'true') return false;
            const style = window.getComputedStyle(el);
            if (style.visibility === 'hidden' || style.display === 'none' || style.pointerEvents === 'none') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        }})()"#,
        js_string(selector)
    )
}
