//! Browser capability boundary
//!
//! The automation library is a black-box capability provider behind these
//! traits: launch a browser, enumerate targets, drive a page. The session
//! pipeline in [`crate::session`] only talks to this boundary, so it can
//! run against an in-memory fake in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A running browser process that can hand out page handles.
#[async_trait]
pub trait BrowserControl: Send + Sync {
    /// Wait up to `timeout` for a page-type target whose URL contains
    /// `host` (substring match, deliberately tolerant) and return its
    /// handle. `Ok(None)` means no match appeared in time; the caller
    /// falls back.
    async fn wait_for_page(
        &self,
        host: &str,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn PageControl>>>;

    /// First page target the browser currently knows about, if any.
    async fn first_page(&self) -> Result<Option<Arc<dyn PageControl>>>;

    /// Create a fresh blank page.
    async fn new_page(&self) -> Result<Arc<dyn PageControl>>;
}

/// A single browser-controlled page.
#[async_trait]
pub trait PageControl: Send + Sync {
    /// Current URL of the page.
    fn url(&self) -> String;

    /// Register a script that runs before any other script on every new
    /// document in this page context.
    async fn register_preload_script(&self, source: &str) -> Result<()>;

    /// Override the reported user agent and `Accept-Language`.
    async fn set_user_agent(&self, user_agent: &str, accept_language: &str) -> Result<()>;

    /// Fix the viewport to the given dimensions.
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// Attach side-effect-only observers for page events.
    async fn observe(&self, observer: Arc<dyn PageObserver>) -> Result<()>;

    /// Navigate to `url`, waiting only for DOM-content-loaded (not full
    /// load), bounded by `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Evaluate a script in the page, discarding its result.
    async fn evaluate(&self, script: &str) -> Result<()>;
}

/// Observational page event callbacks. Side effects only (logging, counter
/// increments); the pipeline never consumes their return values.
pub trait PageObserver: Send + Sync {
    /// The main frame finished a navigation.
    fn main_frame_navigated(&self, url: &str);

    /// In-page console output.
    fn console_message(&self, text: &str);

    /// Uncaught in-page script error.
    fn page_error(&self, text: &str);

    /// A sub-resource request failed to load.
    fn request_failed(&self, detail: &str);
}
