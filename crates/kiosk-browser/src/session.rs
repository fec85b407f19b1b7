//! Browser session pipeline
//!
//! One suspended-execution sequence per process:
//! launch → await target → acquire → prepare → navigate → settle → ready.
//! Any failure is fatal and bubbles to the binary, which records it in the
//! health state and exits; restarts are the supervisor's job.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::{Config, SessionHealth};
use tracing::{debug, info, warn};

use crate::control::{BrowserControl, PageControl, PageObserver};
use crate::error::{Result, SessionError};
use crate::stealth::STEALTH_PATCH;
use crate::target::target_host;

/// Accept-Language sent alongside the user-agent override.
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// One scroll-down/scroll-up pair to trigger scroll-activated lazy loading.
const SCROLL_NUDGE: &str = "window.scrollTo(0, 1); window.scrollTo(0, 0);";

/// Fixed delays and timeouts of the pipeline. Only `target_timeout` and
/// `navigation_timeout` can fail; the rest are plain waits.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Grace period for Chromium to register its initial targets.
    pub launch_grace: Duration,
    /// Bound on waiting for a target matching the resolved host.
    pub target_timeout: Duration,
    /// Bound on the explicit navigation reaching DOM-content-loaded.
    pub navigation_timeout: Duration,
    /// First settle wait, letting asynchronous content render.
    pub settle: Duration,
    /// Second settle wait after the scroll nudge.
    pub post_scroll: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            launch_grace: Duration::from_millis(1500),
            target_timeout: Duration::from_secs(15),
            navigation_timeout: Duration::from_secs(120),
            settle: Duration::from_secs(12),
            post_scroll: Duration::from_secs(8),
        }
    }
}

/// Run the session pipeline on an already-launched browser through to
/// readiness. Readiness is time-based: after the settle waits elapse the
/// session is marked ready with no further content checks.
pub async fn run(
    browser: &dyn BrowserControl,
    config: &Config,
    health: &SessionHealth,
    timings: &Timings,
) -> Result<()> {
    tokio::time::sleep(timings.launch_grace).await;

    let page = acquire_page(browser, &config.target_url, timings).await?;
    info!("acquired page: {}", page.url());

    // the patch must be registered before the explicit navigation, or the
    // first document loads unpatched
    page.register_preload_script(STEALTH_PATCH).await?;
    page.set_user_agent(&config.user_agent, ACCEPT_LANGUAGE).await?;
    page.set_viewport(config.viewport_width, config.viewport_height)
        .await?;
    page.observe(Arc::new(HealthObserver {
        health: health.clone(),
    }))
    .await?;

    // force a clean, observed navigation even if the app window already
    // shows the target
    page.navigate(&config.target_url, timings.navigation_timeout)
        .await?;

    tokio::time::sleep(timings.settle).await;
    page.evaluate(SCROLL_NUDGE).await?;
    tokio::time::sleep(timings.post_scroll).await;

    health.mark_ready();
    info!("session ready: {}", config.target_url);
    Ok(())
}

async fn acquire_page(
    browser: &dyn BrowserControl,
    target_url: &str,
    timings: &Timings,
) -> Result<Arc<dyn PageControl>> {
    let host = target_host(target_url);

    if !host.is_empty() {
        match browser.wait_for_page(&host, timings.target_timeout).await {
            Ok(Some(page)) => return Ok(page),
            Ok(None) => debug!("no target matching host '{host}', falling back"),
            Err(e) => warn!("target wait failed ({e}), falling back"),
        }
    }

    if let Some(page) = browser
        .first_page()
        .await
        .map_err(|e| SessionError::TargetAcquisition(format!("listing pages: {e}")))?
    {
        return Ok(page);
    }

    browser.new_page().await.map_err(|e| {
        SessionError::TargetAcquisition(format!("no page target and creating one failed: {e}"))
    })
}

/// Routes page events into health updates and diagnostics. Observational
/// only; nothing here can fail the pipeline.
struct HealthObserver {
    health: SessionHealth,
}

impl PageObserver for HealthObserver {
    fn main_frame_navigated(&self, url: &str) {
        let count = self.health.record_navigation();
        info!("NAV {count}: {url}");
    }

    fn console_message(&self, text: &str) {
        debug!("page console: {text}");
    }

    fn page_error(&self, text: &str) {
        warn!("page error: {text}");
    }

    fn request_failed(&self, detail: &str) {
        warn!("request failed: {detail}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn immediate() -> Timings {
        Timings {
            launch_grace: Duration::ZERO,
            target_timeout: Duration::ZERO,
            navigation_timeout: Duration::from_secs(1),
            settle: Duration::ZERO,
            post_scroll: Duration::ZERO,
        }
    }

    fn test_config(target_url: &str) -> Config {
        Config {
            target_url: target_url.to_string(),
            ..Config::default()
        }
    }

    #[derive(Default)]
    struct FakePage {
        url: String,
        ops: Arc<Mutex<Vec<String>>>,
        observer: Mutex<Option<Arc<dyn PageObserver>>>,
        navigations_per_goto: u64,
        fail_navigation: bool,
    }

    impl FakePage {
        fn new(url: &str, ops: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                url: url.to_string(),
                ops,
                observer: Mutex::new(None),
                navigations_per_goto: 1,
                fail_navigation: false,
            })
        }

        fn push(&self, op: &str) {
            self.ops.lock().unwrap().push(op.to_string());
        }
    }

    #[async_trait]
    impl PageControl for FakePage {
        fn url(&self) -> String {
            self.url.clone()
        }

        async fn register_preload_script(&self, _source: &str) -> Result<()> {
            self.push("preload");
            Ok(())
        }

        async fn set_user_agent(&self, _ua: &str, _lang: &str) -> Result<()> {
            self.push("user_agent");
            Ok(())
        }

        async fn set_viewport(&self, _w: u32, _h: u32) -> Result<()> {
            self.push("viewport");
            Ok(())
        }

        async fn observe(&self, observer: Arc<dyn PageObserver>) -> Result<()> {
            self.push("observe");
            *self.observer.lock().unwrap() = Some(observer);
            Ok(())
        }

        async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
            self.push("navigate");
            if self.fail_navigation {
                return Err(SessionError::Navigation(format!("{url}: net::ERR_FAILED")));
            }
            if let Some(observer) = self.observer.lock().unwrap().as_ref() {
                for _ in 0..self.navigations_per_goto {
                    observer.main_frame_navigated(url);
                }
            }
            Ok(())
        }

        async fn evaluate(&self, _script: &str) -> Result<()> {
            self.push("evaluate");
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBrowser {
        matched: Option<Arc<FakePage>>,
        first: Option<Arc<FakePage>>,
        created: Option<Arc<FakePage>>,
        ops: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBrowser {
        fn push(&self, op: &str) {
            self.ops.lock().unwrap().push(op.to_string());
        }
    }

    #[async_trait]
    impl BrowserControl for FakeBrowser {
        async fn wait_for_page(
            &self,
            host: &str,
            _timeout: Duration,
        ) -> Result<Option<Arc<dyn PageControl>>> {
            self.push(&format!("wait_for_page:{host}"));
            Ok(self
                .matched
                .clone()
                .filter(|p| p.url.contains(host))
                .map(|p| p as Arc<dyn PageControl>))
        }

        async fn first_page(&self) -> Result<Option<Arc<dyn PageControl>>> {
            self.push("first_page");
            Ok(self.first.clone().map(|p| p as Arc<dyn PageControl>))
        }

        async fn new_page(&self) -> Result<Arc<dyn PageControl>> {
            self.push("new_page");
            self.created
                .clone()
                .map(|p| p as Arc<dyn PageControl>)
                .ok_or_else(|| SessionError::Control("browser has no renderer".to_string()))
        }
    }

    #[tokio::test]
    async fn matching_target_reaches_ready_with_one_navigation() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = FakePage::new("https://v2.weatherscan.net/?90210", ops.clone());
        let browser = FakeBrowser {
            matched: Some(page),
            ops: ops.clone(),
            ..Default::default()
        };
        let health = SessionHealth::new();

        run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &health,
            &immediate(),
        )
        .await
        .unwrap();

        let snap = health.snapshot();
        assert!(snap.ready);
        assert_eq!(snap.nav_count, 1);
        assert_eq!(snap.last_error, None);
    }

    #[tokio::test]
    async fn stealth_patch_is_registered_before_navigation() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = FakePage::new("https://v2.weatherscan.net/?90210", ops.clone());
        let browser = FakeBrowser {
            matched: Some(page),
            ops: ops.clone(),
            ..Default::default()
        };

        run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &SessionHealth::new(),
            &immediate(),
        )
        .await
        .unwrap();

        let recorded = ops.lock().unwrap().clone();
        let preload = recorded.iter().position(|op| op == "preload").unwrap();
        let observe = recorded.iter().position(|op| op == "observe").unwrap();
        let navigate = recorded.iter().position(|op| op == "navigate").unwrap();
        assert!(preload < navigate, "first document would load unpatched");
        assert!(observe < navigate, "navigation event would go unobserved");
        // the settle scroll happens after the navigation
        let evaluate = recorded.iter().position(|op| op == "evaluate").unwrap();
        assert!(navigate < evaluate);
    }

    #[tokio::test]
    async fn unparsable_url_skips_matching_and_uses_first_page() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = FakePage::new("chrome://newtab", ops.clone());
        let browser = FakeBrowser {
            first: Some(page),
            ops: ops.clone(),
            ..Default::default()
        };
        let health = SessionHealth::new();

        run(&browser, &test_config(""), &health, &immediate())
            .await
            .unwrap();

        let recorded = ops.lock().unwrap().clone();
        assert!(!recorded.iter().any(|op| op.starts_with("wait_for_page")));
        assert!(recorded.contains(&"first_page".to_string()));
        assert!(health.snapshot().ready);
    }

    #[tokio::test]
    async fn no_match_falls_back_to_first_page() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = FakePage::new("about:blank", ops.clone());
        let browser = FakeBrowser {
            first: Some(page),
            ops: ops.clone(),
            ..Default::default()
        };

        run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &SessionHealth::new(),
            &immediate(),
        )
        .await
        .unwrap();

        let recorded = ops.lock().unwrap().clone();
        assert!(recorded
            .contains(&"wait_for_page:v2.weatherscan.net".to_string()));
        assert!(recorded.contains(&"first_page".to_string()));
    }

    #[tokio::test]
    async fn creates_blank_page_when_browser_has_none() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = FakePage::new("about:blank", ops.clone());
        let browser = FakeBrowser {
            created: Some(page),
            ops: ops.clone(),
            ..Default::default()
        };
        let health = SessionHealth::new();

        run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &health,
            &immediate(),
        )
        .await
        .unwrap();

        assert!(ops.lock().unwrap().contains(&"new_page".to_string()));
        assert!(health.snapshot().ready);
    }

    #[tokio::test]
    async fn no_obtainable_page_is_fatal() {
        let browser = FakeBrowser::default();
        let health = SessionHealth::new();

        let err = run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &health,
            &immediate(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::TargetAcquisition(_)));
        assert!(!err.to_string().is_empty());
        assert!(!health.snapshot().ready);
    }

    #[tokio::test]
    async fn navigation_failure_propagates_and_ready_stays_false() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        let page = Arc::new(FakePage {
            url: "https://v2.weatherscan.net/?90210".to_string(),
            ops: ops.clone(),
            observer: Mutex::new(None),
            navigations_per_goto: 1,
            fail_navigation: true,
        });
        let browser = FakeBrowser {
            matched: Some(page),
            ops,
            ..Default::default()
        };
        let health = SessionHealth::new();

        let err = run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &health,
            &immediate(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::Navigation(_)));
        assert!(!health.snapshot().ready);
    }

    #[tokio::test]
    async fn every_main_frame_navigation_is_counted() {
        let ops = Arc::new(Mutex::new(Vec::new()));
        // an in-page redirect chain: one goto, three main-frame navigations
        let page = Arc::new(FakePage {
            url: "https://v2.weatherscan.net/?90210".to_string(),
            ops: ops.clone(),
            observer: Mutex::new(None),
            navigations_per_goto: 3,
            fail_navigation: false,
        });
        let browser = FakeBrowser {
            matched: Some(page),
            ops,
            ..Default::default()
        };
        let health = SessionHealth::new();

        run(
            &browser,
            &test_config("https://v2.weatherscan.net/?90210"),
            &health,
            &immediate(),
        )
        .await
        .unwrap();

        assert_eq!(health.snapshot().nav_count, 3);
    }
}
