//! headless_chrome implementation of the capability boundary
//!
//! The underlying crate is synchronous; every call that talks to the
//! browser is bridged onto the blocking thread pool so the async pipeline
//! never stalls the runtime.

use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use kiosk_core::Config;
use tracing::{debug, info};

use crate::control::{BrowserControl, PageControl, PageObserver};
use crate::error::{Result, SessionError};

/// How often target enumeration re-checks for a matching page.
const TARGET_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How often a pending navigation re-checks for DOM-content-loaded.
const NAVIGATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The display runs unattended for days; never let the CDP connection
/// idle out underneath the session.
const IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SessionError::Control(format!("browser task failed: {e}")))?
}

/// A kiosk-configured Chromium process.
pub struct ChromeKiosk {
    browser: Arc<Browser>,
}

impl ChromeKiosk {
    /// Launch Chromium with the kiosk flag set: fixed window, app mode
    /// (no URL chrome), persistent profile, sandbox off for the locked-down
    /// display session.
    pub async fn launch(config: &Config) -> Result<Self> {
        let config = config.clone();
        let browser = blocking(move || {
            let args = kiosk_args(&config);
            let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

            let options = LaunchOptionsBuilder::default()
                .headless(false)
                .sandbox(false)
                .window_size(Some((config.viewport_width, config.viewport_height)))
                .user_data_dir(Some(config.profile_dir.clone()))
                .path(config.chrome_path.clone())
                .idle_browser_timeout(IDLE_TIMEOUT)
                .args(os_args)
                .build()
                .map_err(|e| SessionError::Launch(format!("launch options: {e}")))?;

            Browser::new(options).map_err(|e| SessionError::Launch(e.to_string()))
        })
        .await?;

        info!("browser launched");
        Ok(Self {
            browser: Arc::new(browser),
        })
    }
}

fn kiosk_args(config: &Config) -> Vec<String> {
    vec![
        // app mode: no address bar or tab strip
        format!("--app={}", config.target_url),
        "--window-position=0,0".to_string(),
        "--kiosk".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-features=Translate,BackForwardCache".to_string(),
        "--autoplay-policy=no-user-gesture-required".to_string(),
        // the display must keep rendering while unfocused
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--use-gl=swiftshader".to_string(),
        "--hide-scrollbars".to_string(),
    ]
}

fn page_tabs(browser: &Browser) -> Result<Vec<Arc<Tab>>> {
    // headless_chrome only tracks page-type targets as tabs, which is
    // exactly the discriminator acquisition needs
    let tabs = browser.get_tabs();
    let guard = tabs.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(guard.clone())
}

#[async_trait]
impl BrowserControl for ChromeKiosk {
    async fn wait_for_page(
        &self,
        host: &str,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn PageControl>>> {
        let browser = self.browser.clone();
        let host = host.to_string();
        blocking(move || {
            let deadline = Instant::now() + timeout;
            loop {
                for tab in page_tabs(&browser)? {
                    if tab.get_url().contains(&host) {
                        return Ok(Some(Arc::new(ChromeTab { tab }) as Arc<dyn PageControl>));
                    }
                }
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(TARGET_POLL_INTERVAL);
            }
        })
        .await
    }

    async fn first_page(&self) -> Result<Option<Arc<dyn PageControl>>> {
        let browser = self.browser.clone();
        blocking(move || {
            Ok(page_tabs(&browser)?
                .first()
                .cloned()
                .map(|tab| Arc::new(ChromeTab { tab }) as Arc<dyn PageControl>))
        })
        .await
    }

    async fn new_page(&self) -> Result<Arc<dyn PageControl>> {
        let browser = self.browser.clone();
        blocking(move || {
            let tab = browser
                .new_tab()
                .map_err(|e| SessionError::Control(format!("new page: {e}")))?;
            Ok(Arc::new(ChromeTab { tab }) as Arc<dyn PageControl>)
        })
        .await
    }
}

/// Page handle backed by a CDP tab.
pub struct ChromeTab {
    tab: Arc<Tab>,
}

#[async_trait]
impl PageControl for ChromeTab {
    fn url(&self) -> String {
        self.tab.get_url()
    }

    async fn register_preload_script(&self, source: &str) -> Result<()> {
        let tab = self.tab.clone();
        let source = source.to_string();
        blocking(move || {
            tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
                source,
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })
            .map_err(|e| SessionError::Control(format!("preload script: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn set_user_agent(&self, user_agent: &str, accept_language: &str) -> Result<()> {
        let tab = self.tab.clone();
        let user_agent = user_agent.to_string();
        let accept_language = accept_language.to_string();
        blocking(move || {
            tab.set_user_agent(&user_agent, Some(&accept_language), None)
                .map_err(|e| SessionError::Control(format!("user agent: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let tab = self.tab.clone();
        blocking(move || {
            tab.set_bounds(headless_chrome::types::Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(f64::from(width)),
                height: Some(f64::from(height)),
            })
            .map_err(|e| SessionError::Control(format!("viewport: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn observe(&self, observer: Arc<dyn PageObserver>) -> Result<()> {
        let tab = self.tab.clone();
        blocking(move || {
            tab.enable_log()
                .map_err(|e| SessionError::Control(format!("log domain: {e}")))?;
            tab.enable_runtime()
                .map_err(|e| SessionError::Control(format!("runtime domain: {e}")))?;

            tab.add_event_listener(Arc::new(move |event: &Event| match event {
                Event::PageFrameNavigated(e) => {
                    // sub-frame navigations are not the session's concern
                    if e.params.frame.parent_id.is_none() {
                        observer.main_frame_navigated(&e.params.frame.url);
                    }
                }
                Event::RuntimeConsoleAPICalled(e) => {
                    let text = e
                        .params
                        .args
                        .iter()
                        .filter_map(|arg| arg.value.as_ref())
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    observer.console_message(&text);
                }
                Event::RuntimeExceptionThrown(e) => {
                    let details = &e.params.exception_details;
                    let text = details
                        .exception
                        .as_ref()
                        .and_then(|exc| exc.description.clone())
                        .unwrap_or_else(|| details.text.clone());
                    observer.page_error(&text);
                }
                Event::LogEntryAdded(e) => {
                    let entry = &e.params.entry;
                    let detail = match &entry.url {
                        Some(url) => format!("{} {}", url, entry.text),
                        None => entry.text.clone(),
                    };
                    if format!("{:?}", entry.source).eq_ignore_ascii_case("network") {
                        observer.request_failed(&detail);
                    } else {
                        observer.console_message(&detail);
                    }
                }
                _ => {}
            }))
            .map_err(|e| SessionError::Control(format!("event listener: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab.clone();
        let url = url.to_string();
        blocking(move || {
            let dom_loaded = Arc::new(AtomicBool::new(false));
            let flag = dom_loaded.clone();
            tab.add_event_listener(Arc::new(move |event: &Event| {
                if matches!(event, Event::PageDomContentEventFired(_)) {
                    flag.store(true, Ordering::SeqCst);
                }
            }))
            .map_err(|e| SessionError::Navigation(format!("{url}: {e}")))?;

            debug!("navigating to {url}");
            tab.navigate_to(&url)
                .map_err(|e| SessionError::Navigation(format!("{url}: {e}")))?;

            // wait for DOM-content-loaded only; the page is JS-heavy and
            // keeps loading long after
            let deadline = Instant::now() + timeout;
            while !dom_loaded.load(Ordering::SeqCst) {
                if Instant::now() >= deadline {
                    return Err(SessionError::Navigation(format!(
                        "no DOM-content-loaded within {timeout:?} for {url}"
                    )));
                }
                std::thread::sleep(NAVIGATION_POLL_INTERVAL);
            }
            Ok(())
        })
        .await
    }

    async fn evaluate(&self, script: &str) -> Result<()> {
        let tab = self.tab.clone();
        let script = script.to_string();
        blocking(move || {
            tab.evaluate(&script, false)
                .map_err(|e| SessionError::Control(format!("evaluate: {e}")))?;
            Ok(())
        })
        .await
    }
}
