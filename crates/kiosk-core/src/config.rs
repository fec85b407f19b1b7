//! Process-lifetime configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;

fn default_target_url() -> String {
    "https://v2.weatherscan.net/?90210".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

/// Immutable session configuration.
///
/// Populated once at startup from environment variables; every key has a
/// default so construction never fails.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL the kiosk display is pinned to (`TARGET_URL`)
    pub target_url: String,
    /// Viewport width in pixels (`VIEWPORT_W`)
    pub viewport_width: u32,
    /// Viewport height in pixels (`VIEWPORT_H`)
    pub viewport_height: u32,
    /// Port the status endpoint listens on (`HEALTH_PORT`)
    pub health_port: u16,
    /// Persistent browser profile directory (`USER_DATA_DIR`)
    pub profile_dir: PathBuf,
    /// User-agent override applied to the page (`USER_AGENT`)
    pub user_agent: String,
    /// Explicit browser binary path (`CHROME_PATH`); autodetected when unset
    pub chrome_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            viewport_width: 1280,
            viewport_height: 720,
            health_port: 3001,
            profile_dir: PathBuf::from("/profile"),
            user_agent: default_user_agent(),
            chrome_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            target_url: std::env::var("TARGET_URL").unwrap_or(defaults.target_url),
            viewport_width: env_or("VIEWPORT_W", defaults.viewport_width),
            viewport_height: env_or("VIEWPORT_H", defaults.viewport_height),
            health_port: env_or("HEALTH_PORT", defaults.health_port),
            profile_dir: std::env::var("USER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.profile_dir),
            user_agent: std::env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            chrome_path: std::env::var("CHROME_PATH").ok().map(PathBuf::from),
        }
    }

    /// The `"<W>x<H>"` label reported by the status endpoint.
    pub fn viewport_label(&self) -> String {
        format!("{}x{}", self.viewport_width, self.viewport_height)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
