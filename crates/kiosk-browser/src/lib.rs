//! kiosk-browser: browser session lifecycle for the kiosk display
//!
//! Launches a dedicated Chromium instance, acquires the page showing the
//! configured URL, applies anti-detection patches before any page script
//! runs, performs the initial navigation and settle sequence, and reports
//! session health through [`kiosk_core::SessionHealth`].
//!
//! The browser itself sits behind the [`control`] traits so the session
//! pipeline can be exercised without a Chrome binary.

pub mod chrome;
pub mod control;
pub mod error;
pub mod session;
pub mod stealth;
pub mod target;

pub use chrome::ChromeKiosk;
pub use control::{BrowserControl, PageControl, PageObserver};
pub use error::{Result, SessionError};
pub use session::{run, Timings};
pub use stealth::STEALTH_PATCH;
pub use target::target_host;
