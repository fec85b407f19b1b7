//! kiosk-core: shared configuration and session health state for kioskd
//!
//! The health tracker is the only state shared between the browser session
//! pipeline (single writer) and the status endpoint (many readers).

pub mod config;
pub mod health;

pub use config::Config;
pub use health::{HealthSnapshot, SessionHealth};
