//! kioskd: kiosk display renderer
//!
//! Pins a dedicated Chromium instance to one web page on a fixed-size
//! viewport and exposes a status endpoint for external monitoring. The
//! endpoint serves immediately; the browser session comes up alongside
//! it. Any fatal session error is recorded in the final health snapshot
//! and the process exits non-zero for the supervisor to restart.

use anyhow::Context;
use kiosk_browser::{ChromeKiosk, Timings};
use kiosk_core::{Config, SessionHealth};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_args() {
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    tracing::info!("Starting kioskd");
    tracing::info!("Target: {}", config.target_url);
    tracing::info!("Viewport: {}", config.viewport_label());

    let health = SessionHealth::new();

    // The status endpoint must serve from the start, independent of the
    // session pipeline.
    let server = tokio::spawn(kiosk_api::start_server(
        config.health_port,
        config.clone(),
        health.clone(),
    ));

    if let Err(e) = run_session(&config, &health).await {
        let detail = format!("{e:#}");
        health.record_fatal(&detail);
        tracing::error!("Fatal: {detail}");
        // no in-process restart; the supervisor owns recovery
        std::process::exit(1);
    }

    // The endpoint keeps the process alive for the display's lifetime.
    server.await??;
    Ok(())
}

async fn run_session(config: &Config, health: &SessionHealth) -> anyhow::Result<()> {
    let browser = ChromeKiosk::launch(config)
        .await
        .context("browser launch")?;
    kiosk_browser::run(&browser, config, health, &Timings::default())
        .await
        .context("session pipeline")?;
    Ok(())
}

/// Handle --help/--version; returns true when the process should exit.
fn handle_args() -> bool {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return true;
            }
            "--version" | "-v" => {
                println!("kioskd {}", env!("CARGO_PKG_VERSION"));
                return true;
            }
            _ => {}
        }
    }
    false
}

fn print_help() {
    println!("kioskd - kiosk display renderer");
    println!();
    println!("Usage:");
    println!("  kioskd               Run the display session");
    println!("  kioskd --help        Show this help message");
    println!("  kioskd --version     Show version");
    println!();
    println!("Environment Variables:");
    println!("  TARGET_URL           Page to display (default: https://v2.weatherscan.net/?90210)");
    println!("  VIEWPORT_W           Viewport width (default: 1280)");
    println!("  VIEWPORT_H           Viewport height (default: 720)");
    println!("  HEALTH_PORT          Status endpoint port (default: 3001)");
    println!("  USER_DATA_DIR        Browser profile directory (default: /profile)");
    println!("  USER_AGENT           User-agent override");
    println!("  CHROME_PATH          Browser binary path (default: autodetect)");
}
