//! kiosk-api: status endpoint for the kiosk display
//!
//! One read-only endpoint exposing the session health snapshot. Serves
//! from the moment the process starts and never blocks on the browser
//! session pipeline; session failure shows up in the response body, not
//! in the status code.

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::HealthResponse;
pub use routes::routes;
pub use server::{start_server, AppState};
