//! # TroLySo Gateway
//! Axum HTTP server in front of the assistant.
//!
//! - `GET/POST /webhook`: Messenger subscription handshake and inbound events
//! - `/health`, `/test*`: diagnostics
//! - `/api/v1/knowledge/*`: read-only inspection of the loaded document, plus reload

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
