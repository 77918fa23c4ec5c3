//! HTTP boundary of the snip URL shortener.
//!
//! Exposes `POST /shorten`, `GET /{code}` and `GET /health` on top of any
//! [`Shortener`](snip_core::Shortener).

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod startup;
pub mod state;

pub use app::App;
pub use state::AppState;
