//! Terminal client for live argument sessions.
//!
//! - [`config`]: layered settings (file, environment, flags) and identity
//! - [`api`]: the upstream request/response client behind the [`api::ArgumentApi`] seam
//! - [`stream`]: the live WebSocket reader
//! - [`session`]: one reconciled view per argument, driven by a single task
//! - [`render`]: plain-text rendering of view snapshots
//! - [`cli`]: command-line surface and in-session commands

pub mod api;
pub mod cli;
pub mod config;
pub mod render;
pub mod session;
pub mod stream;

pub use api::{ApiError, ApiResult, ArgumentApi, HttpArgumentApi};
pub use config::{ConfigError, ConfigOverrides, Identity, WatchConfig};
pub use session::{SessionInput, SessionOptions, SessionView};
