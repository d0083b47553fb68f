//! `minaret-core` — shared configuration and error types for the Minaret
//! prayer-time announcement server.
//!
//! Configuration is loaded once at startup from `minaret.toml` with
//! `MINARET_*` environment variable overrides. Required fields that are
//! missing or unparseable are a startup failure; nothing in this crate is
//! allowed to fail at runtime.

pub mod config;
pub mod error;

pub use config::MinaretConfig;
pub use error::{MinaretError, Result};
