//! Configuration loading for the reader.
//!
//! Settings live in `conf/config.toml`, grouped into tables. Any missing or
//! invalid entry falls back to its default so the window can still open.

mod defaults;
mod io;
mod models;

pub use io::load_config;
pub use models::{AppConfig, LogLevel, ThemeMode};
