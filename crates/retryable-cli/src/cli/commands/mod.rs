//! CLI command handlers, one per file.

mod clear;
mod config;
mod fetch;
mod retry;

pub use clear::run_clear;
pub use config::run_config;
pub use fetch::{run_fetch, FetchArgs};
pub use retry::run_retry;
