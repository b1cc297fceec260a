#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod pagerduty;
pub mod slack;

pub use config::Config;
pub use errors::{AppError, Result};
