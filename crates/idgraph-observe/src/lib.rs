//! # Idgraph Observe - Structured Logging
//!
//! Logging initialization for the idgraph core and its hosts.

mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};
