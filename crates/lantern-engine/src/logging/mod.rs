//! Logger setup. Library code logs through the `log` facade only; binaries call
//! `init_logging` once at startup.

mod init;

pub use init::{init_logging, LoggingConfig};
