//! CLI command implementations.

pub mod common;
pub mod config;
pub mod fetch;
pub mod init;
pub mod run;
