//! CLI subcommands.

pub mod batch;
pub mod common;
pub mod config;
pub mod init;
pub mod run;
pub mod scan;
