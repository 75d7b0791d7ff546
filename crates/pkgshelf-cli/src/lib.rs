//! Command-line front end for the pkgshelf download queue.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use wiremock as _;

// Loaded by the binary
use dotenvy as _;

pub mod commands;
pub mod handlers;
pub mod logging;
pub mod parser;

pub use commands::{Commands, FetchArgs};
pub use parser::Cli;
