//! Hours-of-service CLI library.
//!
//! This crate provides the CLI interface for the duty log.

pub mod adapters;
mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
