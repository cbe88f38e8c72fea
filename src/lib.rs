//! Kraken Helper — scheduled Bitcoin buys and threshold withdrawals.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod exchange;
pub mod notify;
pub mod strategy;
pub mod engine;
pub mod server;
