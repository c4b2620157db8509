//! Core types and scoring logic for the Podio brokerage back office.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod commission;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod score;
pub mod store;
pub mod week;

pub use error::{Error, Result};
