//! Storyloom library crate
//!
//! Exposes the backlog pipeline so the binary, benchmarks, and tests can
//! drive it without going through CLI startup.

pub mod backlog;
pub mod cli;
pub mod config;
pub mod implementation;
pub mod llm;
pub mod logging;
pub mod render;
pub mod repo;
pub mod spinner;
pub mod story;
pub mod util;

#[cfg(test)]
mod test_support;
