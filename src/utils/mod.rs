//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `gust` application.
//!
//! This module centralizes reusable components: the crate-wide error types,
//! logging setup, and the hex dump printer used by the subscribe CLI.

pub mod error;
pub mod hex;
pub mod logging;

#[cfg(test)]
mod tests;
