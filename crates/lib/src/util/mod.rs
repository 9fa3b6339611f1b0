//! Shared utilities.
//!
//! Common utilities used across the crate including filesystem helpers and test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;
