//! # Spinlog Common Library
//!
//! Shared code for the spinlog services including:
//! - Common error types
//! - Configuration loading (ENV / TOML)

pub mod config;
pub mod error;

pub use error::{Error, Result};
