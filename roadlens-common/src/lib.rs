//! # Roadlens Common Library
//!
//! Shared code for all roadlens services including:
//! - Database pool initialization and schema bootstrap
//! - Shared entity models (projects, surveys, historical ratings, aggregates)
//! - Error types
//! - Configuration loading and root folder resolution
//! - Geometry utilities over WGS84 coordinates

pub mod config;
pub mod db;
pub mod error;
pub mod geo;

pub use error::{Error, Result};
