//! Utility helpers for the reconciliation service

pub mod db_retry;

pub use db_retry::retry_on_lock;
