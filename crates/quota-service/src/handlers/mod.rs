//! HTTP request handlers.

pub mod health;
pub mod storage;
pub mod usage;
