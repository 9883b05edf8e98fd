//! Data models for orders and configuration.

pub mod config;
pub mod order;
