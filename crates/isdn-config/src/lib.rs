//! ISDN stack configuration management
//!
//! This crate provides configuration loading and parsing for the signalling stack:
//! - TOML configuration file parsing
//! - Per-port policy and general options
//! - Shared immutable config plus lock-protected runtime state

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;
