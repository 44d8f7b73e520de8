//! Core utilities for the ISDN signalling stack
//!
//! This crate provides fundamental types and utilities used across the stack:
//! - ByteCursor for bounds-checked octet parsing
//! - ASN.1 primitive codec for facility payloads
//! - Interface roles, trunk types and the B-channel bitmap
//! - Common macros and debug utilities

pub mod asn1;
pub mod bytecursor;
pub mod channel_alloc;
pub mod debug;
pub mod isdn_common;
pub mod pdu_parse_error;

pub use bytecursor::ByteCursor;
pub use channel_alloc::{ChannelAllocErr, ChannelBitmap};
pub use isdn_common::*;
pub use pdu_parse_error::PduParseErr;

/// Stack version with the git revision it was built from
pub const STACK_VERSION: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"),
    "-",
    git_version::git_version!(fallback = "unknown")
);

/// Layer-3 process identifier as carried in frame `dinfo`
pub type L3Id = u32;
