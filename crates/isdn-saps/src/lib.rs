//! Primitives exchanged with the device transport
//!
//! - `prim`: primitive codes, qualifiers and masks
//! - `frame`: the frame carried across the transport boundary
//! - `addr`: routing address layout

pub mod addr;
pub mod frame;
pub mod prim;

pub use frame::*;
