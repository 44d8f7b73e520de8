//! Q.931 message and information element codec
//!
//! - `ies`: one module per information element, plus the single-scan `IeIndex`
//! - `facility`: supplementary-service payloads in both the ASN.1 and the legacy template form
//! - `messages`: the static message table pairing every message type with its parse and build functions
//! - `structs::call_data`: the call fields messages are parsed into and built from

pub mod enums;
pub mod facility;
pub mod ies;
pub mod messages;
pub mod structs;
