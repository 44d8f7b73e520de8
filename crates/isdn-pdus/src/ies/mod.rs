//! Q.931 information elements, codeset 0.
//!
//! Every IE is a struct implementing [`InfoElement`]. Decoders receive the IE body
//! (the bytes after tag and length) and never look outside it. Encoders append the
//! body only; framing with tag and length is done by [`ie_writer::IeWriter`].

use isdn_core::{PduParseErr, TrunkType};

use crate::enums::ie_tag::IeTag;

pub mod bearer;
pub mod call_id;
pub mod cause;
pub mod channel_id;
pub mod complete;
pub mod date;
pub mod ie_index;
pub mod ie_writer;
pub mod notify;
pub mod party_number;
pub mod progress;
pub mod raw;
pub mod text;
pub mod useruser;

pub use ie_index::{ByteRange, IeIndex};
pub use ie_writer::IeWriter;

/// Interface properties some IEs depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IeCtx {
    pub trunk: TrunkType,
}

impl IeCtx {
    pub fn new(trunk: TrunkType) -> Self {
        Self { trunk }
    }
}

pub trait InfoElement: Sized {
    const TAG: IeTag;

    /// Decodes the IE body. Shorter bodies than the IE minimum are rejected before any field is read.
    fn from_body(body: &[u8], ctx: &IeCtx) -> Result<Self, PduParseErr>;

    /// Validates every field and appends the body. Appending nothing means the IE is omitted.
    fn to_body(&self, out: &mut Vec<u8>, ctx: &IeCtx) -> Result<(), PduParseErr>;
}

/// Number and text fields are carried as Latin-1 octets
pub(crate) fn latin1_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| if (c as u32) <= 0xff { c as u32 as u8 } else { b'?' }).collect()
}
