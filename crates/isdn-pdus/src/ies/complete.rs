use core::fmt;

use isdn_core::PduParseErr;

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Sending complete, a single-octet IE without body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendingComplete;

impl InfoElement for SendingComplete {
    const TAG: IeTag = IeTag::SendingComplete;

    fn from_body(_body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        Ok(SendingComplete)
    }

    fn to_body(&self, _out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        Ok(())
    }
}

impl fmt::Display for SendingComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SendingComplete")
    }
}
