use core::fmt;

use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Notification indicator, 7 bit description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notify(pub u8);

impl InfoElement for Notify {
    const TAG: IeTag = IeTag::Notify;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, "notify")?;
        Ok(Notify(body[0] & 0x7f))
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.0, 0..=0x7f, "notify")?;
        out.push(0x80 | self.0);
        Ok(())
    }
}

impl fmt::Display for Notify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Notify({})", self.0)
    }
}
