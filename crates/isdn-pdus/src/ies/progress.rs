use core::fmt;

use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// In-band information or an appropriate pattern is now available
pub const PROGRESS_INBAND_AVAILABLE: u8 = 8;

/// Progress indicator (Q.931 4.5.23)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub coding: u8,
    pub location: u8,
    pub description: u8,
}

impl InfoElement for Progress {
    const TAG: IeTag = IeTag::Progress;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 2, "progress")?;
        Ok(Progress {
            coding: (body[0] & 0x60) >> 5,
            location: body[0] & 0x0f,
            description: body[1] & 0x7f,
        })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.coding, 0..=3, "progress_coding")?;
        expect_range!(self.location, 0..=15, "progress_location")?;
        expect_range!(self.description, 0..=127, "progress")?;
        out.push(0x80 | (self.coding << 5) | self.location);
        out.push(0x80 | self.description);
        Ok(())
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Progress {{ coding: {} location: {} description: {} }}", self.coding, self.location, self.description)
    }
}
