use core::fmt;

use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

pub const CAUSE_NORMAL_CLEARING: u8 = 16;
pub const CAUSE_USER_BUSY: u8 = 17;
pub const CAUSE_NO_CHANNEL: u8 = 34;
pub const CAUSE_REQUESTED_CHAN_UNAVAIL: u8 = 44;
pub const CAUSE_RESOURCE_UNAVAIL: u8 = 47;
pub const CAUSE_FACILITY_NOT_IMPLEMENTED: u8 = 69;
pub const CAUSE_INVALID_CALLREF: u8 = 81;
pub const CAUSE_RESPONSE_TO_STATUS_ENQUIRY: u8 = 30;

/// Cause (Q.931 4.5.12)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cause {
    /// 4 bits on the wire, 0..7 accepted for encoding
    pub location: u8,
    /// 7 bits, cause value
    pub value: u8,
}

impl InfoElement for Cause {
    const TAG: IeTag = IeTag::Cause;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 2, "cause")?;
        let location = body[0] & 0x0f;
        // Octet 3a (recommendation) precedes the cause value when octet 3 is not the last
        let value = if body[0] & 0x80 == 0 {
            expect_min_len!(body, 3, "cause")?;
            body[2] & 0x7f
        } else {
            body[1] & 0x7f
        };
        Ok(Cause { location, value })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.location, 0..=7, "cause_location")?;
        expect_range!(self.value, 0..=127, "cause")?;
        out.push(0x80 | self.location);
        out.push(0x80 | self.value);
        Ok(())
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cause {{ location: {} value: {} }}", self.location, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{TrunkType, debug};

    #[test]
    fn test_cause() {
        debug::setup_logging_verbose();
        let ctx = IeCtx::new(TrunkType::Bri);
        let c = Cause { location: 1, value: CAUSE_NORMAL_CLEARING };
        let mut out = Vec::new();
        c.to_body(&mut out, &ctx).unwrap();
        assert_eq!(out, vec![0x81, 0x90]);
        assert_eq!(Cause::from_body(&out, &ctx).unwrap(), c);

        // With recommendation octet
        assert_eq!(Cause::from_body(&[0x02, 0x80, 0x91], &ctx).unwrap(), Cause { location: 2, value: 17 });
        assert!(Cause::from_body(&[0x02, 0x80], &ctx).is_err());
        assert!(Cause::from_body(&[0x81], &ctx).is_err());
        assert!(Cause { location: 8, value: 1 }.to_body(&mut Vec::new(), &ctx).is_err());
        assert!(Cause { location: 0, value: 128 }.to_body(&mut Vec::new(), &ctx).is_err());
    }
}
