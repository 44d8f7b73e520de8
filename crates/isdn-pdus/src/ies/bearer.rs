use core::fmt;

use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Information transfer rate that carries a rate multiplier octet
pub const RATE_MULTIRATE: u8 = 0x18;
/// 64 kbit/s circuit mode
pub const RATE_64K: u8 = 0x10;

/// Bearer capability (Q.931 4.5.5)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BearerCapability {
    /// 2 bits, 0 = CCITT
    pub coding: u8,
    /// 5 bits, information transfer capability
    pub capability: u8,
    /// 2 bits, 0 = circuit mode
    pub mode: u8,
    /// 5 bits, information transfer rate
    pub rate: u8,
    /// 7 bits, only when `rate` is multirate
    pub multi: Option<u8>,
    /// 5 bits, user information layer 1 protocol
    pub user: Option<u8>,
    // Octet 5a and 5d, decoded only
    pub async_mode: Option<bool>,
    pub urate: Option<u8>,
    pub stopbits: Option<u8>,
    pub dbits: Option<u8>,
    pub parity: Option<u8>,
}

impl BearerCapability {
    pub fn new(coding: u8, capability: u8, mode: u8, rate: u8, user: Option<u8>) -> Self {
        Self {
            coding,
            capability,
            mode,
            rate,
            user,
            ..Default::default()
        }
    }
}

impl InfoElement for BearerCapability {
    const TAG: IeTag = IeTag::BearerCapability;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 2, "bearer")?;

        let mut bc = BearerCapability {
            coding: (body[0] & 0x60) >> 5,
            capability: body[0] & 0x1f,
            ..Default::default()
        };

        // Octet 3a only exists when octet 3 leaves the extension bit clear
        let mut pos = if body[0] & 0x80 == 0 { 2 } else { 1 };
        let Some(&octet4) = body.get(pos) else {
            return Err(PduParseErr::TooShort { field: "bearer_mode", min: pos + 1, found: body.len() });
        };
        bc.mode = (octet4 & 0x60) >> 5;
        bc.rate = octet4 & 0x1f;
        pos += 1;

        if bc.rate == RATE_MULTIRATE {
            match body.get(pos) {
                Some(&m) => bc.multi = Some(m & 0x7f),
                None => return Ok(bc),
            }
            pos += 1;
        }

        // Layer 1 identification
        let Some(&octet5) = body.get(pos) else {
            return Ok(bc);
        };
        if octet5 & 0x60 != 0x20 {
            return Ok(bc);
        }
        bc.user = Some(octet5 & 0x1f);
        let mut more = octet5 & 0x80 == 0;
        pos += 1;

        if !more {
            return Ok(bc);
        }
        let Some(&octet5a) = body.get(pos) else {
            return Ok(bc);
        };
        bc.async_mode = Some(octet5a & 0x40 != 0);
        bc.urate = Some(octet5a & 0x1f);
        more = octet5a & 0x80 == 0;
        pos += 1;

        // 5b (intermediate rate, flow control) and 5c (rate adaption header) are skipped
        for _ in 0..2 {
            if !more {
                return Ok(bc);
            }
            let Some(&o) = body.get(pos) else {
                return Ok(bc);
            };
            more = o & 0x80 == 0;
            pos += 1;
        }

        if more {
            if let Some(&octet5d) = body.get(pos) {
                bc.stopbits = Some((octet5d & 0x60) >> 5);
                bc.dbits = Some((octet5d & 0x18) >> 3);
                bc.parity = Some(octet5d & 0x07);
            }
        }
        Ok(bc)
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.coding, 0..=3, "bearer_coding")?;
        expect_range!(self.capability, 0..=31, "bearer_capability")?;
        expect_range!(self.mode, 0..=3, "bearer_mode")?;
        expect_range!(self.rate, 0..=31, "bearer_rate")?;
        if let Some(m) = self.multi {
            expect_range!(m, 0..=127, "bearer_multi")?;
        }
        if let Some(u) = self.user {
            expect_range!(u, 0..=31, "bearer_user")?;
        }

        let multi = match self.multi {
            Some(m) if self.rate == RATE_MULTIRATE => Some(m),
            Some(m) => {
                tracing::warn!("bearer multiplier {} needs rate {}, dropping it (rate {})", m, RATE_MULTIRATE, self.rate);
                None
            }
            None => None,
        };

        out.push(0x80 | (self.coding << 5) | self.capability);
        out.push(0x80 | (self.mode << 5) | self.rate);
        if let Some(m) = multi {
            out.push(0x80 | m);
        }
        if let Some(u) = self.user {
            out.push(0xa0 | u);
        }
        Ok(())
    }
}

impl fmt::Display for BearerCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BearerCapability {{ coding: {} capability: {} mode: {} rate: {} multi: {:?} user: {:?} async: {:?} urate: {:?} }}",
            self.coding, self.capability, self.mode, self.rate, self.multi, self.user, self.async_mode, self.urate
        )
    }
}
