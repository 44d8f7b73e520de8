//! Called, calling, connected, redirecting and redirection party numbers.
//! All share octet 3 (type of number, numbering plan); the optional octet 3a with
//! presentation and screening is present when octet 3 has its extension bit clear.

use core::fmt;

use isdn_core::bytecursor::clamped_text;
use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement, latin1_bytes};
use crate::enums::ie_tag::IeTag;

/// Destination buffer size for decoded numbers, terminator included
pub const NUMBER_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartyNumber {
    /// 3 bits, type of number
    pub number_type: u8,
    /// 4 bits, numbering plan identification
    pub plan: u8,
    /// 2 bits, None when octet 3a is absent
    pub presentation: Option<u8>,
    /// 2 bits
    pub screen: Option<u8>,
    pub number: String,
}

impl PartyNumber {
    pub fn new(number_type: u8, plan: u8, presentation: Option<u8>, screen: Option<u8>, number: &str) -> Self {
        Self {
            number_type,
            plan,
            presentation,
            screen,
            number: number.to_string(),
        }
    }

    fn check_header(&self) -> Result<(), PduParseErr> {
        expect_range!(self.number_type, 0..=7, "number_type")?;
        expect_range!(self.plan, 0..=15, "numbering_plan")?;
        if let Some(p) = self.presentation {
            expect_range!(p, 0..=3, "presentation")?;
        }
        Ok(())
    }

    fn octet3(&self) -> u8 {
        (self.number_type << 4) | self.plan
    }

    fn screen_for_encode(&self) -> Result<u8, PduParseErr> {
        match self.screen {
            Some(s) => {
                expect_range!(s, 0..=3, "screen")?;
                Ok(s)
            }
            None => Err(PduParseErr::Inconsistency { field: "screen", reason: "presentation given without screening" }),
        }
    }

    /// Octet 3 with optional presentation and screening octet 3a
    fn decode_with_screen(body: &[u8], field: &'static str) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, field)?;
        let mut pn = Self::decode_octet3(body[0]);
        if body[0] & 0x80 == 0 {
            expect_min_len!(body, 2, field)?;
            pn.presentation = Some((body[1] & 0x60) >> 5);
            pn.screen = Some(body[1] & 0x03);
            pn.number = clamped_text(&body[2..], NUMBER_CAPACITY);
        } else {
            pn.number = clamped_text(&body[1..], NUMBER_CAPACITY);
        }
        Ok(pn)
    }

    fn encode_with_screen(&self, out: &mut Vec<u8>) -> Result<(), PduParseErr> {
        self.check_header()?;
        match self.presentation {
            Some(p) => {
                let screen = self.screen_for_encode()?;
                out.push(self.octet3());
                out.push(0x80 | (p << 5) | screen);
            }
            None => out.push(0x80 | self.octet3()),
        }
        out.extend_from_slice(&latin1_bytes(&self.number));
        Ok(())
    }

    fn decode_octet3(b: u8) -> Self {
        PartyNumber {
            number_type: (b & 0x70) >> 4,
            plan: b & 0x0f,
            ..Default::default()
        }
    }
}

impl fmt::Display for PartyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' type: {} plan: {} pres: {:?} screen: {:?}",
            self.number, self.number_type, self.plan, self.presentation, self.screen
        )
    }
}

/// Called party number. No octet 3a, the number is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalledNumber {
    pub number_type: u8,
    pub plan: u8,
    pub number: String,
}

impl InfoElement for CalledNumber {
    const TAG: IeTag = IeTag::CalledNumber;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 2, "called_pn")?;
        Ok(CalledNumber {
            number_type: (body[0] & 0x70) >> 4,
            plan: body[0] & 0x0f,
            number: clamped_text(&body[1..], NUMBER_CAPACITY),
        })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.number_type, 0..=7, "number_type")?;
        expect_range!(self.plan, 0..=15, "numbering_plan")?;
        if self.number.is_empty() {
            return Err(PduParseErr::Inconsistency { field: "called_pn", reason: "number not given" });
        }
        out.push(0x80 | (self.number_type << 4) | self.plan);
        out.extend_from_slice(&latin1_bytes(&self.number));
        Ok(())
    }
}

impl fmt::Display for CalledNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalledNumber {{ '{}' type: {} plan: {} }}", self.number, self.number_type, self.plan)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallingNumber(pub PartyNumber);

impl InfoElement for CallingNumber {
    const TAG: IeTag = IeTag::CallingNumber;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        PartyNumber::decode_with_screen(body, "calling_pn").map(CallingNumber)
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        self.0.encode_with_screen(out)
    }
}

impl fmt::Display for CallingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallingNumber {{ {} }}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectedNumber(pub PartyNumber);

impl InfoElement for ConnectedNumber {
    const TAG: IeTag = IeTag::ConnectedNumber;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        PartyNumber::decode_with_screen(body, "connected_pn").map(ConnectedNumber)
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        self.0.encode_with_screen(out)
    }
}

impl fmt::Display for ConnectedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectedNumber {{ {} }}", self.0)
    }
}

/// Redirecting number, sent in SETUP. Octet 3b carries the redirection reason.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectingNumber {
    pub party: PartyNumber,
    /// 4 bits, only encoded together with presentation
    pub reason: Option<u8>,
}

impl InfoElement for RedirectingNumber {
    const TAG: IeTag = IeTag::RedirectingNumber;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, "redir_nr")?;
        let mut party = PartyNumber::decode_octet3(body[0]);
        let mut reason = None;

        if body[0] & 0x80 == 0 {
            expect_min_len!(body, 2, "redir_nr")?;
            party.presentation = Some((body[1] & 0x60) >> 5);
            party.screen = Some(body[1] & 0x03);
            if body[1] & 0x80 == 0 {
                expect_min_len!(body, 3, "redir_nr")?;
                reason = Some(body[2] & 0x0f);
                party.number = clamped_text(&body[3..], NUMBER_CAPACITY);
            } else {
                party.number = clamped_text(&body[2..], NUMBER_CAPACITY);
            }
        } else {
            party.number = clamped_text(&body[1..], NUMBER_CAPACITY);
        }
        Ok(RedirectingNumber { party, reason })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        let p = &self.party;
        p.check_header()?;
        if let Some(r) = self.reason {
            expect_range!(r, 0..=15, "redir_reason")?;
        }

        match p.presentation {
            Some(pres) => {
                let screen = p.screen_for_encode()?;
                out.push(p.octet3());
                match self.reason {
                    Some(r) => {
                        out.push((pres << 5) | screen);
                        out.push(0x80 | r);
                    }
                    None => out.push(0x80 | (pres << 5) | screen),
                }
            }
            None => out.push(0x80 | p.octet3()),
        }
        out.extend_from_slice(&latin1_bytes(&p.number));
        Ok(())
    }
}

impl fmt::Display for RedirectingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedirectingNumber {{ {} reason: {:?} }}", self.party, self.reason)
    }
}

/// Redirection number, sent in NOTIFY. Octet 3a has presentation but no screening.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedirectionNumber(pub PartyNumber);

impl InfoElement for RedirectionNumber {
    const TAG: IeTag = IeTag::RedirectionNumber;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, "redir_dn")?;
        let mut party = PartyNumber::decode_octet3(body[0]);
        if body[0] & 0x80 == 0 {
            expect_min_len!(body, 2, "redir_dn")?;
            party.presentation = Some((body[1] & 0x60) >> 5);
            party.number = clamped_text(&body[2..], NUMBER_CAPACITY);
        } else {
            party.number = clamped_text(&body[1..], NUMBER_CAPACITY);
        }
        Ok(RedirectionNumber(party))
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        let p = &self.0;
        p.check_header()?;
        match p.presentation {
            Some(pres) => {
                out.push(p.octet3());
                out.push(0x80 | (pres << 5));
            }
            None => out.push(0x80 | p.octet3()),
        }
        out.extend_from_slice(&latin1_bytes(&p.number));
        Ok(())
    }
}

impl fmt::Display for RedirectionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedirectionNumber {{ {} }}", self.0)
    }
}
