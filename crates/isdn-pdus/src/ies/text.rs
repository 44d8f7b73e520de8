use core::fmt;

use isdn_core::PduParseErr;
use isdn_core::bytecursor::{clamped_text, truncate_chars};

use super::{IeCtx, InfoElement, latin1_bytes};
use crate::enums::ie_tag::IeTag;

/// Longest display text put on the wire
pub const DISPLAY_MAX: usize = 80;
/// Destination sizes for decoded text, terminator included
pub const DISPLAY_CAPACITY: usize = 84;
pub const KEYPAD_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Display(pub String);

impl InfoElement for Display {
    const TAG: IeTag = IeTag::Display;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        Ok(Display(clamped_text(body, DISPLAY_CAPACITY)))
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        let text = truncate_chars(&self.0, DISPLAY_MAX);
        if text.len() < self.0.len() {
            tracing::debug!("display truncated to {} characters", DISPLAY_MAX);
        }
        out.extend_from_slice(&latin1_bytes(text));
        Ok(())
    }
}

impl fmt::Display for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Display('{}')", self.0)
    }
}

/// Keypad facility, digits dialled as text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keypad(pub String);

impl InfoElement for Keypad {
    const TAG: IeTag = IeTag::Keypad;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        Ok(Keypad(clamped_text(body, KEYPAD_CAPACITY)))
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        out.extend_from_slice(&latin1_bytes(&self.0));
        Ok(())
    }
}

impl fmt::Display for Keypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypad('{}')", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{TrunkType, debug};

    #[test]
    fn test_display_truncation() {
        debug::setup_logging_verbose();
        let ctx = IeCtx::new(TrunkType::Bri);
        let long = Display("x".repeat(120));
        let mut out = Vec::new();
        long.to_body(&mut out, &ctx).unwrap();
        assert_eq!(out.len(), DISPLAY_MAX);

        let d = Display("Reception".into());
        let mut out = Vec::new();
        d.to_body(&mut out, &ctx).unwrap();
        assert_eq!(Display::from_body(&out, &ctx).unwrap(), d);

        let k = Keypad::from_body(&[b'#'; 100], &ctx).unwrap();
        assert_eq!(k.0.len(), KEYPAD_CAPACITY - 1);
    }
}
