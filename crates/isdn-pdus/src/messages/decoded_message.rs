use core::fmt;

use isdn_saps::Frame;

use crate::enums::ie_tag::IeTag;
use crate::ies::{IeCtx, IeIndex, InfoElement};

/// An inbound call-control frame with its IEs located by a single scan.
/// Accessors decode on demand; a malformed IE reads as absent.
pub struct DecodedMessage<'a> {
    frame: &'a Frame,
    ies: IeIndex,
    ctx: IeCtx,
}

impl<'a> DecodedMessage<'a> {
    pub fn new(frame: &'a Frame, ctx: IeCtx) -> Self {
        let ies = IeIndex::scan(&frame.payload);
        if ies.is_truncated() {
            tracing::warn!("truncated IE in frame {}, using the {} IEs before it", frame, ies.count());
        }
        Self { frame, ies, ctx }
    }

    pub fn frame(&self) -> &'a Frame {
        self.frame
    }

    pub fn prim(&self) -> u32 {
        self.frame.prim
    }

    pub fn index(&self) -> &IeIndex {
        &self.ies
    }

    pub fn has(&self, tag: IeTag) -> bool {
        self.ies.contains(tag)
    }

    /// IE body without tag and length. Single-octet IEs give an empty slice.
    pub fn raw(&self, tag: IeTag) -> Option<&'a [u8]> {
        self.ies.body(tag, &self.frame.payload)
    }

    pub fn ie<T: InfoElement>(&self) -> Option<T> {
        let body = self.raw(T::TAG)?;
        match T::from_body(body, &self.ctx) {
            Ok(ie) => Some(ie),
            Err(e) => {
                tracing::warn!("malformed {} ({} bytes): {}", T::TAG, body.len(), e);
                None
            }
        }
    }
}

impl fmt::Display for DecodedMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ies: {}", self.frame, self.ies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{TrunkType, debug};
    use isdn_saps::prim;

    use crate::ies::cause::Cause;
    use crate::ies::complete::SendingComplete;

    #[test]
    fn test_malformed_ie_reads_as_absent() {
        debug::setup_logging_verbose();
        // Cause with a single octet is below its minimum, sending complete follows
        let frame = Frame::new(prim::CC_DISCONNECT | prim::INDICATION, 1, 0xff01, vec![0x08, 0x01, 0x80, 0xa1]);
        let msg = DecodedMessage::new(&frame, IeCtx::new(TrunkType::Bri));
        assert!(msg.has(IeTag::Cause));
        assert_eq!(msg.ie::<Cause>(), None);
        assert_eq!(msg.ie::<SendingComplete>(), Some(SendingComplete));
        assert_eq!(msg.raw(IeTag::SendingComplete), Some(&[][..]));
        assert_eq!(msg.raw(IeTag::Display), None);
    }

    #[test]
    fn test_truncated_payload_keeps_earlier_ies() {
        debug::setup_logging_verbose();
        let frame = Frame::new(prim::CC_RELEASE | prim::INDICATION, 1, 1, vec![0x08, 0x02, 0x80, 0x90, 0x28, 0x09, b'x']);
        let msg = DecodedMessage::new(&frame, IeCtx::new(TrunkType::Bri));
        assert!(msg.index().is_truncated());
        assert_eq!(msg.ie::<Cause>(), Some(Cause { location: 0, value: 16 }));
        assert!(!msg.has(IeTag::Display));
    }
}
