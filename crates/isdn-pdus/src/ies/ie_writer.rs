use isdn_saps::{FRAME_DEFAULT_CAPACITY, alloc_payload};

use super::{IeCtx, InfoElement};

/// Largest body a single length octet can describe
const MAX_IE_BODY: usize = 0xff;

/// Appends framed IEs to an outbound payload. An IE whose encoder rejects its
/// input is logged and left out; the rest of the message is unaffected.
pub struct IeWriter {
    out: Vec<u8>,
    ctx: IeCtx,
    omitted: usize,
}

impl IeWriter {
    pub fn new(ctx: IeCtx) -> Self {
        Self {
            out: alloc_payload(FRAME_DEFAULT_CAPACITY),
            ctx,
            omitted: 0,
        }
    }

    /// Returns whether the IE was written
    pub fn put<T: InfoElement>(&mut self, ie: &T) -> bool {
        let tag = T::TAG;
        if tag.is_single_octet() {
            self.out.push(tag.into_raw() as u8);
            return true;
        }

        let mut body = Vec::new();
        if let Err(e) = ie.to_body(&mut body, &self.ctx) {
            tracing::error!("cannot encode {}: {}, IE omitted", tag, e);
            self.omitted += 1;
            return false;
        }
        if body.is_empty() {
            tracing::trace!("{} has nothing to encode", tag);
            return false;
        }
        if body.len() > MAX_IE_BODY {
            tracing::error!("{} body of {} bytes exceeds {}, IE omitted", tag, body.len(), MAX_IE_BODY);
            self.omitted += 1;
            return false;
        }

        self.out.push(tag.into_raw() as u8);
        self.out.push(body.len() as u8);
        self.out.extend_from_slice(&body);
        true
    }

    pub fn put_opt<T: InfoElement>(&mut self, ie: Option<&T>) -> bool {
        match ie {
            Some(ie) => self.put(ie),
            None => false,
        }
    }

    pub fn ctx(&self) -> &IeCtx {
        &self.ctx
    }

    /// IEs dropped because of invalid input
    pub fn omitted(&self) -> usize {
        self.omitted
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
