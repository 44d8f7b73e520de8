use core::fmt;
use core::ops::Range;

use crate::enums::ie_tag::IeTag;

/// Location of an IE body inside a frame payload
pub type ByteRange = Range<usize>;

/// Where each known IE sits in one message, computed by a single scan over the payload.
/// Only the first occurrence of a tag is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IeIndex {
    ranges: [Option<ByteRange>; IeTag::COUNT],
    /// Set when the scan stopped on an IE running past the end of the payload
    truncated: bool,
}

impl IeIndex {
    pub fn scan(payload: &[u8]) -> Self {
        let mut index = IeIndex::default();
        let mut pos = 0;

        while pos < payload.len() {
            let raw = payload[pos];

            if raw & 0x80 != 0 {
                // Single-octet IE, no length byte
                if let Ok(tag) = IeTag::try_from(raw as u64) {
                    index.record(tag, pos + 1..pos + 1);
                }
                pos += 1;
                continue;
            }

            let Some(&len) = payload.get(pos + 1) else {
                tracing::warn!("IE 0x{:02x} at {} has no length octet", raw, pos);
                index.truncated = true;
                break;
            };
            let start = pos + 2;
            let end = start + len as usize;
            if end > payload.len() {
                tracing::warn!(
                    "IE 0x{:02x} at {} declares {} bytes, only {} left",
                    raw,
                    pos,
                    len,
                    payload.len() - start
                );
                index.truncated = true;
                break;
            }

            match IeTag::try_from(raw as u64) {
                Ok(tag) => index.record(tag, start..end),
                Err(_) => tracing::trace!("skipping unknown IE 0x{:02x} ({} bytes)", raw, len),
            }
            pos = end;
        }
        index
    }

    fn record(&mut self, tag: IeTag, range: ByteRange) {
        let slot = &mut self.ranges[tag.index()];
        if slot.is_none() {
            *slot = Some(range);
        } else {
            tracing::debug!("repeated IE {}, keeping first", tag);
        }
    }

    pub fn get(&self, tag: IeTag) -> Option<ByteRange> {
        self.ranges[tag.index()].clone()
    }

    pub fn contains(&self, tag: IeTag) -> bool {
        self.ranges[tag.index()].is_some()
    }

    /// Body of `tag` inside `payload`, the same payload the index was built from
    pub fn body<'a>(&self, tag: IeTag, payload: &'a [u8]) -> Option<&'a [u8]> {
        let range = self.get(tag)?;
        payload.get(range)
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn count(&self) -> usize {
        self.ranges.iter().filter(|r| r.is_some()).count()
    }
}

impl fmt::Display for IeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IeIndex {{")?;
        for tag in IeTag::ALL {
            if let Some(r) = &self.ranges[tag.index()] {
                write!(f, " {}@{}+{}", tag, r.start, r.len())?;
            }
        }
        if self.truncated {
            write!(f, " TRUNCATED")?;
        }
        write!(f, " }}")
    }
}
