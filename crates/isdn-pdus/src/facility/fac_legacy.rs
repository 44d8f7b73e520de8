//! Fixed template form used by older switches: discriminator, vendor byte, then
//! a flat run of `{tag, length, value}` sub-elements.

use isdn_core::bytecursor::{clamped_text, truncate_chars};
use isdn_core::{ByteCursor, PduParseErr, expect_tag};

use super::{CENTREX_NAME_MAX, CallDeflect, Centrex, DEFLECT_NUMBER_MAX, Facility};
use crate::ies::latin1_bytes;

pub const LEGACY_DISCRIMINATOR: u8 = 0x88;
pub const LEGACY_VENDOR_ID: u8 = 0x0a;

const SUB_CNIP: u8 = 0x80;
const SUB_CONP: u8 = 0x81;
const SUB_DEFLECT_NUMBER: u8 = 0x82;
const SUB_PRESENTATION: u8 = 0x83;

/// Size of the staging area the template is assembled in
pub const STAGING_CAPACITY: usize = 256;

/// Fixed-size buffer that refuses to grow past its capacity
struct Staging {
    buf: [u8; STAGING_CAPACITY],
    len: usize,
}

impl Staging {
    fn new() -> Self {
        Self {
            buf: [0; STAGING_CAPACITY],
            len: 0,
        }
    }

    fn push(&mut self, bytes: &[u8]) -> Result<(), PduParseErr> {
        let end = self.len + bytes.len();
        if end > STAGING_CAPACITY {
            return Err(PduParseErr::BufferFull { field: "legacy_facility", capacity: STAGING_CAPACITY });
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    fn sub_element(&mut self, tag: u8, value: &[u8]) -> Result<(), PduParseErr> {
        self.push(&[tag, value.len() as u8])?;
        self.push(value)
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

pub fn encode(fac: &Facility) -> Result<Vec<u8>, PduParseErr> {
    let mut st = Staging::new();
    st.push(&[LEGACY_DISCRIMINATOR, LEGACY_VENDOR_ID])?;

    match fac {
        Facility::Centrex(c) => {
            // One octet per character, so the cut keeps the name within bounds
            let name = latin1_bytes(truncate_chars(&c.name, CENTREX_NAME_MAX));
            st.sub_element(SUB_CNIP, &name)?;
        }
        Facility::CallDeflect(cd) => {
            let number = latin1_bytes(truncate_chars(&cd.number, DEFLECT_NUMBER_MAX));
            st.sub_element(SUB_DEFLECT_NUMBER, &number)?;
            st.sub_element(SUB_PRESENTATION, &[cd.presentation_allowed as u8])?;
        }
        Facility::None => return Ok(Vec::new()),
    }
    Ok(st.as_slice().to_vec())
}

pub fn decode(body: &[u8]) -> Result<Facility, PduParseErr> {
    let mut cur = ByteCursor::new(body);
    let disc = cur.read_u8("legacy_discriminator")?;
    expect_tag!(disc, LEGACY_DISCRIMINATOR)?;
    let vendor = cur.read_u8("legacy_vendor")?;
    if vendor != LEGACY_VENDOR_ID {
        tracing::debug!("legacy facility from vendor 0x{:02x}", vendor);
    }

    let mut name = None;
    let mut number = None;
    let mut presentation_allowed = false;

    while !cur.is_empty() {
        let tag = cur.read_u8("legacy_tag")?;
        let len = cur.read_u8("legacy_len")? as usize;
        // read_slice refuses a length running past the IE end
        let value = cur.read_slice(len, "legacy_value")?;
        match tag {
            SUB_CNIP | SUB_CONP => name = Some(clamped_text(value, CENTREX_NAME_MAX + 1)),
            SUB_DEFLECT_NUMBER => number = Some(clamped_text(value, DEFLECT_NUMBER_MAX + 1)),
            SUB_PRESENTATION => presentation_allowed = value.first().is_some_and(|v| *v != 0),
            _ => tracing::debug!("legacy facility sub-element 0x{:02x} ignored", tag),
        }
    }

    if let Some(number) = number {
        return Ok(Facility::CallDeflect(CallDeflect { number, presentation_allowed }));
    }
    if let Some(name) = name {
        return Ok(Facility::Centrex(Centrex { name }));
    }
    Ok(Facility::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::debug;

    #[test]
    fn test_centrex_template() {
        debug::setup_logging_verbose();
        let body = encode(&Facility::centrex("Reception")).unwrap();
        let mut expected = vec![0x88, 0x0a, 0x80, 9];
        expected.extend_from_slice(b"Reception");
        assert_eq!(body, expected);
    }

    #[test]
    fn test_longest_inputs_fit_staging() {
        debug::setup_logging_verbose();
        let name = "N".repeat(200);
        let body = encode(&Facility::centrex(&name)).unwrap();
        assert_eq!(body.len(), 4 + CENTREX_NAME_MAX);
        assert_eq!(decode(&body).unwrap(), Facility::centrex(&name[..CENTREX_NAME_MAX]));

        let number = "9".repeat(500);
        let body = encode(&Facility::call_deflect(&number, true)).unwrap();
        assert!(body.len() <= STAGING_CAPACITY);
        assert_eq!(decode(&body).unwrap(), Facility::call_deflect(&number[..DEFLECT_NUMBER_MAX], true));
    }

    #[test]
    fn test_latin1_name_round_trip() {
        debug::setup_logging_verbose();
        let body = encode(&Facility::centrex("Müller")).unwrap();
        assert_eq!(body, vec![0x88, 0x0a, 0x80, 0x06, b'M', 0xfc, b'l', b'l', b'e', b'r']);
        assert_eq!(decode(&body).unwrap(), Facility::centrex("Müller"));

        let long = "Ärztehaus Süd Größe";
        let body = encode(&Facility::centrex(long)).unwrap();
        assert_eq!(body.len(), 4 + CENTREX_NAME_MAX);
        let expected: String = long.chars().take(CENTREX_NAME_MAX).collect();
        assert_eq!(decode(&body).unwrap(), Facility::centrex(&expected));
    }

    #[test]
    fn test_sub_element_overrun_rejected() {
        debug::setup_logging_verbose();
        assert!(decode(&[0x88, 0x0a, 0x80, 0x10, b'a', b'b']).is_err());
        assert!(decode(&[0x88, 0x0a, 0x80]).is_err());
        assert!(decode(&[0x88]).is_err());
        assert_eq!(decode(&[0x88, 0x0a, 0x99, 0x01, 0x00]).unwrap(), Facility::None);
        assert_eq!(decode(&[0x88, 0x0a, 0x81, 0x02, b'H', b'Q']).unwrap(), Facility::centrex("HQ"));
    }

    #[test]
    fn test_staging_refuses_overflow() {
        let mut st = Staging::new();
        assert!(st.push(&[0u8; STAGING_CAPACITY]).is_ok());
        assert!(st.push(&[0]).is_err());
        assert_eq!(st.as_slice().len(), STAGING_CAPACITY);
    }
}
