//! BER-style primitive codec used inside facility IEs.
//!
//! Encoding goes through [`Asn1Builder`], which appends to a growable buffer and
//! computes constructed lengths when the nested closure returns. Decoding works on
//! plain slices: the slice end is the exclusive bound, and every decoder returns
//! the value together with the number of bytes consumed.

use crate::bytecursor::ByteCursor;
use crate::{PduParseErr, expect_tag};

pub const TAG_BOOLEAN: u8 = 0x01;
pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_ENUM: u8 = 0x0a;
pub const TAG_NUMERIC_STRING: u8 = 0x12;
pub const TAG_SEQUENCE: u8 = 0x30;

pub const TAG_CONSTRUCTOR: u8 = 0x20;
pub const TAG_CONTEXT_SPECIFIC: u8 = 0x80;

/// Appends a definite length. Short form below 128, long form up to 0xffff.
fn put_len(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
}

/// Minimal two's complement big-endian representation
fn int_octets(value: i32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 3 {
        let cur = bytes[start];
        let next_msb = bytes[start + 1] & 0x80;
        if (cur == 0x00 && next_msb == 0) || (cur == 0xff && next_msb != 0) {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

pub fn enc_null(out: &mut Vec<u8>, tag: u8) -> usize {
    out.push(tag);
    out.push(0);
    2
}

pub fn enc_bool(out: &mut Vec<u8>, tag: u8, value: bool) -> usize {
    out.push(tag);
    out.push(1);
    out.push(if value { 0xff } else { 0x00 });
    3
}

pub fn enc_int(out: &mut Vec<u8>, tag: u8, value: i32) -> usize {
    let octets = int_octets(value);
    let start = out.len();
    out.push(tag);
    put_len(out, octets.len());
    out.extend_from_slice(&octets);
    out.len() - start
}

pub fn enc_enum(out: &mut Vec<u8>, tag: u8, value: i32) -> usize {
    enc_int(out, tag, value)
}

pub fn enc_num_string(out: &mut Vec<u8>, tag: u8, digits: &[u8]) -> usize {
    enc_octet_string(out, tag, digits)
}

pub fn enc_octet_string(out: &mut Vec<u8>, tag: u8, data: &[u8]) -> usize {
    let start = out.len();
    out.push(tag);
    put_len(out, data.len());
    out.extend_from_slice(data);
    out.len() - start
}

/// Reads a definite length from the cursor
fn read_len(cur: &mut ByteCursor) -> Result<usize, PduParseErr> {
    let first = cur.read_u8("asn1_len")?;
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }
    match first & 0x7f {
        0 => Err(PduParseErr::NotImplemented { field: Some("asn1 indefinite length") }),
        1 => Ok(cur.read_u8("asn1_len")? as usize),
        2 => {
            let hi = cur.read_u8("asn1_len")? as usize;
            let lo = cur.read_u8("asn1_len")? as usize;
            Ok((hi << 8) | lo)
        }
        n => Err(PduParseErr::InvalidValue { field: "asn1_len_octets", value: n as u64 }),
    }
}

/// Decodes a tag/length header. Returns (tag, content length, header length).
/// Fails when the declared content would run past the end of `buf`.
pub fn dec_header(buf: &[u8]) -> Result<(u8, usize, usize), PduParseErr> {
    let mut cur = ByteCursor::new(buf);
    let tag = cur.read_u8("asn1_tag")?;
    let len = read_len(&mut cur)?;
    let hdr = cur.get_pos();
    if len > cur.get_len_remaining() {
        return Err(PduParseErr::InconsistentLength {
            expected: len,
            found: cur.get_len_remaining(),
        });
    }
    Ok((tag, len, hdr))
}

/// Decodes a length octet sequence on its own. Returns (length, octets consumed).
pub fn dec_len(buf: &[u8]) -> Result<(usize, usize), PduParseErr> {
    let mut cur = ByteCursor::new(buf);
    let len = read_len(&mut cur)?;
    Ok((len, cur.get_pos()))
}

/// Splits off the element at the front of `buf`: (tag, content, bytes consumed)
pub fn dec_element(buf: &[u8]) -> Result<(u8, &[u8], usize), PduParseErr> {
    let (tag, len, hdr) = dec_header(buf)?;
    Ok((tag, &buf[hdr..hdr + len], hdr + len))
}

pub fn dec_null(buf: &[u8]) -> Result<usize, PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_NULL)?;
    if !content.is_empty() {
        return Err(PduParseErr::InvalidValue { field: "null_len", value: content.len() as u64 });
    }
    Ok(used)
}

pub fn dec_bool(buf: &[u8]) -> Result<(bool, usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_BOOLEAN)?;
    match content {
        [v] => Ok((*v != 0, used)),
        _ => Err(PduParseErr::InvalidValue { field: "bool_len", value: content.len() as u64 }),
    }
}

/// Integer content of any tag, used for both INTEGER and context-tagged integers
pub fn dec_int_content(content: &[u8]) -> Result<i32, PduParseErr> {
    if content.is_empty() || content.len() > 4 {
        return Err(PduParseErr::InvalidValue { field: "int_len", value: content.len() as u64 });
    }
    let mut value: i32 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for b in content {
        value = (value << 8) | *b as i32;
    }
    Ok(value)
}

pub fn dec_int(buf: &[u8]) -> Result<(i32, usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_INTEGER)?;
    Ok((dec_int_content(content)?, used))
}

pub fn dec_enum(buf: &[u8]) -> Result<(i32, usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_ENUM)?;
    Ok((dec_int_content(content)?, used))
}

/// Numeric string with any tag (universal or context-specific). Copied into a string.
pub fn dec_num_string(buf: &[u8]) -> Result<(u8, String, usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    Ok((tag, content.iter().map(|&b| b as char).collect(), used))
}

pub fn dec_octet_string(buf: &[u8]) -> Result<(Vec<u8>, usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_OCTET_STRING)?;
    Ok((content.to_vec(), used))
}

/// Opens a SEQUENCE: returns its content slice and the bytes consumed by the whole element
pub fn dec_sequence(buf: &[u8]) -> Result<(&[u8], usize), PduParseErr> {
    let (tag, content, used) = dec_element(buf)?;
    expect_tag!(tag, TAG_SEQUENCE)?;
    Ok((content, used))
}

/// Growable ASN.1 writer. Constructed elements are built through closures; their
/// length prefix is computed after the content is known.
#[derive(Debug, Default)]
pub struct Asn1Builder {
    buf: Vec<u8>,
}

impl Asn1Builder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn null(&mut self, tag: u8) -> &mut Self {
        enc_null(&mut self.buf, tag);
        self
    }

    pub fn boolean(&mut self, tag: u8, value: bool) -> &mut Self {
        enc_bool(&mut self.buf, tag, value);
        self
    }

    pub fn int(&mut self, tag: u8, value: i32) -> &mut Self {
        enc_int(&mut self.buf, tag, value);
        self
    }

    pub fn enumerated(&mut self, value: i32) -> &mut Self {
        enc_enum(&mut self.buf, TAG_ENUM, value);
        self
    }

    pub fn num_string(&mut self, tag: u8, digits: &[u8]) -> &mut Self {
        enc_num_string(&mut self.buf, tag, digits);
        self
    }

    pub fn octet_string(&mut self, tag: u8, data: &[u8]) -> &mut Self {
        enc_octet_string(&mut self.buf, tag, data);
        self
    }

    /// Appends raw bytes without any framing
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Constructed element with the given tag; `f` writes its content
    pub fn constructed<F>(&mut self, tag: u8, f: F) -> &mut Self
    where
        F: FnOnce(&mut Asn1Builder),
    {
        let mut inner = Asn1Builder::new();
        f(&mut inner);
        let content = inner.finish();
        self.buf.push(tag);
        put_len(&mut self.buf, content.len());
        self.buf.extend_from_slice(&content);
        self
    }

    pub fn sequence<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Asn1Builder),
    {
        self.constructed(TAG_SEQUENCE, f)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug;

    #[test]
    fn test_int_encoding_minimal() {
        debug::setup_logging_verbose();
        let mut out = Vec::new();
        enc_int(&mut out, TAG_INTEGER, 0x0d);
        assert_eq!(out, vec![0x02, 0x01, 0x0d]);

        let mut out = Vec::new();
        enc_int(&mut out, TAG_INTEGER, 128);
        assert_eq!(out, vec![0x02, 0x02, 0x00, 0x80]);

        let mut out = Vec::new();
        enc_int(&mut out, TAG_INTEGER, -1);
        assert_eq!(out, vec![0x02, 0x01, 0xff]);

        for v in [0, 1, 127, 128, 255, 256, 0x1234, -129, -70000, i32::MAX, i32::MIN] {
            let mut out = Vec::new();
            let n = enc_int(&mut out, TAG_INTEGER, v);
            assert_eq!(dec_int(&out).unwrap(), (v, n));
        }
    }

    #[test]
    fn test_builder_sequence() {
        debug::setup_logging_verbose();
        let mut b = Asn1Builder::new();
        b.sequence(|s| {
            s.sequence(|s2| {
                s2.num_string(TAG_CONTEXT_SPECIFIC, b"123");
            });
            s.boolean(TAG_BOOLEAN, true);
        });
        let bytes = b.finish();
        assert_eq!(bytes, vec![0x30, 0x0a, 0x30, 0x05, 0x80, 0x03, b'1', b'2', b'3', 0x01, 0x01, 0xff]);

        let (content, used) = dec_sequence(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        let (inner, inner_used) = dec_sequence(content).unwrap();
        let (tag, digits, _) = dec_num_string(inner).unwrap();
        assert_eq!(tag, TAG_CONTEXT_SPECIFIC);
        assert_eq!(digits, "123");
        assert_eq!(dec_bool(&content[inner_used..]).unwrap(), (true, 3));
    }

    #[test]
    fn test_long_form_length() {
        let data = vec![0x31u8; 200];
        let mut out = Vec::new();
        enc_octet_string(&mut out, TAG_OCTET_STRING, &data);
        assert_eq!(&out[..3], &[TAG_OCTET_STRING, 0x81, 200]);
        assert_eq!(dec_octet_string(&out).unwrap(), (data, 203));
    }

    #[test]
    fn test_truncated_inputs_never_panic() {
        debug::setup_logging_verbose();
        let mut b = Asn1Builder::new();
        b.int(TAG_INTEGER, 0x1234)
            .null(TAG_NULL)
            .boolean(TAG_BOOLEAN, false)
            .enumerated(3)
            .sequence(|s| {
                s.num_string(TAG_NUMERIC_STRING, b"5551234");
            });
        let full = b.finish();

        // Every strict prefix of every element start must fail cleanly
        for start in 0..full.len() {
            for end in start..full.len() {
                let slice = &full[start..end];
                let _ = dec_int(slice);
                let _ = dec_null(slice);
                let _ = dec_bool(slice);
                let _ = dec_enum(slice);
                let _ = dec_num_string(slice);
                let _ = dec_sequence(slice);
            }
        }
        assert!(dec_int(&full[..3]).is_err());
        assert!(dec_sequence(&full[full.len() - 4..]).is_err());
    }

    #[test]
    fn test_length_inflated() {
        // Declared length 0x40 but only 2 content bytes follow
        let bad = [TAG_INTEGER, 0x40, 0x01, 0x02];
        assert_eq!(dec_int(&bad), Err(PduParseErr::InconsistentLength { expected: 0x40, found: 2 }));
        // Long form length octets missing
        assert!(dec_header(&[TAG_SEQUENCE, 0x82, 0x01]).is_err());
        // Empty input
        assert_eq!(dec_null(&[]), Err(PduParseErr::BufferEnded { field: Some("asn1_tag") }));
        // Indefinite form is refused
        assert!(matches!(dec_header(&[TAG_SEQUENCE, 0x80]), Err(PduParseErr::NotImplemented { .. })));
    }

    #[test]
    fn test_wrong_tag() {
        let mut out = Vec::new();
        enc_bool(&mut out, TAG_BOOLEAN, true);
        assert_eq!(dec_int(&out), Err(PduParseErr::InvalidTag { expected: TAG_INTEGER as u64, found: TAG_BOOLEAN as u64 }));
    }
}
