//! INVOKE components: `91 A1 len { invokeId INTEGER, operation INTEGER, argument }`

use isdn_core::asn1::{self, Asn1Builder, TAG_BOOLEAN, TAG_CONTEXT_SPECIFIC, TAG_INTEGER};
use isdn_core::bytecursor::truncate_chars;
use isdn_core::{PduParseErr, expect_tag};

use super::{CallDeflect, DEFLECT_NUMBER_MAX, Facility};

/// Protocol profile octet: networking extensions / supplementary services
pub const SUPPLEMENTARY_SERVICE: u8 = 0x91;
/// Context-specific constructed [1]: INVOKE component
pub const COMP_INVOKE: u8 = 0xa1;

pub const OP_CALL_DEFLECT: i32 = 0x0d;
pub const OP_AOC_S_CURRENCY: i32 = 0x21;
pub const OP_AOC_S_SPECIAL_ARR: i32 = 0x22;
pub const OP_AOC_D_CURRENCY: i32 = 0x23;
pub const OP_AOC_D_CHARGING_UNIT: i32 = 0x24;

pub fn encode(fac: &Facility, invoke_id: i32) -> Result<Vec<u8>, PduParseErr> {
    match fac {
        Facility::CallDeflect(cd) => Ok(encode_call_deflect(cd, invoke_id)),
        Facility::Centrex(_) => Err(PduParseErr::NotImplemented { field: Some("asn1_centrex") }),
        Facility::None => Ok(Vec::new()),
    }
}

fn encode_call_deflect(cd: &CallDeflect, invoke_id: i32) -> Vec<u8> {
    let number = truncate_chars(&cd.number, DEFLECT_NUMBER_MAX);
    let digits: Vec<u8> = number.bytes().collect();

    let mut b = Asn1Builder::new();
    b.raw(&[SUPPLEMENTARY_SERVICE]);
    b.constructed(COMP_INVOKE, |inv| {
        inv.int(TAG_INTEGER, invoke_id);
        inv.int(TAG_INTEGER, OP_CALL_DEFLECT);
        inv.sequence(|arg| {
            // deflectionAddress: Address ::= SEQUENCE { PartyNumber [0] NumericString }
            arg.sequence(|addr| {
                addr.num_string(TAG_CONTEXT_SPECIFIC, &digits);
            });
            arg.boolean(TAG_BOOLEAN, cd.presentation_allowed);
        });
    });
    b.finish()
}

pub fn decode(body: &[u8]) -> Result<Facility, PduParseErr> {
    let Some((&profile, rest)) = body.split_first() else {
        return Err(PduParseErr::TooShort { field: "facility", min: 1, found: 0 });
    };
    expect_tag!(profile, SUPPLEMENTARY_SERVICE)?;

    let (tag, comp, _) = asn1::dec_element(rest)?;
    expect_tag!(tag, COMP_INVOKE)?;

    let (invoke_id, used) = asn1::dec_int(comp)?;
    let comp = &comp[used..];

    let (op_tag, op_content, used) = asn1::dec_element(comp)?;
    expect_tag!(op_tag, TAG_INTEGER)?;
    if op_content.len() != 1 {
        return Err(PduParseErr::InvalidValue { field: "operation_len", value: op_content.len() as u64 });
    }
    let operation = op_content[0] as i32;
    let arg = &comp[used..];

    tracing::debug!("facility invoke id {} operation 0x{:02x}", invoke_id, operation);

    match operation {
        OP_CALL_DEFLECT => decode_call_deflect(arg).map(Facility::CallDeflect),
        OP_AOC_S_CURRENCY | OP_AOC_S_SPECIAL_ARR | OP_AOC_D_CURRENCY | OP_AOC_D_CHARGING_UNIT => {
            tracing::debug!("advice of charge operation 0x{:02x} not decoded", operation);
            Ok(Facility::None)
        }
        _ => {
            tracing::debug!("unknown facility operation 0x{:02x} ignored", operation);
            Ok(Facility::None)
        }
    }
}

fn decode_call_deflect(arg: &[u8]) -> Result<CallDeflect, PduParseErr> {
    let (seq, _) = asn1::dec_sequence(arg)?;
    let (addr, used) = asn1::dec_sequence(seq)?;
    let (tag, number, _) = asn1::dec_num_string(addr)?;
    expect_tag!(tag, TAG_CONTEXT_SPECIFIC)?;

    // presentationAllowedDivertedToUser is OPTIONAL; absent means restricted
    let after = &seq[used..];
    let presentation_allowed = if after.is_empty() { false } else { asn1::dec_bool(after)?.0 };

    Ok(CallDeflect {
        number: truncate_chars(&number, DEFLECT_NUMBER_MAX).to_string(),
        presentation_allowed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::debug;

    #[test]
    fn test_call_deflect_wire_bytes() {
        debug::setup_logging_verbose();
        let fac = Facility::call_deflect("123", true);
        let body = encode(&fac, 1).unwrap();
        assert_eq!(
            body,
            vec![
                0x91, 0xa1, 0x12, // profile, invoke, length
                0x02, 0x01, 0x01, // invoke id
                0x02, 0x01, 0x0d, // call deflection
                0x30, 0x0a, // argument
                0x30, 0x05, 0x80, 0x03, b'1', b'2', b'3', // deflection address
                0x01, 0x01, 0xff, // presentation allowed
            ]
        );
        assert_eq!(decode(&body).unwrap(), fac);
    }

    #[test]
    fn test_missing_presentation_reads_restricted() {
        debug::setup_logging_verbose();
        let body = [
            0x91, 0xa1, 0x0f, // profile, invoke, length
            0x02, 0x01, 0x01, // invoke id
            0x02, 0x01, 0x0d, // call deflection
            0x30, 0x07, 0x30, 0x05, 0x80, 0x03, b'1', b'2', b'3', // address only
        ];
        assert_eq!(decode(&body).unwrap(), Facility::call_deflect("123", false));

        // A present but malformed indicator is an error, not a default
        let bad = [
            0x91, 0xa1, 0x11, 0x02, 0x01, 0x01, 0x02, 0x01, 0x0d, 0x30, 0x09, 0x30, 0x05, 0x80, 0x03, b'1', b'2',
            b'3', 0x01, 0x05,
        ];
        assert!(decode(&bad).is_err());
    }

    #[test]
    fn test_aoc_and_unknown_ops_are_no_ops() {
        debug::setup_logging_verbose();
        let aoc = [0x91, 0xa1, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x22];
        assert_eq!(decode(&aoc).unwrap(), Facility::None);
        let unknown = [0x91, 0xa1, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x7f];
        assert_eq!(decode(&unknown).unwrap(), Facility::None);
    }

    #[test]
    fn test_operation_must_be_one_octet() {
        debug::setup_logging_verbose();
        let wide = [0x91, 0xa1, 0x07, 0x02, 0x01, 0x05, 0x02, 0x02, 0x00, 0x0d];
        assert!(decode(&wide).is_err());
        let tagged = [0x91, 0xa1, 0x06, 0x02, 0x01, 0x05, 0x0a, 0x01, 0x0d];
        assert!(decode(&tagged).is_err());
    }

    #[test]
    fn test_truncated_and_inflated_inputs() {
        debug::setup_logging_verbose();
        let body = encode(&Facility::call_deflect("98765", false), 9).unwrap();
        for cut in 0..body.len() {
            assert!(decode(&body[..cut]).is_err(), "prefix of {} bytes accepted", cut);
        }
        for pos in 1..body.len() {
            let mut inflated = body.clone();
            if inflated[pos] < 0x7f {
                inflated[pos] = 0x7e;
                // Must fail or decode, never read past the buffer
                let _ = decode(&inflated);
            }
        }
    }
}
