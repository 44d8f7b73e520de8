//! Supplementary-service payloads carried in the facility IE.
//!
//! Two mutually exclusive encodings exist and are told apart by the first octet
//! of the IE body: the ASN.1 INVOKE form starts with the supplementary service
//! protocol profile, the legacy template form with its own discriminator followed
//! by a vendor byte. Which one is sent is a per-port setting.

use core::fmt;

use isdn_config::FacilityStrategy;
use isdn_core::PduParseErr;

pub mod fac_asn1;
pub mod fac_legacy;

/// Longest deflection target number
pub const DEFLECT_NUMBER_MAX: usize = 31;
/// Longest centrex name
pub const CENTREX_NAME_MAX: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallDeflect {
    pub number: String,
    pub presentation_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Centrex {
    /// Calling (CNIP) or connected (CONP) name
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Facility {
    #[default]
    None,
    CallDeflect(CallDeflect),
    Centrex(Centrex),
}

impl Facility {
    pub fn is_none(&self) -> bool {
        matches!(self, Facility::None)
    }

    pub fn is_call_deflect(&self) -> bool {
        matches!(self, Facility::CallDeflect(_))
    }

    pub fn call_deflect(number: &str, presentation_allowed: bool) -> Self {
        Facility::CallDeflect(CallDeflect {
            number: number.to_string(),
            presentation_allowed,
        })
    }

    pub fn centrex(name: &str) -> Self {
        Facility::Centrex(Centrex { name: name.to_string() })
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facility::None => write!(f, "none"),
            Facility::CallDeflect(cd) => write!(f, "CallDeflect {{ '{}' pres: {} }}", cd.number, cd.presentation_allowed),
            Facility::Centrex(c) => write!(f, "Centrex {{ '{}' }}", c.name),
        }
    }
}

/// Encodes `fac` as a facility IE body. `Facility::None` yields an empty body.
pub fn encode(fac: &Facility, strategy: FacilityStrategy, invoke_id: i32) -> Result<Vec<u8>, PduParseErr> {
    if fac.is_none() {
        return Ok(Vec::new());
    }
    match strategy {
        FacilityStrategy::Asn1 => fac_asn1::encode(fac, invoke_id),
        FacilityStrategy::Legacy => fac_legacy::encode(fac),
    }
}

/// Decodes a facility IE body of either form. Payloads of an unknown form or with an
/// unsupported operation yield `Facility::None`.
pub fn decode(body: &[u8]) -> Result<Facility, PduParseErr> {
    match body.first() {
        Some(&fac_asn1::SUPPLEMENTARY_SERVICE) => fac_asn1::decode(body),
        Some(&fac_legacy::LEGACY_DISCRIMINATOR) => fac_legacy::decode(body),
        Some(b) => {
            tracing::debug!("facility with unknown discriminator 0x{:02x} ignored", b);
            Ok(Facility::None)
        }
        None => Err(PduParseErr::TooShort { field: "facility", min: 1, found: 0 }),
    }
}
