//! IEs kept as opaque bodies: the facility payload (interpreted by `crate::facility`)
//! and the compatibility blobs copied verbatim between call legs.

use core::fmt;

use isdn_core::PduParseErr;

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

macro_rules! raw_ie {
    ($name:ident, $tag:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name(pub Vec<u8>);

        impl InfoElement for $name {
            const TAG: IeTag = $tag;

            fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
                Ok($name(body.to_vec()))
            }

            fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
                out.extend_from_slice(&self.0);
                Ok(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:02x?})", stringify!($name), self.0)
            }
        }
    };
}

raw_ie!(FacilityIe, IeTag::Facility);
raw_ie!(RawBearer, IeTag::BearerCapability);
raw_ie!(LowLayerCompat, IeTag::LowLayerCompat);
raw_ie!(HighLayerCompat, IeTag::HighLayerCompat);
