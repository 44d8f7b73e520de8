use core::fmt;

use isdn_core::PduParseErr;

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

pub const CALL_ID_MAX: usize = 8;

/// Call identity, used by SUSPEND and RESUME
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallIdentity(pub Vec<u8>);

impl InfoElement for CallIdentity {
    const TAG: IeTag = IeTag::CallIdentity;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        if body.len() > CALL_ID_MAX {
            return Err(PduParseErr::BufferFull { field: "call_id", capacity: CALL_ID_MAX });
        }
        Ok(CallIdentity(body.to_vec()))
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        if self.0.len() > CALL_ID_MAX {
            return Err(PduParseErr::BufferFull { field: "call_id", capacity: CALL_ID_MAX });
        }
        out.extend_from_slice(&self.0);
        Ok(())
    }
}

impl fmt::Display for CallIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallIdentity({:02x?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{TrunkType, debug};

    #[test]
    fn test_call_id_limit() {
        debug::setup_logging_verbose();
        let ctx = IeCtx::new(TrunkType::Bri);
        assert_eq!(CallIdentity::from_body(&[1, 2, 3], &ctx).unwrap(), CallIdentity(vec![1, 2, 3]));
        assert!(CallIdentity::from_body(&[0; 9], &ctx).is_err());
        assert!(CallIdentity(vec![0; 9]).to_body(&mut Vec::new(), &ctx).is_err());
    }
}
