use core::fmt;

use isdn_core::{PduParseErr, expect_min_len, expect_range};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Decoded user data is clipped to this many bytes
pub const USER_USER_MAX: usize = 128;

/// User-user information: protocol discriminator followed by opaque data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserUser {
    pub protocol: u8,
    pub data: Vec<u8>,
}

impl InfoElement for UserUser {
    const TAG: IeTag = IeTag::UserUser;

    fn from_body(body: &[u8], _ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, "useruser")?;
        let data = &body[1..];
        if data.len() > USER_USER_MAX {
            tracing::warn!("user-user data of {} bytes clipped to {}", data.len(), USER_USER_MAX);
        }
        Ok(UserUser {
            protocol: body[0] & 0x7f,
            data: data[..data.len().min(USER_USER_MAX)].to_vec(),
        })
    }

    fn to_body(&self, out: &mut Vec<u8>, _ctx: &IeCtx) -> Result<(), PduParseErr> {
        expect_range!(self.protocol, 0..=127, "useruser_protocol")?;
        if self.data.is_empty() {
            return Ok(());
        }
        // Length covers the protocol octet too
        out.push(0x80 | self.protocol);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

impl fmt::Display for UserUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserUser {{ protocol: {} data: {:02x?} }}", self.protocol, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ies::IeWriter;
    use isdn_core::{TrunkType, debug};

    #[test]
    fn test_length_includes_protocol() {
        debug::setup_logging_verbose();
        let uu = UserUser { protocol: 4, data: b"hello".to_vec() };
        let mut w = IeWriter::new(IeCtx::new(TrunkType::Bri));
        assert!(w.put(&uu));
        let out = w.finish();
        assert_eq!(&out[..3], &[0x7e, 6, 0x84]);
        assert_eq!(UserUser::from_body(&out[2..], &IeCtx::new(TrunkType::Bri)).unwrap(), uu);
    }

    #[test]
    fn test_clip_and_empty() {
        debug::setup_logging_verbose();
        let ctx = IeCtx::new(TrunkType::Bri);
        let mut body = vec![0x84];
        body.extend_from_slice(&[0xaa; 200]);
        assert_eq!(UserUser::from_body(&body, &ctx).unwrap().data.len(), USER_USER_MAX);
        assert!(UserUser::from_body(&[], &ctx).is_err());

        let mut out = Vec::new();
        UserUser { protocol: 0, data: Vec::new() }.to_body(&mut out, &ctx).unwrap();
        assert!(out.is_empty());
    }
}
