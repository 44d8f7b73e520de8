use core::fmt;

use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, MAX_BCHANS, PduParseErr, RESERVED_CHANNEL, TrunkType, expect_min_len};

use super::{IeCtx, InfoElement};
use crate::enums::ie_tag::IeTag;

/// Channel identification (Q.931 4.5.13). `channel` is 0 for none, `CHANNEL_ANY` for any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId {
    pub exclusive: bool,
    pub channel: u8,
}

impl ChannelId {
    pub fn new(exclusive: bool, channel: u8) -> Self {
        Self { exclusive, channel }
    }

    fn check_range(&self, trunk: TrunkType) -> Result<(), PduParseErr> {
        let ch = self.channel;
        let bad = match trunk {
            TrunkType::Bri => ch > 2 && ch != CHANNEL_ANY,
            TrunkType::Pri => (ch > MAX_BCHANS && ch != CHANNEL_ANY) || ch == RESERVED_CHANNEL,
        };
        if bad {
            return Err(PduParseErr::InvalidValue { field: "channel", value: ch as u64 });
        }
        Ok(())
    }
}

impl InfoElement for ChannelId {
    const TAG: IeTag = IeTag::ChannelId;

    fn from_body(body: &[u8], ctx: &IeCtx) -> Result<Self, PduParseErr> {
        expect_min_len!(body, 1, "channel_id")?;
        let b0 = body[0];

        if b0 & 0x40 != 0 {
            return Err(PduParseErr::Inconsistency { field: "channel_id", reason: "channel of another interface" });
        }
        if b0 & 0x04 != 0 {
            return Err(PduParseErr::Inconsistency { field: "channel_id", reason: "D-channel requested" });
        }
        let exclusive = b0 & 0x08 != 0;

        match ctx.trunk {
            TrunkType::Bri => {
                if b0 & 0x20 != 0 {
                    return Err(PduParseErr::Inconsistency { field: "channel_id", reason: "PRI format on BRI interface" });
                }
                let channel = match b0 & 0x03 {
                    3 => CHANNEL_ANY,
                    ch => ch,
                };
                Ok(ChannelId { exclusive, channel })
            }
            TrunkType::Pri => {
                if b0 & 0x20 == 0 {
                    return Err(PduParseErr::Inconsistency { field: "channel_id", reason: "BRI format on PRI interface" });
                }
                match b0 & 0x03 {
                    0x00 => return Ok(ChannelId { exclusive, channel: CHANNEL_NONE }),
                    0x03 => return Ok(ChannelId { exclusive, channel: CHANNEL_ANY }),
                    _ => {}
                }
                expect_min_len!(body, 3, "channel_id_pri")?;
                if body[1] & 0x10 != 0 {
                    return Err(PduParseErr::NotImplemented { field: Some("channel_map") });
                }
                let channel = body[2] & 0x7f;
                if channel < 1 || channel == RESERVED_CHANNEL || channel > MAX_BCHANS {
                    return Err(PduParseErr::InvalidValue { field: "channel", value: channel as u64 });
                }
                Ok(ChannelId { exclusive, channel })
            }
        }
    }

    fn to_body(&self, out: &mut Vec<u8>, ctx: &IeCtx) -> Result<(), PduParseErr> {
        self.check_range(ctx.trunk)?;
        let excl = (self.exclusive as u8) << 3;

        match ctx.trunk {
            TrunkType::Bri => {
                let ch = if self.channel == CHANNEL_ANY { 3 } else { self.channel };
                out.push(0x80 | excl | ch);
            }
            TrunkType::Pri => match self.channel {
                // No channel: IE not sent at all
                CHANNEL_NONE => {}
                CHANNEL_ANY => out.push(0x80 | 0x20 | 0x03),
                ch => {
                    out.push(0x80 | 0x20 | excl | 0x01);
                    // CCITT coding, channel number, B-channel units
                    out.push(0x80 | 0x03);
                    out.push(0x80 | ch);
                }
            },
        }
        Ok(())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            CHANNEL_ANY => write!(f, "ChannelId {{ any exclusive: {} }}", self.exclusive),
            ch => write!(f, "ChannelId {{ channel: {} exclusive: {} }}", ch, self.exclusive),
        }
    }
}
