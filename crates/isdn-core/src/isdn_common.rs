use core::fmt;
use serde::Deserialize;

/// Highest B-channel number any trunk can carry (E1 timeslot 31)
pub const MAX_BCHANS: u8 = 31;

/// Timeslot 16 carries signalling on a primary rate trunk and is never handed out
pub const RESERVED_CHANNEL: u8 = 16;

/// Channel value meaning "no channel assigned yet"
pub const CHANNEL_NONE: u8 = 0;

/// Channel value meaning "any channel", as carried in the channel-id IE
pub const CHANNEL_ANY: u8 = 0xff;

/// Protocol role of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Role {
    /// Network termination, we are the network side
    Nt,
    /// Terminal equipment, we are the user side
    Te,
}

impl Role {
    pub fn is_nt(self) -> bool {
        self == Role::Nt
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Nt => write!(f, "NT"),
            Role::Te => write!(f, "TE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TrunkType {
    /// Basic rate, 2 B-channels
    Bri,
    /// Primary rate, 30 B-channels on timeslots 1..31
    Pri,
}

impl TrunkType {
    /// Size of the channel bitmap for this trunk
    pub fn b_num(self) -> u8 {
        match self {
            TrunkType::Bri => 2,
            TrunkType::Pri => MAX_BCHANS,
        }
    }

    /// Number of usable B-channels
    pub fn max_channels(self) -> u8 {
        match self {
            TrunkType::Bri => 2,
            TrunkType::Pri => MAX_BCHANS - 1,
        }
    }

    pub fn is_pri(self) -> bool {
        self == TrunkType::Pri
    }
}

impl fmt::Display for TrunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrunkType::Bri => write!(f, "BRI"),
            TrunkType::Pri => write!(f, "PRI"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    PointToPoint,
    PointToMultipoint,
}

impl Topology {
    pub fn from_ptp(ptp: bool) -> Self {
        if ptp { Topology::PointToPoint } else { Topology::PointToMultipoint }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::PointToPoint => write!(f, "PTP"),
            Topology::PointToMultipoint => write!(f, "PTMP"),
        }
    }
}

/// Direction of a call attempt as seen from this stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallDirection {
    #[default]
    Incoming,
    Outgoing,
}
