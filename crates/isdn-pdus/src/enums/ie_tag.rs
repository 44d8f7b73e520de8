/// Q.931 information element identifiers (codeset 0)
/// Variable-length IEs have bit 8 clear, single-octet IEs have it set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IeTag {
    BearerCapability = 0x04,
    Cause = 0x08,
    CallIdentity = 0x10,
    ChannelId = 0x18,
    Facility = 0x1c,
    Progress = 0x1e,
    Notify = 0x27,
    Display = 0x28,
    Date = 0x29,
    Keypad = 0x2c,
    ConnectedNumber = 0x4c,
    CallingNumber = 0x6c,
    CalledNumber = 0x70,
    RedirectingNumber = 0x74,
    RedirectionNumber = 0x76,
    LowLayerCompat = 0x7c,
    HighLayerCompat = 0x7d,
    UserUser = 0x7e,
    SendingComplete = 0xa1,
}

impl IeTag {
    /// Every tag the decoder indexes, in table order
    pub const ALL: [IeTag; 19] = [
        IeTag::BearerCapability,
        IeTag::Cause,
        IeTag::CallIdentity,
        IeTag::ChannelId,
        IeTag::Facility,
        IeTag::Progress,
        IeTag::Notify,
        IeTag::Display,
        IeTag::Date,
        IeTag::Keypad,
        IeTag::ConnectedNumber,
        IeTag::CallingNumber,
        IeTag::CalledNumber,
        IeTag::RedirectingNumber,
        IeTag::RedirectionNumber,
        IeTag::LowLayerCompat,
        IeTag::HighLayerCompat,
        IeTag::UserUser,
        IeTag::SendingComplete,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`IeTag::ALL`]
    pub fn index(self) -> usize {
        match self {
            IeTag::BearerCapability => 0,
            IeTag::Cause => 1,
            IeTag::CallIdentity => 2,
            IeTag::ChannelId => 3,
            IeTag::Facility => 4,
            IeTag::Progress => 5,
            IeTag::Notify => 6,
            IeTag::Display => 7,
            IeTag::Date => 8,
            IeTag::Keypad => 9,
            IeTag::ConnectedNumber => 10,
            IeTag::CallingNumber => 11,
            IeTag::CalledNumber => 12,
            IeTag::RedirectingNumber => 13,
            IeTag::RedirectionNumber => 14,
            IeTag::LowLayerCompat => 15,
            IeTag::HighLayerCompat => 16,
            IeTag::UserUser => 17,
            IeTag::SendingComplete => 18,
        }
    }

    pub fn is_single_octet(self) -> bool {
        self.into_raw() & 0x80 != 0
    }
}

impl std::convert::TryFrom<u64> for IeTag {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0x04 => Ok(IeTag::BearerCapability),
            0x08 => Ok(IeTag::Cause),
            0x10 => Ok(IeTag::CallIdentity),
            0x18 => Ok(IeTag::ChannelId),
            0x1c => Ok(IeTag::Facility),
            0x1e => Ok(IeTag::Progress),
            0x27 => Ok(IeTag::Notify),
            0x28 => Ok(IeTag::Display),
            0x29 => Ok(IeTag::Date),
            0x2c => Ok(IeTag::Keypad),
            0x4c => Ok(IeTag::ConnectedNumber),
            0x6c => Ok(IeTag::CallingNumber),
            0x70 => Ok(IeTag::CalledNumber),
            0x74 => Ok(IeTag::RedirectingNumber),
            0x76 => Ok(IeTag::RedirectionNumber),
            0x7c => Ok(IeTag::LowLayerCompat),
            0x7d => Ok(IeTag::HighLayerCompat),
            0x7e => Ok(IeTag::UserUser),
            0xa1 => Ok(IeTag::SendingComplete),
            _ => Err(()),
        }
    }
}

impl IeTag {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u8 as u64
    }
}

impl From<IeTag> for u64 {
    fn from(e: IeTag) -> Self {
        e.into_raw()
    }
}

impl core::fmt::Display for IeTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IeTag::BearerCapability => write!(f, "BEARER"),
            IeTag::Cause => write!(f, "CAUSE"),
            IeTag::CallIdentity => write!(f, "CALL_ID"),
            IeTag::ChannelId => write!(f, "CHANNEL_ID"),
            IeTag::Facility => write!(f, "FACILITY"),
            IeTag::Progress => write!(f, "PROGRESS"),
            IeTag::Notify => write!(f, "NOTIFY"),
            IeTag::Display => write!(f, "DISPLAY"),
            IeTag::Date => write!(f, "DATE"),
            IeTag::Keypad => write!(f, "KEYPAD"),
            IeTag::ConnectedNumber => write!(f, "CONNECTED_PN"),
            IeTag::CallingNumber => write!(f, "CALLING_PN"),
            IeTag::CalledNumber => write!(f, "CALLED_PN"),
            IeTag::RedirectingNumber => write!(f, "REDIR_NR"),
            IeTag::RedirectionNumber => write!(f, "REDIR_DN"),
            IeTag::LowLayerCompat => write!(f, "LLC"),
            IeTag::HighLayerCompat => write!(f, "HLC"),
            IeTag::UserUser => write!(f, "USER_USER"),
            IeTag::SendingComplete => write!(f, "COMPLETE"),
        }
    }
}
