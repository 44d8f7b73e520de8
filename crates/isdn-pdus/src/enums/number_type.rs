/// Type of number, 3 bits of the first party-number octet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NumberType {
    #[default]
    Unknown = 0,
    International = 1,
    National = 2,
    NetworkSpecific = 3,
    Subscriber = 4,
    Abbreviated = 6,
}

impl std::convert::TryFrom<u64> for NumberType {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(NumberType::Unknown),
            1 => Ok(NumberType::International),
            2 => Ok(NumberType::National),
            3 => Ok(NumberType::NetworkSpecific),
            4 => Ok(NumberType::Subscriber),
            6 => Ok(NumberType::Abbreviated),
            _ => Err(()),
        }
    }
}

impl NumberType {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u8 as u64
    }

    /// Lenient conversion for received numbers: reserved codes read as Unknown
    pub fn from_raw_lossy(x: u8) -> Self {
        NumberType::try_from(x as u64).unwrap_or_default()
    }
}

impl From<NumberType> for u64 {
    fn from(e: NumberType) -> Self {
        e.into_raw()
    }
}

impl core::fmt::Display for NumberType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NumberType::Unknown => write!(f, "Unknown"),
            NumberType::International => write!(f, "International"),
            NumberType::National => write!(f, "National"),
            NumberType::NetworkSpecific => write!(f, "NetworkSpecific"),
            NumberType::Subscriber => write!(f, "Subscriber"),
            NumberType::Abbreviated => write!(f, "Abbreviated"),
        }
    }
}
