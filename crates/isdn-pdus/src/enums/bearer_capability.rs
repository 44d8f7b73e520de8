/// Information transfer capability, 5 bits of bearer capability octet 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Capability {
    #[default]
    Speech = 0x00,
    DigitalUnrestricted = 0x08,
    DigitalRestricted = 0x09,
    Audio3k1 = 0x10,
    DigitalUnrestrictedTones = 0x11,
    Video = 0x18,
}

impl std::convert::TryFrom<u64> for Capability {
    type Error = ();
    fn try_from(x: u64) -> Result<Self, Self::Error> {
        match x {
            0x00 => Ok(Capability::Speech),
            0x08 => Ok(Capability::DigitalUnrestricted),
            0x09 => Ok(Capability::DigitalRestricted),
            0x10 => Ok(Capability::Audio3k1),
            0x11 => Ok(Capability::DigitalUnrestrictedTones),
            0x18 => Ok(Capability::Video),
            _ => Err(()),
        }
    }
}

impl Capability {
    /// Convert this enum back into the raw integer value
    pub fn into_raw(self) -> u64 {
        self as u8 as u64
    }

    pub fn is_digital(self) -> bool {
        matches!(self, Capability::DigitalUnrestricted | Capability::DigitalRestricted | Capability::Video)
    }
}

impl From<Capability> for u64 {
    fn from(e: Capability) -> Self {
        e.into_raw()
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Capability::Speech => write!(f, "Speech"),
            Capability::DigitalUnrestricted => write!(f, "DigitalUnrestricted"),
            Capability::DigitalRestricted => write!(f, "DigitalRestricted"),
            Capability::Audio3k1 => write!(f, "Audio3k1"),
            Capability::DigitalUnrestrictedTones => write!(f, "DigitalUnrestrictedTones"),
            Capability::Video => write!(f, "Video"),
        }
    }
}

/// Companding law, carried as user information layer 1 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Law {
    #[default]
    Alaw,
    Ulaw,
}

impl Law {
    /// User information layer 1 protocol value (G.711 mu-law 2, A-law 3)
    pub fn user_l1(self) -> u8 {
        match self {
            Law::Ulaw => 2,
            Law::Alaw => 3,
        }
    }

    /// Anything but mu-law reads as A-law
    pub fn from_user_l1(user: Option<u8>) -> Self {
        match user {
            Some(2) => Law::Ulaw,
            _ => Law::Alaw,
        }
    }
}
