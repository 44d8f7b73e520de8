use core::fmt;

/// Life cycle of the B-channel side of a call context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BchanState {
    /// Pool slot is free
    #[default]
    Cleaned,
    /// Reserved for a call, no B-channel layer yet
    Empty,
    /// Sub-layer requested from the device
    Setup,
    /// Sub-layer assigned
    Setuped,
    /// B-channel carrying media
    Activated,
    /// Joined to a conference
    Bridged,
    /// Sub-layer removal requested
    Release,
    Released,
    /// Context wiped without the application being told
    Clean,
    /// Context wiped after a CLEANUP event went to the application
    CleanRequest,
    Error,
}

impl BchanState {
    /// True while a device sub-layer is assigned to the context
    pub fn has_layer(self) -> bool {
        matches!(self, BchanState::Setup | BchanState::Setuped | BchanState::Activated | BchanState::Bridged)
    }
}

impl fmt::Display for BchanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BchanState::Cleaned => "BCHAN_CLEANED",
            BchanState::Empty => "BCHAN_EMPTY",
            BchanState::Setup => "BCHAN_SETUP",
            BchanState::Setuped => "BCHAN_SETUPED",
            BchanState::Activated => "BCHAN_ACTIVATED",
            BchanState::Bridged => "BCHAN_BRIDGED",
            BchanState::Release => "BCHAN_RELEASE",
            BchanState::Released => "BCHAN_RELEASED",
            BchanState::Clean => "BCHAN_CLEAN",
            BchanState::CleanRequest => "BCHAN_CLEAN_REQUEST",
            BchanState::Error => "BCHAN_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Whether a context may move from `from` to `to`
pub fn transition_allowed(from: BchanState, to: BchanState) -> bool {
    use BchanState::*;
    match (from, to) {
        (_, Error) => true,
        // Wiping is always possible
        (_, Clean | CleanRequest) => true,
        (Cleaned | Clean | CleanRequest | Released | Error, Empty) => true,
        (Cleaned | Empty, Setup) => true,
        (Setup, Setuped) => true,
        (Setup | Setuped, Activated) => true,
        (Activated, Bridged) => true,
        // Deactivation and leaving a conference keep the sub-layer
        (Activated | Bridged, Setuped) => true,
        (Setup | Setuped | Activated | Bridged | Error, Release) => true,
        (Release, Released) => true,
        (Empty | Released | Clean | CleanRequest | Error, Cleaned) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BchanState::*;

    const ALL: [BchanState; 11] = [
        Cleaned, Empty, Setup, Setuped, Activated, Bridged, Release, Released, Clean, CleanRequest, Error,
    ];

    #[test]
    fn test_activated_only_from_setup() {
        let sources: Vec<BchanState> = ALL.iter().copied().filter(|s| transition_allowed(*s, Activated)).collect();
        assert_eq!(sources, vec![Setup, Setuped]);
        // A split bridge goes back through SETUPED
        assert!(!transition_allowed(Bridged, Activated));
        assert!(transition_allowed(Bridged, Setuped));
        assert!(!transition_allowed(Empty, Activated));
        assert!(!transition_allowed(Released, Activated));
    }

    #[test]
    fn test_bridged_only_from_activated() {
        let sources: Vec<BchanState> = ALL.iter().copied().filter(|s| transition_allowed(*s, Bridged)).collect();
        assert_eq!(sources, vec![Activated]);
    }

    #[test]
    fn test_error_and_wipe_from_anywhere() {
        for s in ALL {
            assert!(transition_allowed(s, Error));
            assert!(transition_allowed(s, Clean));
        }
        assert!(!transition_allowed(Activated, Cleaned));
        assert!(!transition_allowed(Cleaned, Released));
    }
}
