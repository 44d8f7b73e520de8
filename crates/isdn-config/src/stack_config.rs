use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use isdn_core::{Role, Topology, TrunkType};

/// Channel hunting order when the application leaves the choice to us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ChannelMethod {
    /// Lowest free channel first
    #[default]
    Standard,
    /// Highest free channel first, keeps glare away from a peer hunting upwards
    Descending,
}

/// How outgoing facility IEs are encoded on a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum FacilityStrategy {
    /// ASN.1 INVOKE components
    #[default]
    Asn1,
    /// Fixed byte template used by older switches
    Legacy,
}

#[derive(Debug, Clone)]
pub struct CfgPort {
    /// Port number as known by the transport
    pub port: u8,
    pub role: Role,
    pub ptp: bool,
    pub trunk: TrunkType,
    pub method: ChannelMethod,
    /// In PTMP TE mode, pick the channel ourselves instead of asking for any
    pub te_choose_channel: bool,
    pub hold_allowed: bool,
    pub facility: FacilityStrategy,
    /// Connected/redirecting number presentation policy: 0 allow, 1 restrict, 2 block
    pub outgoing_colp: u8,
    /// Forced calling presentation, None keeps what the application set
    pub presentation: Option<u8>,
    /// Forced screening indicator, None keeps what the application set
    pub screen: Option<u8>,
}

impl CfgPort {
    pub fn new(port: u8, role: Role, trunk: TrunkType) -> Self {
        Self {
            port,
            role,
            ptp: trunk == TrunkType::Pri,
            trunk,
            method: ChannelMethod::Standard,
            te_choose_channel: false,
            hold_allowed: true,
            facility: FacilityStrategy::Asn1,
            outgoing_colp: 0,
            presentation: None,
            screen: None,
        }
    }

    pub fn topology(&self) -> Topology {
        Topology::from_ptp(self.ptp)
    }
}

#[derive(Debug, Clone)]
pub struct CfgGeneral {
    /// Allow joining B-channels into a conference
    pub bridging: bool,
    /// In NT mode, drop all layer-3 contexts when layer 2 goes down
    pub clear_l3_on_l2_release: bool,
}

impl Default for CfgGeneral {
    fn default() -> Self {
        Self {
            bridging: true,
            clear_l3_on_l2_release: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub debug_log: Option<String>,
    pub general: CfgGeneral,
    pub ports: Vec<CfgPort>,
}

impl StackConfig {
    pub fn new(ports: Vec<CfgPort>) -> Self {
        StackConfig {
            debug_log: None,
            general: CfgGeneral::default(),
            ports,
        }
    }

    pub fn port(&self, port: u8) -> Option<&CfgPort> {
        self.ports.iter().find(|p| p.port == port)
    }

    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), &str> {
        if self.ports.is_empty() {
            return Err("at least one port must be configured");
        }

        let mut seen = HashSet::new();
        for p in &self.ports {
            if !seen.insert(p.port) {
                return Err("duplicate port number");
            }
            if p.outgoing_colp > 2 {
                return Err("outgoing_colp must be 0, 1 or 2");
            }
            if matches!(p.presentation, Some(v) if v > 2) {
                return Err("presentation must be 0..2");
            }
            if matches!(p.screen, Some(v) if v > 3) {
                return Err("screen must be 0..3");
            }
            if p.trunk == TrunkType::Pri && !p.ptp {
                return Err("primary rate ports are always point-to-point");
            }
        }
        Ok(())
    }
}

/// Mutable, stack-editable state (lock-protected).
#[derive(Debug, Clone, Default)]
pub struct StackState {
    /// Ports taken out of service by the administrator
    pub blocked_ports: HashSet<u8>,
}

/// Global shared configuration: immutable config + mutable state.
#[derive(Clone)]
pub struct SharedConfig {
    /// Read-only configuration (immutable after construction).
    cfg: Arc<StackConfig>,
    /// Mutable state guarded with RwLock (write by the stack, read by others).
    state: Arc<RwLock<StackState>>,
}

impl SharedConfig {
    pub fn new(ports: Vec<CfgPort>) -> Result<Self, String> {
        Self::from_config(StackConfig::new(ports))
    }

    pub fn from_config(cfg: StackConfig) -> Result<Self, String> {
        Self::from_parts(cfg, StackState::default())
    }

    /// Fails when the configuration does not validate
    pub fn from_parts(cfg: StackConfig, state: StackState) -> Result<Self, String> {
        cfg.validate().map_err(|e| format!("Invalid stack configuration: {}", e))?;

        Ok(Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }

    /// Read guard for mutable state.
    pub fn state_read(&self) -> std::sync::RwLockReadGuard<'_, StackState> {
        self.state.read().expect("StackState RwLock blocked")
    }

    /// Write guard for mutable state.
    pub fn state_write(&self) -> std::sync::RwLockWriteGuard<'_, StackState> {
        self.state.write().expect("StackState RwLock blocked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let cfg = StackConfig::new(vec![CfgPort::new(1, Role::Te, TrunkType::Bri)]);
        assert!(cfg.validate().is_ok());

        let cfg = StackConfig::new(vec![]);
        assert!(cfg.validate().is_err());

        let cfg = StackConfig::new(vec![
            CfgPort::new(1, Role::Te, TrunkType::Bri),
            CfgPort::new(1, Role::Nt, TrunkType::Bri),
        ]);
        assert_eq!(cfg.validate(), Err("duplicate port number"));

        let mut p = CfgPort::new(2, Role::Nt, TrunkType::Pri);
        p.ptp = false;
        assert!(StackConfig::new(vec![p]).validate().is_err());
    }

    #[test]
    fn test_shared_state() {
        let shared = SharedConfig::new(vec![CfgPort::new(4, Role::Nt, TrunkType::Pri)]).unwrap();
        shared.state_write().blocked_ports.insert(4);
        assert!(shared.state_read().blocked_ports.contains(&4));
        assert_eq!(shared.config().port(4).map(|p| p.trunk), Some(TrunkType::Pri));
    }

    #[test]
    fn test_invalid_config_is_refused() {
        assert_eq!(
            SharedConfig::new(vec![]).err().as_deref(),
            Some("Invalid stack configuration: at least one port must be configured")
        );
        let dup = vec![
            CfgPort::new(3, Role::Te, TrunkType::Bri),
            CfgPort::new(3, Role::Te, TrunkType::Bri),
        ];
        let mut state = StackState::default();
        state.blocked_ports.insert(3);
        assert!(SharedConfig::from_parts(StackConfig::new(dup), state).is_err());
    }
}
