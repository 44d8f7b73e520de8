use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use isdn_core::{Role, TrunkType};

use super::stack_config::{CfgGeneral, CfgPort, ChannelMethod, FacilityStrategy, SharedConfig, StackConfig, StackState};

/// Build `SharedConfig` from a TOML configuration file
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref general) = root.general {
        if !general.extra.is_empty() {
            return Err(format!("Unrecognized fields in general: {:?}", sorted_keys(&general.extra)).into());
        }
    }
    for p in root.ports.iter() {
        if !p.extra.is_empty() {
            return Err(format!("Unrecognized fields in ports[{}]: {:?}", p.port, sorted_keys(&p.extra)).into());
        }
    }
    if let Some(ref ss) = root.stack_state {
        if !ss.extra.is_empty() {
            return Err(format!("Unrecognized fields in stack_state: {:?}", sorted_keys(&ss.extra)).into());
        }
    }

    let mut cfg = StackConfig {
        debug_log: root.debug_log,
        general: CfgGeneral::default(),
        ports: Vec::with_capacity(root.ports.len()),
    };

    if let Some(general) = root.general {
        apply_general_patch(&mut cfg.general, general);
    }

    for dto in root.ports {
        cfg.ports.push(port_from_dto(dto)?);
    }

    let mut state = StackState::default();
    if let Some(ss) = root.stack_state {
        if let Some(blocked) = ss.blocked_ports {
            state.blocked_ports.extend(blocked);
        }
    }

    Ok(SharedConfig::from_parts(cfg, state)?)
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_general_patch(dst: &mut CfgGeneral, src: GeneralDto) {
    if let Some(v) = src.bridging {
        dst.bridging = v;
    }
    if let Some(v) = src.clear_l3_on_l2_release {
        dst.clear_l3_on_l2_release = v;
    }
}

/// Negative presentation/screen values in the file mean "keep what the application set"
fn optional_indicator(v: Option<i8>, field: &str) -> Result<Option<u8>, String> {
    match v {
        None => Ok(None),
        Some(x) if x < 0 => Ok(None),
        Some(x) if x <= 3 => Ok(Some(x as u8)),
        Some(x) => Err(format!("{} out of range: {}", field, x)),
    }
}

fn port_from_dto(src: PortDto) -> Result<CfgPort, String> {
    let mut dst = CfgPort::new(src.port, src.role, src.trunk.unwrap_or(TrunkType::Bri));
    if let Some(v) = src.ptp {
        dst.ptp = v;
    }
    if let Some(v) = src.method {
        dst.method = v;
    }
    if let Some(v) = src.te_choose_channel {
        dst.te_choose_channel = v;
    }
    if let Some(v) = src.hold_allowed {
        dst.hold_allowed = v;
    }
    if let Some(v) = src.facility {
        dst.facility = v;
    }
    if let Some(v) = src.outgoing_colp {
        dst.outgoing_colp = v;
    }
    dst.presentation = optional_indicator(src.presentation, "presentation")?;
    dst.screen = optional_indicator(src.screen, "screen")?;
    Ok(dst)
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    general: Option<GeneralDto>,

    #[serde(default)]
    ports: Vec<PortDto>,

    #[serde(default)]
    stack_state: Option<StackStatePatch>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct GeneralDto {
    pub bridging: Option<bool>,
    pub clear_l3_on_l2_release: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct PortDto {
    pub port: u8,
    pub role: Role,
    pub trunk: Option<TrunkType>,
    pub ptp: Option<bool>,
    pub method: Option<ChannelMethod>,
    pub te_choose_channel: Option<bool>,
    pub hold_allowed: Option<bool>,
    pub facility: Option<FacilityStrategy>,
    pub outgoing_colp: Option<u8>,
    pub presentation: Option<i8>,
    pub screen: Option<i8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct StackStatePatch {
    pub blocked_ports: Option<Vec<u8>>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PORTS: &str = r#"
config_version = "0.1"

[general]
bridging = false

[[ports]]
port = 1
role = "Te"
trunk = "Bri"
method = "Descending"
facility = "Legacy"
presentation = -1
screen = 1

[[ports]]
port = 2
role = "Nt"
trunk = "Pri"
hold_allowed = false

[stack_state]
blocked_ports = [2]
"#;

    #[test]
    fn test_parse_two_ports() {
        let shared = from_toml_str(TWO_PORTS).unwrap();
        let cfg = shared.config();
        assert!(!cfg.general.bridging);
        assert!(cfg.general.clear_l3_on_l2_release);
        assert_eq!(cfg.ports.len(), 2);

        let p1 = cfg.port(1).unwrap();
        assert_eq!(p1.role, Role::Te);
        assert!(!p1.ptp);
        assert_eq!(p1.method, ChannelMethod::Descending);
        assert_eq!(p1.facility, FacilityStrategy::Legacy);
        assert_eq!(p1.presentation, None);
        assert_eq!(p1.screen, Some(1));

        let p2 = cfg.port(2).unwrap();
        assert_eq!(p2.trunk, TrunkType::Pri);
        assert!(p2.ptp);
        assert!(!p2.hold_allowed);
        assert!(shared.state_read().blocked_ports.contains(&2));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let bad = TWO_PORTS.replace("hold_allowed = false", "hold_allowed = false\nmsn = \"123\"");
        let err = from_toml_str(&bad).err().unwrap();
        assert!(err.to_string().contains("msn"));

        let bad = format!("{}\nfoo = 1\n", "config_version = \"0.1\"\n[[ports]]\nport = 1\nrole = \"Te\"");
        // foo lands inside the last table, ports[1]
        assert!(from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_reject_bad_version_and_values() {
        assert!(from_toml_str("config_version = \"9.9\"\n[[ports]]\nport = 1\nrole = \"Te\"\n").is_err());
        let err = from_toml_str("config_version = \"0.1\"\n").err().unwrap();
        assert!(err.to_string().contains("at least one port"));
        assert!(from_toml_str("config_version = \"0.1\"\n[[ports]]\nport = 1\nrole = \"Te\"\nscreen = 7\n").is_err());
    }
}
