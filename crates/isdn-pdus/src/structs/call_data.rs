use core::fmt;

use isdn_core::CHANNEL_NONE;

use crate::enums::bearer_capability::{Capability, Law};
use crate::enums::number_type::NumberType;
use crate::facility::Facility;
use crate::ies::cause::CAUSE_NORMAL_CLEARING;
use crate::ies::date::DateTime;

/// Everything a Q.931 message can carry for one call. Messages are parsed into
/// and built from this struct; the stack-side bookkeeping lives in the call context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    /// B-channel, 0 for none, `CHANNEL_ANY` for any
    pub channel: u8,

    /// Calling party
    pub oad: String,
    pub onumplan: NumberType,
    /// 0 allowed, 1 restricted
    pub pres: u8,
    pub screen: u8,

    /// Called party
    pub dad: String,
    pub dnumplan: NumberType,

    /// Redirecting party
    pub rad: String,
    pub rnumplan: NumberType,
    pub redirect_reason: Option<u8>,

    /// Connected party, falls back to `dad` when empty
    pub cad: String,
    pub cnumplan: NumberType,

    /// Overlap digits received in INFORMATION
    pub info_dad: String,
    pub keypad: String,
    pub display: String,
    pub sending_complete: bool,

    pub capability: Capability,
    pub law: Law,
    pub mode: u8,
    pub rate: u8,
    pub user1: Option<u8>,
    pub async_mode: Option<bool>,
    pub urate: Option<u8>,

    pub progress_coding: Option<u8>,
    pub progress_location: Option<u8>,
    /// 0 when no progress indicator was received
    pub progress_indicator: u8,

    /// Received cause, None until a message carried one
    pub cause: Option<u8>,
    pub cause_location: Option<u8>,
    /// Cause sent in clearing messages
    pub out_cause: u8,

    pub notify: Option<u8>,
    pub user_user: Vec<u8>,
    pub uu_protocol: u8,

    pub fac_in: Facility,
    pub fac_out: Facility,

    /// Compatibility IEs kept verbatim from SETUP
    pub bc_raw: Vec<u8>,
    pub hlc_raw: Vec<u8>,
    pub llc_raw: Vec<u8>,

    pub call_id: Vec<u8>,
    /// Channel named in a received RESTART, or to put in an outgoing one
    pub restart_channel: u8,
    pub date: Option<DateTime>,
}

impl Default for CallData {
    fn default() -> Self {
        Self {
            channel: CHANNEL_NONE,
            oad: String::new(),
            onumplan: NumberType::Unknown,
            pres: 0,
            screen: 0,
            dad: String::new(),
            dnumplan: NumberType::Unknown,
            rad: String::new(),
            rnumplan: NumberType::Unknown,
            redirect_reason: None,
            cad: String::new(),
            cnumplan: NumberType::Unknown,
            info_dad: String::new(),
            keypad: String::new(),
            display: String::new(),
            sending_complete: false,
            capability: Capability::Speech,
            law: Law::Alaw,
            mode: 0,
            rate: 0x10,
            user1: None,
            async_mode: None,
            urate: None,
            progress_coding: None,
            progress_location: None,
            progress_indicator: 0,
            cause: None,
            cause_location: None,
            out_cause: CAUSE_NORMAL_CLEARING,
            notify: None,
            user_user: Vec::new(),
            uu_protocol: 0,
            fac_in: Facility::None,
            fac_out: Facility::None,
            bc_raw: Vec::new(),
            hlc_raw: Vec::new(),
            llc_raw: Vec::new(),
            call_id: Vec::new(),
            restart_channel: CHANNEL_NONE,
            date: None,
        }
    }
}

impl CallData {
    pub fn reset(&mut self) {
        *self = CallData::default();
    }

    /// Number to put in the connected party IE
    pub fn connected_number(&self) -> &str {
        if self.cad.is_empty() { &self.dad } else { &self.cad }
    }

    /// One line per populated group, for call dumps
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("channel: {} capability: {} law: {:?}", self.channel, self.capability, self.law),
            format!(
                "oad: '{}' ({}) pres: {} screen: {} dad: '{}' ({})",
                self.oad, self.onumplan, self.pres, self.screen, self.dad, self.dnumplan
            ),
        ];
        if !self.rad.is_empty() {
            lines.push(format!("rad: '{}' ({}) reason: {:?}", self.rad, self.rnumplan, self.redirect_reason));
        }
        if !self.cad.is_empty() {
            lines.push(format!("cad: '{}' ({})", self.cad, self.cnumplan));
        }
        if !self.keypad.is_empty() || !self.info_dad.is_empty() {
            lines.push(format!("keypad: '{}' info_dad: '{}'", self.keypad, self.info_dad));
        }
        if !self.display.is_empty() {
            lines.push(format!("display: '{}'", self.display));
        }
        lines.push(format!(
            "cause: {:?} (loc {:?}) out_cause: {} progress: {}",
            self.cause, self.cause_location, self.out_cause, self.progress_indicator
        ));
        if !self.fac_in.is_none() || !self.fac_out.is_none() {
            lines.push(format!("facility in: {} out: {}", self.fac_in, self.fac_out));
        }
        if !self.user_user.is_empty() {
            lines.push(format!("user-user: proto {} {} bytes", self.uu_protocol, self.user_user.len()));
        }
        if !self.bc_raw.is_empty() || !self.hlc_raw.is_empty() || !self.llc_raw.is_empty() {
            lines.push(format!("bc: {:02x?} hlc: {:02x?} llc: {:02x?}", self.bc_raw, self.hlc_raw, self.llc_raw));
        }
        lines
    }
}

impl fmt::Display for CallData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CallData {{ ch: {} oad: '{}' dad: '{}' cap: {} cause: {:?} }}",
            self.channel, self.oad, self.dad, self.capability, self.cause
        )
    }
}
