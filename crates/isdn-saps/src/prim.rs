//! Primitive codes. A primitive is `(layer | command) | qualifier`: the low byte
//! carries REQUEST/CONFIRM/INDICATION/RESPONSE, the two bytes above it the command.

pub const REQUEST: u32 = 0x80;
pub const CONFIRM: u32 = 0x81;
pub const INDICATION: u32 = 0x82;
pub const RESPONSE: u32 = 0x83;

pub const SUBCOMMAND_MASK: u32 = 0x0000_00ff;
pub const COMMAND_MASK: u32 = 0x00ff_ff00;

/// All management primitives share this layer nibble
pub const MGR_MASK: u32 = 0x0f_0000;

// Layer 1
pub const PH_DEACTIVATE: u32 = 0x01_0000;
pub const PH_ACTIVATE: u32 = 0x01_0100;
pub const PH_CONTROL: u32 = 0x01_0200;
pub const PH_DATA: u32 = 0x11_0200;

// Layer 2
pub const DL_RELEASE: u32 = 0x02_0000;
pub const DL_ESTABLISH: u32 = 0x02_0100;
pub const DL_DATA: u32 = 0x12_0200;

// Management
pub const MGR_SHORTSTATUS: u32 = 0x0f_3200;
pub const MGR_INITTIMER: u32 = 0x0f_8100;
pub const MGR_ADDTIMER: u32 = 0x0f_8200;
pub const MGR_DELTIMER: u32 = 0x0f_8300;
pub const MGR_REMOVETIMER: u32 = 0x0f_8400;
pub const MGR_TIMER: u32 = 0x0f_8800;

// Call control, command byte is the Q.931 message type
pub const CC_ALERTING: u32 = 0x03_0100;
pub const CC_PROCEEDING: u32 = 0x03_0200;
pub const CC_PROGRESS: u32 = 0x03_0300;
pub const CC_SETUP: u32 = 0x03_0500;
pub const CC_CONNECT: u32 = 0x03_0700;
pub const CC_SETUP_ACKNOWLEDGE: u32 = 0x03_0d00;
pub const CC_CONNECT_ACKNOWLEDGE: u32 = 0x03_0f00;
pub const CC_USER_INFORMATION: u32 = 0x03_2000;
pub const CC_SUSPEND_REJECT: u32 = 0x03_2100;
pub const CC_RESUME_REJECT: u32 = 0x03_2200;
pub const CC_HOLD: u32 = 0x03_2400;
pub const CC_SUSPEND: u32 = 0x03_2500;
pub const CC_RESUME: u32 = 0x03_2600;
pub const CC_HOLD_ACKNOWLEDGE: u32 = 0x03_2800;
pub const CC_SUSPEND_ACKNOWLEDGE: u32 = 0x03_2d00;
pub const CC_RESUME_ACKNOWLEDGE: u32 = 0x03_2e00;
pub const CC_HOLD_REJECT: u32 = 0x03_3000;
pub const CC_RETRIEVE: u32 = 0x03_3100;
pub const CC_RETRIEVE_ACKNOWLEDGE: u32 = 0x03_3300;
pub const CC_RETRIEVE_REJECT: u32 = 0x03_3700;
pub const CC_DISCONNECT: u32 = 0x03_4500;
pub const CC_RESTART: u32 = 0x03_4600;
pub const CC_RELEASE: u32 = 0x03_4d00;
pub const CC_RELEASE_COMPLETE: u32 = 0x03_5a00;
pub const CC_FACILITY: u32 = 0x03_6200;
pub const CC_NOTIFY: u32 = 0x03_6e00;
pub const CC_STATUS_ENQUIRY: u32 = 0x03_7500;
pub const CC_INFORMATION: u32 = 0x03_7b00;
pub const CC_STATUS: u32 = 0x03_7d00;
pub const CC_NEW_CR: u32 = 0x03_f000;
pub const CC_RELEASE_CR: u32 = 0x03_f100;
pub const CC_TIMEOUT: u32 = 0x03_ff00;

/// Conference control words carried in a PH_CONTROL payload
pub const CMX_CONF_JOIN: u32 = 0x2403;
pub const CMX_CONF_SPLIT: u32 = 0x2404;
pub const CMX_RECEIVE_OFF: u32 = 0x2405;
pub const CMX_RECEIVE_ON: u32 = 0x2406;

/// PH_CONTROL indication word reporting a detected DTMF digit in its low bits
pub const DTMF_TONE_VAL: u32 = 0x2000;
pub const DTMF_TONE_MASK: u32 = 0x007f;
pub const DTMF_TONE_START: u32 = 0x2001;

/// Layer nibble of call control primitives
pub const CC_LAYER: u32 = 0x03_0000;

pub fn command(prim: u32) -> u32 {
    prim & COMMAND_MASK
}

pub fn qualifier(prim: u32) -> u32 {
    prim & SUBCOMMAND_MASK
}

pub fn is_call_control(prim: u32) -> bool {
    prim & 0xff_0000 == CC_LAYER
}

pub fn is_mgmt(prim: u32) -> bool {
    prim & MGR_MASK == MGR_MASK
}

pub fn qualifier_name(prim: u32) -> &'static str {
    match qualifier(prim) {
        REQUEST => "REQ",
        CONFIRM => "CONF",
        INDICATION => "IND",
        RESPONSE => "RESP",
        _ => "?",
    }
}

/// Name of the command part, for logs. Call control names are resolved by the message table.
pub fn layer_name(prim: u32) -> &'static str {
    match command(prim) {
        PH_ACTIVATE => "PH_ACTIVATE",
        PH_DEACTIVATE => "PH_DEACTIVATE",
        PH_CONTROL => "PH_CONTROL",
        PH_DATA => "PH_DATA",
        DL_ESTABLISH => "DL_ESTABLISH",
        DL_RELEASE => "DL_RELEASE",
        DL_DATA => "DL_DATA",
        MGR_SHORTSTATUS => "MGR_SHORTSTATUS",
        MGR_INITTIMER => "MGR_INITTIMER",
        MGR_ADDTIMER => "MGR_ADDTIMER",
        MGR_DELTIMER => "MGR_DELTIMER",
        MGR_REMOVETIMER => "MGR_REMOVETIMER",
        MGR_TIMER => "MGR_TIMER",
        CC_NEW_CR => "CC_NEW_CR",
        CC_RELEASE_CR => "CC_RELEASE_CR",
        c if is_call_control(c) => "CC",
        _ => "UNKNOWN",
    }
}
