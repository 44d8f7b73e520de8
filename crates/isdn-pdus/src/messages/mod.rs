//! Q.931 messages. Every message kind is one row of [`msg_table::MSG_TABLE`] with a parse
//! function (IEs into `CallData`) and a build function (`CallData` into IEs).

use isdn_config::FacilityStrategy;
use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, L3Id, Role, TrunkType};

use crate::facility::{self, Facility};
use crate::ies::cause::Cause;
use crate::ies::channel_id::ChannelId;
use crate::ies::progress::{PROGRESS_INBAND_AVAILABLE, Progress};
use crate::ies::raw::FacilityIe;
use crate::ies::{IeCtx, IeWriter};
use crate::structs::call_data::CallData;

pub mod call_clearing;
pub mod call_misc;
pub mod call_setup;
pub mod decoded_message;
pub mod msg_table;

pub use decoded_message::DecodedMessage;
pub use msg_table::{MSG_TABLE, MsgDef, build_frame, event_info, event_of, lookup_by_event, lookup_by_prim, parse_frame};

/// Interface and call properties message functions depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgCtx {
    pub role: Role,
    pub trunk: TrunkType,
    pub port: u8,
    pub l3id: L3Id,
    pub facility: FacilityStrategy,
    /// 0 allow, 1 restrict, 2 block connected and redirecting numbers
    pub outgoing_colp: u8,
}

impl MsgCtx {
    pub fn new(role: Role, trunk: TrunkType, port: u8, l3id: L3Id) -> Self {
        Self {
            role,
            trunk,
            port,
            l3id,
            facility: FacilityStrategy::Asn1,
            outgoing_colp: 0,
        }
    }

    pub fn is_nt(&self) -> bool {
        self.role.is_nt()
    }

    pub fn ie_ctx(&self) -> IeCtx {
        IeCtx::new(self.trunk)
    }

    /// Invoke id for facility components sent on this call
    pub fn invoke_id(&self) -> i32 {
        (self.l3id & 0x7f) as i32
    }
}

/// Takes a channel the peer assigned. "None" and "any" leave the call untouched.
pub(crate) fn take_channel(msg: &DecodedMessage<'_>, call: &mut CallData) {
    if let Some(ch) = msg.ie::<ChannelId>() {
        if ch.channel != CHANNEL_NONE && ch.channel != CHANNEL_ANY {
            call.channel = ch.channel;
        }
    }
}

pub(crate) fn take_progress(msg: &DecodedMessage<'_>, call: &mut CallData) {
    if let Some(p) = msg.ie::<Progress>() {
        call.progress_coding = Some(p.coding);
        call.progress_location = Some(p.location);
        call.progress_indicator = p.description;
    }
}

pub(crate) fn take_cause(msg: &DecodedMessage<'_>, call: &mut CallData) {
    if let Some(c) = msg.ie::<Cause>() {
        call.cause_location = Some(c.location);
        call.cause = Some(c.value);
    }
}

pub(crate) fn take_facility(msg: &DecodedMessage<'_>, call: &mut CallData) {
    let Some(body) = msg.raw(crate::enums::ie_tag::IeTag::Facility) else {
        return;
    };
    match facility::decode(body) {
        Ok(fac) => call.fac_in = fac,
        Err(e) => tracing::warn!("malformed facility ({} bytes): {}", body.len(), e),
    }
}

pub(crate) fn put_channel(w: &mut IeWriter, exclusive: bool, channel: u8) {
    w.put(&ChannelId::new(exclusive, channel));
}

/// The network announces in-band information on the B-channel
pub(crate) fn put_nt_progress(w: &mut IeWriter, ctx: &MsgCtx) {
    if ctx.is_nt() {
        w.put(&Progress {
            coding: 0,
            location: 1,
            description: PROGRESS_INBAND_AVAILABLE,
        });
    }
}

pub(crate) fn put_facility(w: &mut IeWriter, fac: &Facility, ctx: &MsgCtx) {
    if fac.is_none() {
        return;
    }
    match facility::encode(fac, ctx.facility, ctx.invoke_id()) {
        Ok(body) => {
            w.put(&FacilityIe(body));
        }
        Err(e) => tracing::error!("cannot encode facility {}: {}, IE omitted", fac, e),
    }
}

pub(crate) fn put_cause(w: &mut IeWriter, call: &CallData, ctx: &MsgCtx) {
    w.put(&Cause {
        location: if ctx.is_nt() { 1 } else { 0 },
        value: call.out_cause,
    });
}
