//! Call establishment: SETUP through CONNECT_ACKNOWLEDGE

use isdn_core::{CHANNEL_ANY, CHANNEL_NONE};

use super::{DecodedMessage, MsgCtx, put_channel, put_facility, put_nt_progress, take_channel, take_facility, take_progress};
use crate::enums::bearer_capability::{Capability, Law};
use crate::enums::ie_tag::IeTag;
use crate::enums::number_type::NumberType;
use crate::ies::IeWriter;
use crate::ies::bearer::{BearerCapability, RATE_64K};
use crate::ies::complete::SendingComplete;
use crate::ies::date::DateTime;
use crate::ies::party_number::{CalledNumber, CallingNumber, ConnectedNumber, PartyNumber, RedirectingNumber};
use crate::ies::text::{Display, Keypad};
use crate::ies::useruser::UserUser;
use crate::structs::call_data::CallData;

/// ISDN/telephony numbering plan
const PLAN_ISDN: u8 = 1;

pub fn parse_setup(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(CallingNumber(pn)) = msg.ie::<CallingNumber>() {
        call.onumplan = NumberType::from_raw_lossy(pn.number_type);
        call.pres = match pn.presentation {
            Some(1) => 1,
            _ => 0,
        };
        call.screen = pn.screen.unwrap_or(0);
        call.oad = pn.number;
    }

    if let Some(called) = msg.ie::<CalledNumber>() {
        call.dnumplan = NumberType::from_raw_lossy(called.number_type);
        call.dad = called.number;
    }

    if let Some(Keypad(k)) = msg.ie::<Keypad>() {
        call.keypad = k;
    }
    call.sending_complete = msg.has(IeTag::SendingComplete);

    if let Some(redir) = msg.ie::<RedirectingNumber>() {
        call.rnumplan = NumberType::from_raw_lossy(redir.party.number_type);
        call.redirect_reason = redir.reason;
        call.rad = redir.party.number;
    }

    take_bearer(msg, call);
    take_channel(msg, call);
    take_progress(msg, call);
    take_facility(msg, call);

    if let Some(uu) = msg.ie::<UserUser>() {
        call.uu_protocol = uu.protocol;
        call.user_user = uu.data;
    }

    // Compatibility blobs travel untouched to the other call leg
    call.bc_raw = msg.raw(IeTag::BearerCapability).map(<[u8]>::to_vec).unwrap_or_default();
    call.hlc_raw = msg.raw(IeTag::HighLayerCompat).map(<[u8]>::to_vec).unwrap_or_default();
    call.llc_raw = msg.raw(IeTag::LowLayerCompat).map(<[u8]>::to_vec).unwrap_or_default();
}

fn take_bearer(msg: &DecodedMessage<'_>, call: &mut CallData) {
    let Some(bc) = msg.ie::<BearerCapability>() else {
        call.capability = Capability::DigitalUnrestricted;
        return;
    };

    match Capability::try_from(bc.capability as u64) {
        Ok(cap) => call.capability = cap,
        Err(_) => tracing::warn!("unsupported transfer capability 0x{:02x}, keeping {}", bc.capability, call.capability),
    }
    call.law = Law::from_user_l1(bc.user);

    if call.capability == Capability::DigitalUnrestricted {
        call.user1 = bc.user;
        call.async_mode = bc.async_mode;
        call.urate = bc.urate;
        call.rate = bc.rate;
        call.mode = bc.mode;
    }
}

pub fn build_setup(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    let exclusive = !(call.channel == CHANNEL_NONE || call.channel == CHANNEL_ANY);
    put_channel(w, exclusive, call.channel);

    w.put(&CallingNumber(PartyNumber::new(
        call.onumplan.into_raw() as u8,
        PLAN_ISDN,
        Some(call.pres),
        Some(call.screen),
        &call.oad,
    )));

    if !call.dad.is_empty() {
        w.put(&CalledNumber {
            number_type: call.dnumplan.into_raw() as u8,
            plan: PLAN_ISDN,
            number: call.dad.clone(),
        });
    }

    if !call.display.is_empty() {
        w.put(&Display(call.display.clone()));
    }

    let user = match call.law {
        Law::Ulaw => 2,
        Law::Alaw => 3,
    };
    w.put(&BearerCapability::new(0, call.capability.into_raw() as u8, 0, RATE_64K, Some(user)));

    if call.sending_complete {
        w.put(&SendingComplete);
    }

    put_facility(w, &call.fac_out, ctx);

    if !call.user_user.is_empty() {
        w.put(&UserUser {
            protocol: call.uu_protocol,
            data: call.user_user.clone(),
        });
    }

    // A deflection in the facility already tells the peer where the call came from
    if ctx.outgoing_colp == 0 && !call.rad.is_empty() && !call.fac_out.is_call_deflect() {
        w.put(&RedirectingNumber {
            party: PartyNumber::new(call.rnumplan.into_raw() as u8, PLAN_ISDN, Some(0), Some(0), &call.rad),
            reason: call.redirect_reason,
        });
    }
}

pub fn parse_setup_acknowledge(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_channel(msg, call);
    take_progress(msg, call);
}

pub fn build_setup_acknowledge(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
    put_nt_progress(w, ctx);
}

pub fn parse_proceeding(msg: &DecodedMessage<'_>, call: &mut CallData, ctx: &MsgCtx) {
    // A terminal keeps the channel it hunted for itself
    if ctx.is_nt() {
        take_channel(msg, call);
    }
    take_progress(msg, call);
}

pub fn build_proceeding(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
    put_nt_progress(w, ctx);
}

pub fn parse_alerting(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_progress(msg, call);
}

pub fn build_alerting(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
    put_nt_progress(w, ctx);
}

pub fn parse_progress(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_progress(msg, call);
}

pub fn build_progress(_call: &CallData, _ctx: &MsgCtx, _w: &mut IeWriter) {}

pub fn parse_connect(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    // Only a CONNECT answering the SETUP directly assigns the channel
    if call.channel == CHANNEL_NONE || call.channel == CHANNEL_ANY {
        take_channel(msg, call);
    }
    take_progress(msg, call);
    if let Some(ConnectedNumber(pn)) = msg.ie::<ConnectedNumber>() {
        call.cnumplan = NumberType::from_raw_lossy(pn.number_type);
        call.cad = pn.number;
    }
    if let Some(date) = msg.ie::<DateTime>() {
        call.date = Some(date);
    }
}

pub fn build_connect(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    if ctx.is_nt() {
        if call.channel != CHANNEL_NONE && call.channel != CHANNEL_ANY {
            put_channel(w, true, call.channel);
        }
        w.put(&DateTime::now());
    }

    let number = call.connected_number();
    match ctx.outgoing_colp {
        2 => tracing::debug!("connected number '{}' blocked by colp policy", number),
        colp => {
            w.put(&ConnectedNumber(PartyNumber::new(0, PLAN_ISDN, Some(colp), Some(0), number)));
        }
    }
}

pub fn parse_connect_acknowledge(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_channel(msg, call);
}

pub fn build_connect_acknowledge(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
}
