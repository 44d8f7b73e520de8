//! Hold, retrieve, suspend and resume, plus the in-call informational messages

use super::{DecodedMessage, MsgCtx, put_cause, put_channel, put_facility, take_cause, take_channel, take_facility};
use crate::enums::number_type::NumberType;
use crate::ies::IeWriter;
use crate::ies::call_id::CallIdentity;
use crate::ies::notify::Notify;
use crate::ies::party_number::{CalledNumber, PartyNumber, RedirectionNumber};
use crate::ies::text::{Display, Keypad};
use crate::ies::useruser::UserUser;
use crate::structs::call_data::CallData;

pub fn parse_empty(_msg: &DecodedMessage<'_>, _call: &mut CallData, _ctx: &MsgCtx) {}

pub fn build_empty(_call: &CallData, _ctx: &MsgCtx, _w: &mut IeWriter) {}

/// Parse for HOLD_REJECT, SUSPEND_REJECT and RESUME_REJECT
pub fn parse_reject(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_cause(msg, call);
}

pub fn build_reject(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_cause(w, call, ctx);
}

pub fn parse_retrieve_acknowledge(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_channel(msg, call);
}

pub fn build_retrieve_acknowledge(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
}

/// Parse for SUSPEND and RESUME
pub fn parse_call_identity(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(CallIdentity(id)) = msg.ie::<CallIdentity>() {
        call.call_id = id;
    }
}

pub fn build_call_identity(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    if !call.call_id.is_empty() {
        w.put(&CallIdentity(call.call_id.clone()));
    }
}

pub fn parse_resume_acknowledge(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_channel(msg, call);
}

pub fn build_resume_acknowledge(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.channel);
}

pub fn parse_facility(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_facility(msg, call);
}

pub fn build_facility(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    if !call.display.is_empty() {
        w.put(&Display(call.display.clone()));
    }
    put_facility(w, &call.fac_out, ctx);
}

pub fn parse_notify(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(Notify(n)) = msg.ie::<Notify>() {
        call.notify = Some(n);
    }
    if let Some(RedirectionNumber(pn)) = msg.ie::<RedirectionNumber>() {
        call.rnumplan = NumberType::from_raw_lossy(pn.number_type);
        call.rad = pn.number;
    }
}

pub fn build_notify(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    if let Some(n) = call.notify {
        w.put(&Notify(n));
    }
    if !call.rad.is_empty() && ctx.outgoing_colp < 2 {
        w.put(&RedirectionNumber(PartyNumber::new(
            call.rnumplan.into_raw() as u8,
            1,
            Some(ctx.outgoing_colp),
            None,
            &call.rad,
        )));
    }
}

pub fn parse_information(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(called) = msg.ie::<CalledNumber>() {
        call.info_dad = called.number;
    }
    if let Some(Keypad(k)) = msg.ie::<Keypad>() {
        call.keypad = k;
    }
}

pub fn build_information(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    if !call.info_dad.is_empty() {
        w.put(&CalledNumber {
            number_type: 0,
            plan: 1,
            number: call.info_dad.clone(),
        });
    }
    if !call.display.is_empty() {
        w.put(&Display(call.display.clone()));
    }
}

pub fn parse_user_information(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(uu) = msg.ie::<UserUser>() {
        call.uu_protocol = uu.protocol;
        call.user_user = uu.data;
    }
}

pub fn build_user_information(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    if !call.user_user.is_empty() {
        w.put(&UserUser {
            protocol: call.uu_protocol,
            data: call.user_user.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_config::FacilityStrategy;
    use isdn_core::{Role, TrunkType, debug};
    use isdn_saps::{Frame, prim};

    use crate::enums::ie_tag::IeTag;
    use crate::facility::Facility;

    fn roundtrip(
        build: fn(&CallData, &MsgCtx, &mut IeWriter),
        parse: fn(&DecodedMessage<'_>, &mut CallData, &MsgCtx),
        call: &CallData,
        ctx: &MsgCtx,
    ) -> (Vec<u8>, CallData) {
        let mut w = IeWriter::new(ctx.ie_ctx());
        build(call, ctx, &mut w);
        let frame = Frame::new(prim::CC_FACILITY | prim::INDICATION, 1, ctx.l3id, w.finish());
        let mut back = CallData::default();
        parse(&DecodedMessage::new(&frame, ctx.ie_ctx()), &mut back, ctx);
        (frame.payload, back)
    }

    #[test]
    fn test_facility_legacy_centrex() {
        debug::setup_logging_verbose();
        let mut ctx = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 0x10005);
        ctx.facility = FacilityStrategy::Legacy;
        let mut call = CallData::default();
        call.fac_out = Facility::centrex("Reception");
        call.display = "Hi".to_string();

        let (payload, back) = roundtrip(build_facility, parse_facility, &call, &ctx);
        assert_eq!(&payload[..4], &[0x28, 0x02, b'H', b'i']);
        assert_eq!(&payload[4..8], &[0x1c, 0x0d, 0x88, 0x0a]);
        assert_eq!(back.fac_in, Facility::centrex("Reception"));
    }

    #[test]
    fn test_information_digits() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Nt, TrunkType::Bri, 1, 0xff03);
        let mut call = CallData::default();
        call.info_dad = "42".to_string();
        let (payload, back) = roundtrip(build_information, parse_information, &call, &ctx);
        assert_eq!(payload, vec![0x70, 0x03, 0x81, b'4', b'2']);
        assert_eq!(back.info_dad, "42");
        assert!(back.dad.is_empty());
    }

    #[test]
    fn test_notify_redirection_blocked() {
        debug::setup_logging_verbose();
        let mut ctx = MsgCtx::new(Role::Nt, TrunkType::Bri, 1, 0xff03);
        let mut call = CallData::default();
        call.notify = Some(0x79);
        call.rad = "300".to_string();

        let (_, back) = roundtrip(build_notify, parse_notify, &call, &ctx);
        assert_eq!(back.notify, Some(0x79));
        assert_eq!(back.rad, "300");

        ctx.outgoing_colp = 2;
        let (payload, back) = roundtrip(build_notify, parse_notify, &call, &ctx);
        assert_eq!(payload, vec![IeTag::Notify.into_raw() as u8, 0x01, 0xf9]);
        assert!(back.rad.is_empty());
    }

    #[test]
    fn test_suspend_call_identity() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 7);
        let mut call = CallData::default();
        call.call_id = vec![0x31, 0x32];
        let (payload, back) = roundtrip(build_call_identity, parse_call_identity, &call, &ctx);
        assert_eq!(payload, vec![0x10, 0x02, 0x31, 0x32]);
        assert_eq!(back.call_id, vec![0x31, 0x32]);
    }
}
