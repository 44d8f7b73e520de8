//! Call clearing, restart and status messages

use isdn_saps::prim;

use super::{DecodedMessage, MsgCtx, put_cause, put_channel, put_nt_progress, take_cause, take_progress};
use crate::ies::IeWriter;
use crate::ies::channel_id::ChannelId;
use crate::structs::call_data::CallData;

pub fn parse_disconnect(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_cause(msg, call);
    take_progress(msg, call);
}

pub fn build_disconnect(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_cause(w, call, ctx);
    put_nt_progress(w, ctx);
}

pub fn parse_release(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_cause(msg, call);
}

pub fn build_release(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_cause(w, call, ctx);
}

pub fn parse_release_complete(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    // The confirm is generated locally and carries no peer IEs
    if msg.prim() == prim::CC_RELEASE_COMPLETE | prim::CONFIRM {
        return;
    }
    take_cause(msg, call);
}

pub fn build_release_complete(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_cause(w, call, ctx);
}

pub fn parse_restart(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    if let Some(ch) = msg.ie::<ChannelId>() {
        call.restart_channel = ch.channel;
    }
}

pub fn build_restart(call: &CallData, _ctx: &MsgCtx, w: &mut IeWriter) {
    put_channel(w, true, call.restart_channel);
}

pub fn parse_status(msg: &DecodedMessage<'_>, call: &mut CallData, _ctx: &MsgCtx) {
    take_cause(msg, call);
}

pub fn build_status(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    put_cause(w, call, ctx);
}

pub fn parse_status_enquiry(_msg: &DecodedMessage<'_>, _call: &mut CallData, _ctx: &MsgCtx) {}

pub fn build_status_enquiry(_call: &CallData, _ctx: &MsgCtx, _w: &mut IeWriter) {}

pub fn parse_timeout(_msg: &DecodedMessage<'_>, _call: &mut CallData, _ctx: &MsgCtx) {}

/// A timeout is answered with STATUS towards the peer
pub fn build_timeout(call: &CallData, ctx: &MsgCtx, w: &mut IeWriter) {
    build_status(call, ctx, w);
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{CHANNEL_NONE, Role, TrunkType, debug};
    use isdn_saps::Frame;

    use crate::ies::IeCtx;
    use crate::ies::cause::CAUSE_USER_BUSY;

    fn encode(f: fn(&CallData, &MsgCtx, &mut IeWriter), call: &CallData, ctx: &MsgCtx) -> Vec<u8> {
        let mut w = IeWriter::new(ctx.ie_ctx());
        f(call, ctx, &mut w);
        w.finish()
    }

    #[test]
    fn test_disconnect_cause_location_by_role() {
        debug::setup_logging_verbose();
        let mut call = CallData::default();
        call.out_cause = CAUSE_USER_BUSY;

        let te = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 1);
        assert_eq!(encode(build_disconnect, &call, &te), vec![0x08, 0x02, 0x80, 0x91]);

        let nt = MsgCtx::new(Role::Nt, TrunkType::Bri, 1, 1);
        let payload = encode(build_disconnect, &call, &nt);
        assert_eq!(payload, vec![0x08, 0x02, 0x81, 0x91, 0x1e, 0x02, 0x81, 0x88]);

        let frame = Frame::new(prim::CC_DISCONNECT | prim::INDICATION, 1, 1, payload);
        let mut back = CallData::default();
        parse_disconnect(&DecodedMessage::new(&frame, IeCtx::new(TrunkType::Bri)), &mut back, &te);
        assert_eq!(back.cause, Some(CAUSE_USER_BUSY));
        assert_eq!(back.cause_location, Some(1));
        assert_eq!(back.progress_indicator, 8);
    }

    #[test]
    fn test_release_complete_confirm_is_not_parsed() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 1);
        let payload = vec![0x08, 0x02, 0x80, 0x91];

        let confirm = Frame::new(prim::CC_RELEASE_COMPLETE | prim::CONFIRM, 1, 1, payload.clone());
        let mut call = CallData::default();
        parse_release_complete(&DecodedMessage::new(&confirm, ctx.ie_ctx()), &mut call, &ctx);
        assert_eq!(call.cause, None);

        let ind = Frame::new(prim::CC_RELEASE_COMPLETE | prim::INDICATION, 1, 1, payload);
        parse_release_complete(&DecodedMessage::new(&ind, ctx.ie_ctx()), &mut call, &ctx);
        assert_eq!(call.cause, Some(CAUSE_USER_BUSY));
    }

    #[test]
    fn test_restart_channel_pri() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Nt, TrunkType::Pri, 3, 0xff00);
        let mut call = CallData::default();
        call.restart_channel = 17;
        let payload = encode(build_restart, &call, &ctx);
        assert_eq!(payload, vec![0x18, 0x03, 0xa9, 0x83, 0x91]);

        let frame = Frame::new(prim::CC_RESTART | prim::INDICATION, 3, 0xff00, payload);
        let mut back = CallData::default();
        parse_restart(&DecodedMessage::new(&frame, ctx.ie_ctx()), &mut back, &ctx);
        assert_eq!(back.restart_channel, 17);
        assert_eq!(back.channel, CHANNEL_NONE);
    }
}
