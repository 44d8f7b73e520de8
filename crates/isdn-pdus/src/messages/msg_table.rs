use isdn_saps::prim::{self, COMMAND_MASK, REQUEST};
use isdn_saps::{Frame, addr};

use super::call_clearing::*;
use super::call_misc::*;
use super::call_setup::*;
use super::{DecodedMessage, MsgCtx};
use crate::enums::event::Event;
use crate::ies::IeWriter;
use crate::structs::call_data::CallData;

pub type ParseFn = fn(&DecodedMessage<'_>, &mut CallData, &MsgCtx);
pub type BuildFn = fn(&CallData, &MsgCtx, &mut IeWriter);

/// One Q.931 message kind
pub struct MsgDef {
    /// Command part of the primitive, used for inbound lookup
    pub prim: u32,
    /// Full primitive put on outbound frames
    pub build_prim: u32,
    pub event: Event,
    pub name: &'static str,
    pub parse: ParseFn,
    pub build: BuildFn,
}

const fn def(prim: u32, event: Event, name: &'static str, parse: ParseFn, build: BuildFn) -> MsgDef {
    MsgDef {
        prim,
        build_prim: prim | REQUEST,
        event,
        name,
        parse,
        build,
    }
}

pub static MSG_TABLE: [MsgDef; 30] = [
    def(prim::CC_PROCEEDING, Event::Proceeding, "PROCEEDING", parse_proceeding, build_proceeding),
    def(prim::CC_ALERTING, Event::Alerting, "ALERTING", parse_alerting, build_alerting),
    def(prim::CC_PROGRESS, Event::Progress, "PROGRESS", parse_progress, build_progress),
    def(prim::CC_SETUP, Event::Setup, "SETUP", parse_setup, build_setup),
    def(prim::CC_CONNECT, Event::Connect, "CONNECT", parse_connect, build_connect),
    def(
        prim::CC_SETUP_ACKNOWLEDGE,
        Event::SetupAcknowledge,
        "SETUP_ACKNOWLEDGE",
        parse_setup_acknowledge,
        build_setup_acknowledge,
    ),
    // Acknowledging a connect is the response to its indication
    MsgDef {
        prim: prim::CC_CONNECT_ACKNOWLEDGE,
        build_prim: prim::CC_CONNECT | prim::RESPONSE,
        event: Event::ConnectAcknowledge,
        name: "CONNECT_ACKNOWLEDGE",
        parse: parse_connect_acknowledge,
        build: build_connect_acknowledge,
    },
    def(
        prim::CC_USER_INFORMATION,
        Event::UserInformation,
        "USER_INFORMATION",
        parse_user_information,
        build_user_information,
    ),
    def(prim::CC_SUSPEND_REJECT, Event::SuspendReject, "SUSPEND_REJECT", parse_reject, build_reject),
    def(prim::CC_RESUME_REJECT, Event::ResumeReject, "RESUME_REJECT", parse_reject, build_reject),
    def(prim::CC_HOLD, Event::Hold, "HOLD", parse_empty, build_empty),
    def(prim::CC_SUSPEND, Event::Suspend, "SUSPEND", parse_call_identity, build_call_identity),
    def(prim::CC_RESUME, Event::Resume, "RESUME", parse_call_identity, build_call_identity),
    def(prim::CC_HOLD_ACKNOWLEDGE, Event::HoldAcknowledge, "HOLD_ACKNOWLEDGE", parse_empty, build_empty),
    def(prim::CC_SUSPEND_ACKNOWLEDGE, Event::SuspendAcknowledge, "SUSPEND_ACKNOWLEDGE", parse_empty, build_empty),
    def(
        prim::CC_RESUME_ACKNOWLEDGE,
        Event::ResumeAcknowledge,
        "RESUME_ACKNOWLEDGE",
        parse_resume_acknowledge,
        build_resume_acknowledge,
    ),
    def(prim::CC_HOLD_REJECT, Event::HoldReject, "HOLD_REJECT", parse_reject, build_reject),
    def(prim::CC_RETRIEVE, Event::Retrieve, "RETRIEVE", parse_empty, build_empty),
    def(
        prim::CC_RETRIEVE_ACKNOWLEDGE,
        Event::RetrieveAcknowledge,
        "RETRIEVE_ACKNOWLEDGE",
        parse_retrieve_acknowledge,
        build_retrieve_acknowledge,
    ),
    def(prim::CC_RETRIEVE_REJECT, Event::RetrieveReject, "RETRIEVE_REJECT", parse_reject, build_reject),
    def(prim::CC_DISCONNECT, Event::Disconnect, "DISCONNECT", parse_disconnect, build_disconnect),
    def(prim::CC_RESTART, Event::Restart, "RESTART", parse_restart, build_restart),
    def(prim::CC_RELEASE, Event::Release, "RELEASE", parse_release, build_release),
    def(
        prim::CC_RELEASE_COMPLETE,
        Event::ReleaseComplete,
        "RELEASE_COMPLETE",
        parse_release_complete,
        build_release_complete,
    ),
    def(prim::CC_FACILITY, Event::Facility, "FACILITY", parse_facility, build_facility),
    def(prim::CC_NOTIFY, Event::Notify, "NOTIFY", parse_notify, build_notify),
    def(prim::CC_STATUS_ENQUIRY, Event::StatusEnquiry, "STATUS_ENQUIRY", parse_status_enquiry, build_status_enquiry),
    def(prim::CC_INFORMATION, Event::Information, "INFORMATION", parse_information, build_information),
    def(prim::CC_STATUS, Event::Status, "STATUS", parse_status, build_status),
    // Timeouts are reported by the layer below and answered with STATUS
    MsgDef {
        prim: prim::CC_TIMEOUT,
        build_prim: prim::CC_STATUS | prim::REQUEST,
        event: Event::Timeout,
        name: "TIMEOUT",
        parse: parse_timeout,
        build: build_timeout,
    },
];

/// Row for an inbound primitive, qualifier ignored
pub fn lookup_by_prim(prim: u32) -> Option<&'static MsgDef> {
    let cmd = prim & COMMAND_MASK;
    MSG_TABLE.iter().find(|d| d.prim == cmd)
}

pub fn lookup_by_event(event: Event) -> Option<&'static MsgDef> {
    MSG_TABLE.iter().find(|d| d.event == event)
}

/// Event for a primitive, `Event::Unknown` when no message matches
pub fn event_of(prim: u32) -> Event {
    lookup_by_prim(prim).map(|d| d.event).unwrap_or(Event::Unknown)
}

pub fn event_info(event: Event) -> &'static str {
    event.name()
}

/// Decodes a call-control frame into `call` and returns its event.
/// Frames without a table row leave `call` untouched.
pub fn parse_frame(frame: &Frame, call: &mut CallData, ctx: &MsgCtx) -> Event {
    let Some(def) = lookup_by_prim(frame.prim) else {
        tracing::debug!("no message for {}", frame);
        return Event::Unknown;
    };
    let msg = DecodedMessage::new(frame, ctx.ie_ctx());
    tracing::trace!("parse {} {}", def.name, msg);
    (def.parse)(&msg, call, ctx);
    def.event
}

/// Builds the outbound frame for `event`. None for events without a Q.931 message.
pub fn build_frame(event: Event, call: &CallData, ctx: &MsgCtx) -> Option<Frame> {
    let Some(def) = lookup_by_event(event) else {
        tracing::debug!("event {} has no message to build", event);
        return None;
    };
    let mut w = IeWriter::new(ctx.ie_ctx());
    (def.build)(call, ctx, &mut w);
    if w.omitted() > 0 {
        tracing::warn!("{} built without {} invalid IEs", def.name, w.omitted());
    }
    Some(Frame::new(def.build_prim, addr::port_addr(ctx.port), ctx.l3id, w.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, Role, TrunkType, debug};

    use crate::ies::channel_id::ChannelId;
    use crate::ies::cause::CAUSE_RESPONSE_TO_STATUS_ENQUIRY;

    #[test]
    fn test_table_is_consistent() {
        for (i, d) in MSG_TABLE.iter().enumerate() {
            assert_eq!(d.name, d.event.name());
            assert!(!d.event.is_internal());
            assert!(prim::is_call_control(d.prim));
            assert_eq!(d.prim & !COMMAND_MASK, 0);
            // Prims and events are unique
            assert!(MSG_TABLE[i + 1..].iter().all(|o| o.prim != d.prim && o.event != d.event));
            assert_eq!(lookup_by_event(d.event).map(|x| x.prim), Some(d.prim));
        }
    }

    #[test]
    fn test_lookup_ignores_qualifier() {
        for q in [prim::REQUEST, prim::CONFIRM, prim::INDICATION, prim::RESPONSE] {
            assert_eq!(event_of(prim::CC_SETUP | q), Event::Setup);
            assert_eq!(event_of(prim::CC_RELEASE_COMPLETE | q), Event::ReleaseComplete);
        }
        assert_eq!(event_of(prim::CC_NEW_CR | prim::INDICATION), Event::Unknown);
        assert_eq!(event_of(prim::PH_ACTIVATE | prim::INDICATION), Event::Unknown);
        assert_eq!(event_info(Event::CleanUp), "CLEAN_UP");
        assert_eq!(event_info(Event::NewL3Id), "NEW_L3ID");
        assert!(build_frame(Event::NewChannel, &CallData::default(), &MsgCtx::new(Role::Te, TrunkType::Bri, 1, 1)).is_none());
    }

    #[test]
    fn test_outbound_prims() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Te, TrunkType::Bri, 2, 0x10001);
        let call = CallData::default();

        let f = build_frame(Event::Alerting, &call, &ctx).unwrap();
        assert_eq!(f.prim, prim::CC_ALERTING | prim::REQUEST);
        assert_eq!(f.addr, addr::port_addr(2));
        assert_eq!(f.dinfo, 0x10001);

        let f = build_frame(Event::ConnectAcknowledge, &call, &ctx).unwrap();
        assert_eq!(f.prim, prim::CC_CONNECT | prim::RESPONSE);
    }

    #[test]
    fn test_timeout_builds_status() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Nt, TrunkType::Pri, 1, 0xff04);
        let mut call = CallData::default();
        call.out_cause = CAUSE_RESPONSE_TO_STATUS_ENQUIRY;

        let f = build_frame(Event::Timeout, &call, &ctx).unwrap();
        assert_eq!(f.prim, prim::CC_STATUS | prim::REQUEST);
        assert_eq!(f.payload, vec![0x08, 0x02, 0x81, 0x80 | CAUSE_RESPONSE_TO_STATUS_ENQUIRY]);

        // The peer sees a plain STATUS
        let mut back = CallData::default();
        let ind = Frame::new(prim::CC_STATUS | prim::INDICATION, f.addr, f.dinfo, f.payload);
        assert_eq!(parse_frame(&ind, &mut back, &ctx), Event::Status);
        assert_eq!(back.cause, Some(CAUSE_RESPONSE_TO_STATUS_ENQUIRY));
    }

    #[test]
    fn test_setup_then_setup_acknowledge() {
        debug::setup_logging_verbose();
        let te = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 0x10001);
        let nt = MsgCtx::new(Role::Nt, TrunkType::Bri, 2, 0xff00);

        let mut out = CallData::default();
        out.oad = "1000".to_string();
        out.dad = "2000".to_string();
        out.pres = 0;
        out.channel = CHANNEL_ANY;
        let f = build_frame(Event::Setup, &out, &te).unwrap();

        let ind = Frame::new(prim::CC_SETUP | prim::INDICATION, f.addr, f.dinfo, f.payload);
        let mut peer = CallData::default();
        assert_eq!(parse_frame(&ind, &mut peer, &nt), Event::Setup);
        assert_eq!(peer.oad, "1000");
        assert_eq!(peer.dad, "2000");
        assert_eq!(peer.pres, 0);
        assert_eq!(peer.channel, CHANNEL_NONE);
        let msg = DecodedMessage::new(&ind, nt.ie_ctx());
        assert_eq!(msg.ie::<ChannelId>(), Some(ChannelId::new(false, CHANNEL_ANY)));

        // The network assigns channel 1
        peer.channel = 1;
        let ack = build_frame(Event::SetupAcknowledge, &peer, &nt).unwrap();
        let ack_ind = Frame::new(prim::CC_SETUP_ACKNOWLEDGE | prim::INDICATION, ack.addr, f.dinfo, ack.payload);
        assert_eq!(parse_frame(&ack_ind, &mut out, &te), Event::SetupAcknowledge);
        assert_eq!(out.channel, 1);
        assert_eq!(out.progress_indicator, 8);
    }

    #[test]
    fn test_unknown_prim_leaves_call() {
        debug::setup_logging_verbose();
        let ctx = MsgCtx::new(Role::Te, TrunkType::Bri, 1, 1);
        let mut call = CallData::default();
        let f = Frame::new(0x03_9900 | prim::INDICATION, 1, 1, vec![0x08, 0x02, 0x80, 0x90]);
        assert_eq!(parse_frame(&f, &mut call, &ctx), Event::Unknown);
        assert_eq!(call, CallData::default());
    }
}
