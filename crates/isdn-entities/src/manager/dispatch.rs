//! Inbound classification chain: timers, management, layer 2, layer 1, B-channels, then
//! call control by interface role. Whatever falls through is logged and dropped.

use isdn_core::{CHANNEL_ANY, CHANNEL_NONE};
use isdn_pdus::enums::bearer_capability::Capability;
use isdn_pdus::enums::event::Event;
use isdn_pdus::ies::cause::{CAUSE_FACILITY_NOT_IMPLEMENTED, CAUSE_INVALID_CALLREF};
use isdn_pdus::messages::parse_frame;
use isdn_saps::{Frame, prim};

use super::{IsdnManager, lock};
use crate::app::EventResponse;
use crate::stack::bchan_fsm::BchanState;
use crate::stack::call_context::CallContext;
use crate::stack::{CallLoc, InterfaceStack, ResolvedCall};

impl IsdnManager {
    pub(super) fn dispatch_frame(&self, frame: &Frame) {
        tracing::trace!("-> {}", frame);
        if Self::handle_timers(frame) || Self::handle_mgmt(frame) {
            return;
        }

        let port = frame.port();
        let Some(stack) = self.inner.stacks.get(&port) else {
            tracing::debug!("frame for unconfigured port {}: {}", port, frame);
            return;
        };
        let mut st = lock(stack);

        // Layer 1 goes after layer 2, its handler may act on the layer 2 state
        if self.handle_l2(&mut st, frame) || self.handle_l1(&mut st, frame) || self.handle_bchan(&mut st, frame) {
            return;
        }

        let handled = if st.is_nt() {
            self.handle_frm_nt(&mut st, frame)
        } else {
            self.handle_cr(&mut st, frame) || self.handle_frm(&mut st, frame)
        };
        if !handled {
            tracing::debug!(port, "Unhandled {}", frame);
        }
    }

    /// Timers run inside the external layer 2/3 engine; their frames only get logged
    fn handle_timers(frame: &Frame) -> bool {
        match frame.command() {
            prim::MGR_INITTIMER | prim::MGR_ADDTIMER | prim::MGR_DELTIMER | prim::MGR_REMOVETIMER | prim::MGR_TIMER => {
                tracing::trace!("timer frame {}", frame);
                true
            }
            _ => false,
        }
    }

    fn handle_mgmt(frame: &Frame) -> bool {
        if !prim::is_mgmt(frame.prim) {
            return false;
        }
        if frame.command() == prim::MGR_SHORTSTATUS {
            tracing::debug!(port = frame.port(), "short status dinfo 0x{:x}", frame.dinfo);
        } else {
            tracing::trace!("management frame {}", frame);
        }
        true
    }

    fn handle_l2(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        if frame.is_bchannel() {
            return false;
        }
        match (frame.command(), frame.qualifier()) {
            (prim::DL_ESTABLISH, prim::CONFIRM | prim::INDICATION) => {
                tracing::info!(port = st.port, "layer 2 up");
                st.l2_up = true;
                true
            }
            (prim::DL_RELEASE, prim::CONFIRM | prim::INDICATION) => {
                tracing::info!(port = st.port, "layer 2 down");
                st.l2_up = false;
                if st.is_nt() && self.inner.config.config().general.clear_l3_on_l2_release {
                    self.clear_l3(st);
                }
                true
            }
            _ => false,
        }
    }

    fn handle_l1(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        if frame.is_bchannel() {
            return false;
        }
        match (frame.command(), frame.qualifier()) {
            (prim::PH_ACTIVATE, prim::CONFIRM | prim::INDICATION) => {
                tracing::info!(port = st.port, "layer 1 up");
                st.l1_up = true;
                self.fire_queued(st);
                true
            }
            (prim::PH_DEACTIVATE, prim::CONFIRM | prim::INDICATION) => {
                tracing::info!(port = st.port, "layer 1 down");
                st.l1_up = false;
                st.l2_up = false;
                let transport = self.inner.transport.as_ref();
                for i in 0..st.pool.len() {
                    if !st.pool[i].in_use {
                        continue;
                    }
                    self.fire(&mut st.pool[i], Event::CleanUp);
                    let l3id = st.pool[i].l3id;
                    if st.is_nt() {
                        st.call_refs.free(l3id);
                    }
                    st.wipe(CallLoc::Pool(i), transport, true);
                }
                true
            }
            _ => false,
        }
    }

    /// Sends everything that waited for layer 1
    fn fire_queued(&self, st: &mut InterfaceStack) {
        for i in 0..st.pool.len() {
            let events = std::mem::take(&mut st.pool[i].queued_events);
            for event in events {
                tracing::debug!(port = st.port, "sending queued {}", event);
                if let Err(e) = self.send_event_locked(st, CallLoc::Pool(i), event) {
                    tracing::warn!(port = st.port, "queued {} failed: {}", event, e);
                }
            }
        }
    }

    fn handle_bchan(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        if !frame.is_bchannel() {
            return false;
        }
        let Some(loc) = st.find_by_addr(frame.addr) else {
            tracing::debug!(port = st.port, "no call on b-channel 0x{:x}: {}", frame.addr, frame);
            return true;
        };

        match (frame.command(), frame.qualifier()) {
            (prim::PH_ACTIVATE | prim::DL_ESTABLISH, prim::CONFIRM | prim::INDICATION) => {
                self.bchannel_activated(st.call_mut(loc));
            }
            (prim::PH_DEACTIVATE | prim::DL_RELEASE, prim::CONFIRM | prim::INDICATION) => {
                let ctx = st.call_mut(loc);
                tracing::debug!(port = ctx.port, "b-channel 0x{:x} deactivated", frame.addr);
                ctx.active = false;
                if matches!(ctx.state, BchanState::Activated | BchanState::Bridged) {
                    ctx.set_state(BchanState::Setuped);
                }
            }
            (prim::PH_CONTROL, prim::INDICATION) => {
                let Some(word) = frame.payload_u32() else {
                    tracing::debug!(port = st.port, "empty PH_CONTROL on 0x{:x}", frame.addr);
                    return true;
                };
                if word & !prim::DTMF_TONE_MASK == prim::DTMF_TONE_VAL {
                    let ctx = st.call_mut(loc);
                    let tone = (word & prim::DTMF_TONE_MASK) as u8 as char;
                    tracing::debug!(port = ctx.port, "DTMF '{}'", tone);
                    ctx.dtmf = Some(tone);
                    self.fire(ctx, Event::DtmfTone);
                } else {
                    tracing::trace!(port = st.port, "PH_CONTROL 0x{:x}", word);
                }
            }
            (prim::DL_DATA | prim::PH_DATA, prim::INDICATION) => self.bchan_data(st, loc, frame),
            _ => tracing::trace!(port = st.port, "b-channel frame {}", frame),
        }
        true
    }

    /// Received audio; an active speech call gets the application's jitter buffer sent back
    fn bchan_data(&self, st: &mut InterfaceStack, loc: CallLoc, frame: &Frame) {
        let ctx = st.call_mut(loc);
        ctx.bframe = frame.payload.clone();
        let tx = if ctx.active && ctx.data.capability == Capability::Speech {
            lock(&self.inner.app).jitter_drain(ctx, frame.payload.len())
        } else {
            None
        };
        if let Some(tx) = tx {
            st.downqueue.push_back(Frame::new(prim::DL_DATA | prim::REQUEST, frame.addr, 0, tx));
        }
        self.fire(st.call_mut(loc), Event::BchanData);
    }

    /// Call reference frames on a terminal interface
    fn handle_cr(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        let l3id = frame.dinfo;
        match (frame.command(), frame.qualifier()) {
            (prim::CC_NEW_CR, prim::INDICATION) => {
                if st.find_by_l3id(l3id).is_some() {
                    tracing::debug!(port = st.port, "l3id 0x{:x} already known", l3id);
                    return true;
                }
                match st.acquire(CHANNEL_NONE) {
                    Some(slot) => {
                        let pid = self.next_pid();
                        let ctx = &mut st.pool[slot];
                        ctx.l3id = l3id;
                        ctx.pid = pid;
                        tracing::debug!(port = st.port, "new incoming l3id 0x{:x}", l3id);
                    }
                    None => tracing::warn!(port = st.port, "no free context for l3id 0x{:x}", l3id),
                }
                true
            }
            (prim::CC_NEW_CR, _) => {
                tracing::trace!(port = st.port, "new call reference 0x{:x} confirmed", l3id);
                true
            }
            (prim::CC_RELEASE_CR, prim::INDICATION | prim::CONFIRM) => {
                match st.find_by_l3id(l3id) {
                    Some(loc) => {
                        tracing::debug!(port = st.port, "call reference 0x{:x} released", l3id);
                        self.drop_call(st, loc);
                    }
                    None => tracing::trace!(port = st.port, "release of unknown call reference 0x{:x}", l3id),
                }
                true
            }
            _ => false,
        }
    }

    /// Call control on a terminal interface
    fn handle_frm(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        if !prim::is_call_control(frame.prim) {
            return false;
        }
        let call = st.resolve(frame.dinfo);
        self.process_call_frame(st, frame, call)
    }

    /// Parses a call-control frame into its context and hands the event on
    pub(super) fn process_call_frame(&self, st: &mut InterfaceStack, frame: &Frame, mut call: ResolvedCall) -> bool {
        let msg_ctx = st.msg_ctx(frame.dinfo);
        let ctx = st.resolved_mut(&mut call);
        let had_channel = !ctx.channel_open();
        let event = parse_frame(frame, &mut ctx.data, &msg_ctx);
        if event == Event::Unknown {
            return false;
        }

        match call {
            ResolvedCall::Bound(loc) => self.bound_event(st, loc, event, had_channel),
            ResolvedCall::Ephemeral(mut ctx) => self.ephemeral_event(st, &mut ctx, event),
        }
        true
    }

    fn bound_event(&self, st: &mut InterfaceStack, loc: CallLoc, event: Event, had_channel: bool) {
        if event == Event::Hold && !st.cfg.hold_allowed {
            let l3id = st.call(loc).l3id;
            tracing::info!(port = st.port, "hold not allowed, rejecting l3id 0x{:x}", l3id);
            self.reply(st, l3id, Event::HoldReject, CAUSE_FACILITY_NOT_IMPLEMENTED);
            return;
        }

        let loc = match (loc, event) {
            (CallLoc::Held(idx), Event::Retrieve | Event::RetrieveAcknowledge) => match st.unhold(idx) {
                Some(slot) => {
                    let loc = CallLoc::Pool(slot);
                    self.fire(st.call_mut(loc), Event::NewBc);
                    loc
                }
                None => {
                    tracing::warn!(port = st.port, "no free context to retrieve into");
                    loc
                }
            },
            _ => loc,
        };

        self.take_peer_channel(st, loc, event);

        let ctx = st.call_mut(loc);
        if !had_channel && !ctx.channel_open() && event != Event::Setup {
            self.fire(ctx, Event::NewChannel);
        }

        let resp = self.fire(st.call_mut(loc), event);
        match (event, resp) {
            (Event::Setup, EventResponse::IgnoreSetup) => {
                tracing::info!(port = st.port, "application ignores SETUP, dropping {}", st.call(loc));
                st.wipe(loc, self.inner.transport.as_ref(), false);
            }
            (Event::Setup, EventResponse::IgnoreSetupWithoutClose) => {
                tracing::debug!(port = st.port, "application ignores SETUP, context kept");
            }
            (Event::ReleaseComplete, _) => self.drop_call(st, loc),
            _ => {}
        }
    }

    /// Channel bookkeeping for a message from the peer
    fn take_peer_channel(&self, st: &mut InterfaceStack, loc: CallLoc, event: Event) {
        match event {
            Event::Setup | Event::Connect => st.mark_channel(loc),
            Event::Alerting
            | Event::Progress
            | Event::Proceeding
            | Event::SetupAcknowledge
            | Event::RetrieveAcknowledge => {
                if st.call(loc).channel() == CHANNEL_ANY {
                    if let Err(e) = st.alloc_channel(loc) {
                        tracing::warn!(port = st.port, "{}: no channel: {:?}", event, e);
                    }
                } else {
                    st.mark_channel(loc);
                }
            }
            _ => return,
        }
        if event != Event::Setup && matches!(loc, CallLoc::Pool(_)) {
            self.setup_bc(st, loc);
        }
    }

    /// A frame whose call reference matches nothing. Release messages still free the channel they name.
    fn ephemeral_event(&self, st: &mut InterfaceStack, ctx: &mut CallContext, event: Event) {
        self.fire(ctx, event);
        if !matches!(event, Event::Disconnect | Event::Release | Event::ReleaseComplete) {
            return;
        }

        let ch = ctx.channel();
        if ch != CHANNEL_NONE
            && ch != CHANNEL_ANY
            && !st.channels.is_free(ch)
            && !st.pool.iter().any(|c| c.in_use && c.data.channel == ch)
        {
            tracing::info!(port = st.port, "freeing orphaned channel {}", ch);
            if let Err(e) = st.channels.release(ch) {
                tracing::warn!(port = st.port, "channel {}: {:?}", ch, e);
            }
        }
        if event == Event::Release {
            self.reply(st, ctx.l3id, Event::ReleaseComplete, CAUSE_INVALID_CALLREF);
        }
    }
}
