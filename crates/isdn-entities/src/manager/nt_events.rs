//! Frames arriving on a network-side interface. The layer 2/3 engine below hands up call
//! reference changes and a few messages that need an answer before the application sees them.

use isdn_core::CHANNEL_NONE;
use isdn_pdus::enums::event::Event;
use isdn_pdus::ies::cause::{CAUSE_FACILITY_NOT_IMPLEMENTED, CAUSE_INVALID_CALLREF, CAUSE_NO_CHANNEL, CAUSE_NORMAL_CLEARING};
use isdn_saps::{Frame, prim};

use super::IsdnManager;
use crate::stack::call_ref::is_nt_local;
use crate::stack::{CallLoc, InterfaceStack, ResolvedCall};

/// Upper half of a call reference, the part that survives a reference change
const L3ID_UPPER_MASK: u32 = 0xffff_0000;

impl IsdnManager {
    pub(super) fn handle_frm_nt(&self, st: &mut InterfaceStack, frame: &Frame) -> bool {
        let l3id = frame.dinfo;
        match (frame.command(), frame.qualifier()) {
            (prim::CC_NEW_CR, prim::INDICATION) => {
                self.nt_new_cr(st, frame);
                true
            }
            (prim::CC_NEW_CR, _) => true,
            (prim::CC_RELEASE_CR, prim::INDICATION | prim::CONFIRM) => {
                if is_nt_local(l3id) {
                    st.call_refs.free(l3id);
                }
                if let Some(loc) = st.find_by_l3id(l3id) {
                    tracing::debug!(port = st.port, "call reference 0x{:x} released", l3id);
                    self.drop_call(st, loc);
                }
                true
            }
            (prim::CC_SETUP, prim::CONFIRM) => {
                // Our SETUP got a call reference from the engine, carried in the body
                match (st.find_by_l3id(l3id), frame.payload_u32()) {
                    (Some(loc), Some(new)) => {
                        let ctx = st.call_mut(loc);
                        tracing::debug!(port = ctx.port, "l3id 0x{:x} -> 0x{:x}", l3id, new);
                        ctx.l3id = new;
                        self.fire(ctx, Event::NewL3Id);
                    }
                    _ => tracing::warn!(port = st.port, "SETUP confirm for unknown l3id 0x{:x}", l3id),
                }
                true
            }
            (prim::CC_SETUP, prim::INDICATION) => {
                let Some(slot) = st.acquire(CHANNEL_NONE) else {
                    tracing::warn!(port = st.port, "no free context for SETUP l3id 0x{:x}", l3id);
                    self.reply(st, l3id, Event::ReleaseComplete, CAUSE_NO_CHANNEL);
                    return true;
                };
                let pid = self.next_pid();
                let ctx = &mut st.pool[slot];
                ctx.l3id = l3id;
                ctx.pid = pid;
                self.process_call_frame(st, frame, ResolvedCall::Bound(CallLoc::Pool(slot)))
            }
            (prim::CC_RETRIEVE, prim::INDICATION) => {
                let loc = match st.held.iter().position(|c| c.l3id == l3id) {
                    Some(idx) => st.unhold(idx).map(|slot| {
                        let loc = CallLoc::Pool(slot);
                        self.fire(st.call_mut(loc), Event::NewBc);
                        loc
                    }),
                    None => st.acquire(CHANNEL_NONE).map(|slot| {
                        st.pool[slot].l3id = l3id;
                        CallLoc::Pool(slot)
                    }),
                };
                match loc {
                    Some(loc) => self.process_call_frame(st, frame, ResolvedCall::Bound(loc)),
                    None => {
                        tracing::warn!(port = st.port, "no free context for RETRIEVE l3id 0x{:x}", l3id);
                        self.reply(st, l3id, Event::ReleaseComplete, CAUSE_NO_CHANNEL);
                        true
                    }
                }
            }
            (prim::CC_ALERTING | prim::CC_PROCEEDING | prim::CC_CONNECT, prim::INDICATION)
                if st.find_by_l3id(l3id).is_none() =>
            {
                tracing::info!(port = st.port, "{} for unknown l3id 0x{:x}, clearing", frame, l3id);
                self.reply(st, l3id, Event::ReleaseComplete, CAUSE_INVALID_CALLREF);
                true
            }
            (prim::CC_DISCONNECT, prim::INDICATION) if st.find_by_l3id(l3id).is_none() => {
                match st.find_by_masked_l3id(l3id, L3ID_UPPER_MASK) {
                    Some(loc) => {
                        let repaired = (l3id & L3ID_UPPER_MASK) | (st.call(loc).l3id & !L3ID_UPPER_MASK);
                        tracing::debug!(port = st.port, "DISCONNECT l3id 0x{:x} taken as 0x{:x}", l3id, repaired);
                        let fixed = Frame::new(frame.prim, frame.addr, repaired, frame.payload.clone());
                        self.process_call_frame(st, &fixed, ResolvedCall::Bound(loc))
                    }
                    None => {
                        let call = st.resolve(l3id);
                        self.process_call_frame(st, frame, call)
                    }
                }
            }
            (prim::CC_SUSPEND, prim::INDICATION) => {
                tracing::info!(port = st.port, "SUSPEND not supported, rejecting l3id 0x{:x}", l3id);
                self.reply(st, l3id, Event::SuspendReject, CAUSE_FACILITY_NOT_IMPLEMENTED);
                true
            }
            (prim::CC_RELEASE, prim::CONFIRM) => {
                // The engine wants RELEASE_COMPLETE sent, the application sees a plain RELEASE
                let cause = st.find_by_l3id(l3id).map(|loc| st.call(loc).data.out_cause);
                self.reply(st, l3id, Event::ReleaseComplete, cause.unwrap_or(CAUSE_NORMAL_CLEARING));
                let up = Frame::new(prim::CC_RELEASE | prim::INDICATION, frame.addr, l3id, frame.payload.clone());
                let call = st.resolve(l3id);
                self.process_call_frame(st, &up, call)
            }
            _ if prim::is_call_control(frame.prim) => {
                let call = st.resolve(l3id);
                self.process_call_frame(st, frame, call)
            }
            _ => false,
        }
    }

    /// The engine changed the reference of a call. An NT-local reference replaced by
    /// the peer's one gives its process id back.
    fn nt_new_cr(&self, st: &mut InterfaceStack, frame: &Frame) {
        let old = frame.dinfo;
        let Some(new) = frame.payload_u32() else {
            tracing::warn!(port = st.port, "NEW_CR for 0x{:x} without a new reference", old);
            return;
        };
        let Some(loc) = st.find_by_l3id(old) else {
            tracing::debug!(port = st.port, "NEW_CR for unknown l3id 0x{:x}", old);
            return;
        };
        if !is_nt_local(new) {
            st.call_refs.free(old);
        }
        let ctx = st.call_mut(loc);
        tracing::debug!(port = ctx.port, "l3id 0x{:x} -> 0x{:x}", old, new);
        ctx.l3id = new;
        self.fire(ctx, Event::NewL3Id);
    }
}
