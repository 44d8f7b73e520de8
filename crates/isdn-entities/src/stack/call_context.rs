use core::fmt;
use std::time::Instant;

use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, CallDirection, L3Id};
use isdn_pdus::enums::event::Event;
use isdn_pdus::structs::call_data::CallData;
use uuid::Uuid;

use super::bchan_fsm::{BchanState, transition_allowed};

/// Stable reference to a call context. The session id survives hold and
/// retrieve, when the context moves between the pool and the held list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallHandle {
    pub port: u8,
    pub session: Uuid,
}

impl fmt::Display for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}/{}", self.port, self.session.simple())
    }
}

/// One call attempt on an interface
#[derive(Debug, Clone)]
pub struct CallContext {
    pub session: Uuid,
    pub port: u8,
    /// Index in the interface pool, None for held and ephemeral contexts
    pub slot: Option<usize>,
    pub l3id: L3Id,
    pub in_use: bool,
    pub direction: CallDirection,
    /// The application asked for a specific channel
    pub channel_preselected: bool,
    pub prefer_descending: bool,
    /// The channel in `data.channel` is marked in the interface bitmap by this context
    pub channel_marked: bool,

    pub state: BchanState,
    /// Applied once activation completes
    pub next_state: Option<BchanState>,
    /// Address of the assigned B-channel sub-layer
    pub bchan_addr: Option<u32>,
    pub active: bool,

    pub data: CallData,

    /// Put on hold by the peer or the application
    pub held: bool,
    /// Lives on the held list rather than in the pool
    pub stack_holder: bool,
    pub conf_id: u32,
    pub pid: u32,

    /// Events waiting for layer 1 to come up
    pub queued_events: Vec<Event>,
    pub dtmf: Option<char>,
    /// Last B-channel frame received
    pub bframe: Vec<u8>,
    pub last_used: Instant,
}

impl CallContext {
    pub fn new(port: u8, slot: Option<usize>) -> Self {
        Self {
            session: Uuid::new_v4(),
            port,
            slot,
            l3id: 0,
            in_use: false,
            direction: CallDirection::Incoming,
            channel_preselected: false,
            prefer_descending: false,
            channel_marked: false,
            state: BchanState::Cleaned,
            next_state: None,
            bchan_addr: None,
            active: false,
            data: CallData::default(),
            held: false,
            stack_holder: false,
            conf_id: 0,
            pid: 0,
            queued_events: Vec::new(),
            dtmf: None,
            bframe: Vec::new(),
            last_used: Instant::now(),
        }
    }

    /// Stand-in for a frame whose call reference matches no context
    pub fn ephemeral(port: u8, l3id: L3Id) -> Self {
        let mut ctx = Self::new(port, None);
        ctx.l3id = l3id;
        ctx
    }

    pub fn handle(&self) -> CallHandle {
        CallHandle {
            port: self.port,
            session: self.session,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.slot.is_none() && !self.stack_holder
    }

    pub fn channel(&self) -> u8 {
        self.data.channel
    }

    /// Channel not decided yet, either nothing or "any" was requested
    pub fn channel_open(&self) -> bool {
        self.data.channel == CHANNEL_NONE || self.data.channel == CHANNEL_ANY
    }

    /// Moves to `to` if the state machine allows it. Refused transitions are logged and ignored.
    pub fn set_state(&mut self, to: BchanState) -> bool {
        if self.state == to {
            return true;
        }
        if !transition_allowed(self.state, to) {
            tracing::warn!(port = self.port, "l3id 0x{:x}: refusing {} -> {}", self.l3id, self.state, to);
            return false;
        }
        tracing::trace!(port = self.port, "l3id 0x{:x}: {} -> {}", self.l3id, self.state, to);
        self.state = to;
        true
    }

    /// Back to the canonical empty state. Pool position, session and call reference stay.
    pub fn empty(&mut self) {
        self.data.reset();
        self.in_use = false;
        self.direction = CallDirection::Incoming;
        self.channel_preselected = false;
        self.prefer_descending = false;
        self.channel_marked = false;
        self.active = false;
        self.next_state = None;
        self.held = false;
        self.conf_id = 0;
        self.queued_events.clear();
        self.dtmf = None;
        self.bframe.clear();
        self.last_used = Instant::now();
    }

    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call p{} l3id 0x{:x} pid {} ch {} {}{}{}",
            self.port,
            self.l3id,
            self.pid,
            self.data.channel,
            self.state,
            if self.held { " held" } else { "" },
            if self.in_use { "" } else { " idle" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::debug;

    #[test]
    fn test_empty_keeps_identity() {
        debug::setup_logging_verbose();
        let mut ctx = CallContext::new(1, Some(0));
        let handle = ctx.handle();
        ctx.l3id = 0x10003;
        ctx.in_use = true;
        ctx.data.oad = "1000".to_string();
        ctx.data.channel = 2;
        ctx.queued_events.push(Event::Setup);
        ctx.empty();
        assert_eq!(ctx.handle(), handle);
        assert_eq!(ctx.l3id, 0x10003);
        assert!(!ctx.in_use);
        assert!(ctx.data.oad.is_empty());
        assert_eq!(ctx.data.channel, CHANNEL_NONE);
        assert!(ctx.queued_events.is_empty());
    }

    #[test]
    fn test_refused_transition_keeps_state() {
        debug::setup_logging_verbose();
        let mut ctx = CallContext::new(1, Some(0));
        assert!(!ctx.set_state(BchanState::Bridged));
        assert_eq!(ctx.state, BchanState::Cleaned);
        assert!(ctx.set_state(BchanState::Empty));
        assert!(ctx.set_state(BchanState::Setup));
        assert!(ctx.set_state(BchanState::Activated));
        assert!(ctx.set_state(BchanState::Bridged));
        assert!(!ctx.is_ephemeral());
        assert!(CallContext::ephemeral(1, 5).is_ephemeral());
    }
}
