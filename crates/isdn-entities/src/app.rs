use std::collections::VecDeque;

use as_any::AsAny;
use isdn_pdus::enums::event::Event;

use crate::stack::call_context::{CallContext, CallHandle};

/// What the application wants done with an incoming SETUP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResponse {
    #[default]
    Ok,
    /// Drop the call: its channel and context are emptied
    IgnoreSetup,
    /// Pretend the SETUP never arrived, leave everything as is
    IgnoreSetupWithoutClose,
}

/// Work the application requests from inside a callback. Callbacks run with the
/// interface locked, so these are carried out once the callback has returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SendEvent { call: CallHandle, event: Event },
    Release(CallHandle),
    Bridge(CallHandle, CallHandle),
    Split(CallHandle, CallHandle),
}

#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self { actions: VecDeque::new() }
    }

    pub fn push_back(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    /// Shorthand for the common case of answering a call
    pub fn send(&mut self, call: &CallHandle, event: Event) {
        self.push_back(Action::SendEvent { call: call.clone(), event });
    }

    pub fn pop_front(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Callbacks from the stack into the call-control application
pub trait IsdnApp: Send + AsAny {
    /// An event for `call`. The context may be inspected and its call data edited;
    /// anything that sends frames goes through `actions`.
    /// The response only matters for SETUP.
    fn cb_event(&mut self, actions: &mut ActionQueue, event: Event, call: &mut CallContext) -> EventResponse;

    /// Per-port diagnostics, also written to the tracing log
    fn log(&mut self, _port: u8, _msg: &str) {}

    /// Audio to transmit on a B-channel that just delivered `len` bytes.
    /// None sends nothing until the application has caught up.
    fn jitter_drain(&mut self, _call: &CallContext, _len: usize) -> Option<Vec<u8>> {
        None
    }
}
