use isdn_entities::{ActionQueue, CallContext, CallHandle, EventResponse, IsdnApp};
use isdn_pdus::enums::event::Event;

/// One callback as the application saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub event: Event,
    pub ctx: CallContext,
}

impl Recorded {
    pub fn port(&self) -> u8 {
        self.ctx.port
    }

    pub fn handle(&self) -> CallHandle {
        self.ctx.handle()
    }
}

/// Application that records every event and answers from a fixed script
#[derive(Default)]
pub struct Sink {
    events: Vec<Recorded>,
    /// (port, event received, event sent back)
    answers: Vec<(u8, Event, Event)>,
    setup_response: EventResponse,
    logs: Vec<(u8, String)>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `port` sees `on`, send `reply` on the same call
    pub fn answer(mut self, port: u8, on: Event, reply: Event) -> Self {
        self.answers.push((port, on, reply));
        self
    }

    pub fn respond_to_setup(mut self, resp: EventResponse) -> Self {
        self.setup_response = resp;
        self
    }

    pub fn take_events(&mut self) -> Vec<Recorded> {
        std::mem::take(&mut self.events)
    }

    pub fn logs(&self) -> &[(u8, String)] {
        &self.logs
    }
}

impl IsdnApp for Sink {
    fn cb_event(&mut self, actions: &mut ActionQueue, event: Event, call: &mut CallContext) -> EventResponse {
        self.events.push(Recorded {
            event,
            ctx: call.clone(),
        });
        for (port, on, reply) in &self.answers {
            if *port == call.port && *on == event {
                actions.send(&call.handle(), *reply);
            }
        }
        if event == Event::Setup { self.setup_response } else { EventResponse::Ok }
    }

    fn log(&mut self, port: u8, msg: &str) {
        self.logs.push((port, msg.to_string()));
    }
}
