use std::sync::Arc;
use std::time::Duration;

use as_any::AsAny;
use isdn_config::{CfgPort, SharedConfig, StackConfig, StackState};
use isdn_core::{Role, TrunkType};
use isdn_entities::transport::LoopbackTransport;
use isdn_entities::{IsdnManager, StackInfo, Transport};
use isdn_pdus::enums::event::Event;

use super::sink::{Recorded, Sink};

/// Upper bound on read/write rounds before a test is considered stuck
const MAX_ROUNDS: usize = 1000;

/// Terminal on port 1, network side on port 2, both basic rate
pub fn default_test_config() -> StackConfig {
    StackConfig::new(vec![
        CfgPort::new(1, Role::Te, TrunkType::Bri),
        CfgPort::new(2, Role::Nt, TrunkType::Bri),
    ])
}

/// A manager over a loopback device. The first two configured ports are wired back to back.
/// Nothing runs in the background: `deliver_all` moves frames until both directions are quiet.
pub struct ComponentTest {
    pub config: SharedConfig,
    pub loopback: Arc<LoopbackTransport>,
    pub mgr: IsdnManager,
}

impl ComponentTest {
    pub fn new(config: StackConfig, sink: Sink) -> Self {
        let config = SharedConfig::from_parts(config, StackState::default()).unwrap();
        let infos: Vec<StackInfo> = config
            .config()
            .ports
            .iter()
            .map(|p| StackInfo::new(p.port, p.role, p.trunk, p.ptp))
            .collect();
        let loopback = Arc::new(LoopbackTransport::new(infos.clone()));
        if let [a, b, ..] = infos.as_slice() {
            loopback.connect(a.port, b.port);
        }
        let transport: Arc<dyn Transport> = loopback.clone();
        let mgr = IsdnManager::new(config.clone(), transport, Box::new(sink)).unwrap();
        Self { config, loopback, mgr }
    }

    /// Writes queued frames and feeds back whatever the device produced, until neither happens.
    /// Returns the number of frames read.
    pub fn deliver_all(&self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_ROUNDS {
            let written = self.mgr.flush_queues();
            let mut read = 0;
            while let Ok(Some(frame)) = self.loopback.read(Duration::ZERO) {
                self.mgr.handle_frame(frame);
                read += 1;
            }
            total += read;
            if written == 0 && read == 0 {
                return total;
            }
        }
        panic!("frames still moving after {} rounds", MAX_ROUNDS);
    }

    /// Activates layers 1 and 2 on every port
    pub fn bring_up(&self) {
        for port in self.mgr.ports() {
            self.mgr.get_port_up(port).unwrap();
        }
        self.deliver_all();
        self.take_events();
    }

    pub fn with_sink<R>(&self, f: impl FnOnce(&mut Sink) -> R) -> R {
        self.mgr
            .with_app(|app| f(app.as_any_mut().downcast_mut::<Sink>().expect("application is a Sink")))
    }

    pub fn take_events(&self) -> Vec<Recorded> {
        self.with_sink(|s| s.take_events())
    }

    /// Events recorded on `port`, in order
    pub fn events_on(events: &[Recorded], port: u8) -> Vec<Event> {
        events.iter().filter(|r| r.port() == port).map(|r| r.event).collect()
    }

    /// First recording of `event` on `port`
    pub fn find(events: &[Recorded], port: u8, event: Event) -> Option<&Recorded> {
        events.iter().find(|r| r.port() == port && r.event == event)
    }

    pub fn details(&self, port: u8) -> String {
        self.mgr.stack_details(port).unwrap()
    }
}
