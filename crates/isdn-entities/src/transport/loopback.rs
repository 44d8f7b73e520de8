//! In-process device that crosses the D-channels of two ports, so a stack can call itself.
//! Requests on one port arrive as indications on its peer; link activation is confirmed
//! locally and indicated to the peer; B-channel activation is confirmed on the spot.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use isdn_core::Role;
use isdn_saps::addr;
use isdn_saps::{Frame, prim};

use super::{StackInfo, Transport, TransportErr};

pub struct LoopbackTransport {
    ports: Vec<StackInfo>,
    peers: Mutex<HashMap<u8, u8>>,
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    /// Every frame written, for inspection
    written: Mutex<Vec<Frame>>,
    layers: Mutex<HashSet<u32>>,
    fail_layers: AtomicBool,
    closed: AtomicBool,
}

impl LoopbackTransport {
    pub fn new(ports: Vec<StackInfo>) -> Self {
        let (tx, rx) = unbounded::<Frame>();
        Self {
            ports,
            peers: Mutex::new(HashMap::new()),
            tx,
            rx,
            written: Mutex::new(Vec::new()),
            layers: Mutex::new(HashSet::new()),
            fail_layers: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Two ports wired back to back
    pub fn crossed(a: StackInfo, b: StackInfo) -> Self {
        let lo = Self::new(vec![a, b]);
        lo.connect(a.port, b.port);
        lo
    }

    pub fn connect(&self, a: u8, b: u8) {
        let mut peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        peers.insert(a, b);
        peers.insert(b, a);
    }

    /// Delivers `frame` as if the device had produced it
    pub fn inject(&self, frame: Frame) {
        let _ = self.tx.send(frame);
    }

    pub fn take_written(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.written.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Makes every following `new_layer` fail
    pub fn set_layer_failure(&self, fail: bool) {
        self.fail_layers.store(fail, Ordering::Relaxed);
    }

    pub fn layer_count(&self) -> usize {
        self.layers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn peer_of(&self, port: u8) -> Option<StackInfo> {
        let peer = *self.peers.lock().unwrap_or_else(|e| e.into_inner()).get(&port)?;
        self.stack_info(peer)
    }

    fn push(&self, prim: u32, addr: u32, dinfo: u32, payload: Vec<u8>) {
        let _ = self.tx.send(Frame::new(prim, addr, dinfo, payload));
    }

    fn write_bchannel(&self, frame: &Frame) {
        match frame.prim {
            p if p == prim::DL_ESTABLISH | prim::REQUEST => {
                self.push(prim::DL_ESTABLISH | prim::CONFIRM, frame.addr, 0, Vec::new());
            }
            p if p == prim::DL_RELEASE | prim::REQUEST => {
                self.push(prim::DL_RELEASE | prim::CONFIRM, frame.addr, 0, Vec::new());
            }
            _ => tracing::trace!("loopback: b-channel {}", frame),
        }
    }

    fn write_link(&self, frame: &Frame, peer: Option<StackInfo>) {
        let port = frame.port();
        self.push(frame.command() | prim::CONFIRM, addr::port_addr(port), 0, Vec::new());
        if let Some(peer) = peer {
            self.push(frame.command() | prim::INDICATION, addr::port_addr(peer.port), 0, Vec::new());
        }
    }

    fn write_call_control(&self, frame: &Frame, peer: Option<StackInfo>) {
        let Some(peer) = peer else {
            tracing::debug!("loopback: port {} has no peer, dropping {}", frame.port(), frame);
            return;
        };
        let peer_addr = addr::port_addr(peer.port);

        // A terminal learns about an incoming call reference before the SETUP
        if frame.prim == prim::CC_SETUP | prim::REQUEST && peer.role == Role::Te {
            self.push(prim::CC_NEW_CR | prim::INDICATION, peer_addr, frame.dinfo, Vec::new());
        }

        let up = if frame.prim == prim::CC_CONNECT | prim::RESPONSE {
            prim::CC_CONNECT_ACKNOWLEDGE | prim::INDICATION
        } else {
            frame.command() | prim::INDICATION
        };
        self.push(up, peer_addr, frame.dinfo, frame.payload.clone());

        // The call reference is gone on both sides once the call is cleared
        if frame.prim == prim::CC_RELEASE_COMPLETE | prim::REQUEST {
            self.push(prim::CC_RELEASE_CR | prim::INDICATION, peer_addr, frame.dinfo, Vec::new());
            self.push(
                prim::CC_RELEASE_CR | prim::INDICATION,
                addr::port_addr(frame.port()),
                frame.dinfo,
                Vec::new(),
            );
        }
    }
}

impl Transport for LoopbackTransport {
    fn read(&self, timeout: Duration) -> Result<Option<Frame>, TransportErr> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TransportErr::Closed);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportErr::Closed),
        }
    }

    fn write(&self, frame: Frame) -> Result<(), TransportErr> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TransportErr::Closed);
        }
        tracing::trace!("loopback <- {}", frame);

        if frame.is_bchannel() {
            self.write_bchannel(&frame);
        } else {
            let peer = self.peer_of(frame.port());
            match frame.command() {
                prim::PH_ACTIVATE | prim::DL_ESTABLISH | prim::DL_RELEASE if frame.qualifier() == prim::REQUEST => {
                    self.write_link(&frame, peer);
                }
                // Call references are owned by the device, nothing to answer
                prim::CC_NEW_CR | prim::CC_RELEASE_CR => {}
                c if prim::is_call_control(c) => self.write_call_control(&frame, peer),
                _ => tracing::trace!("loopback: ignoring {}", frame),
            }
        }

        self.written.lock().unwrap_or_else(|e| e.into_inner()).push(frame);
        Ok(())
    }

    fn stack_count(&self) -> usize {
        self.ports.iter().map(|p| p.port as usize).max().unwrap_or(0)
    }

    fn stack_info(&self, port: u8) -> Option<StackInfo> {
        self.ports.iter().find(|p| p.port == port).copied()
    }

    fn new_layer(&self, port: u8, channel: u8) -> Result<u32, TransportErr> {
        if self.fail_layers.load(Ordering::Relaxed) {
            return Err(TransportErr::LayerFailed { port, channel });
        }
        if self.stack_info(port).is_none() {
            return Err(TransportErr::UnknownPort(port));
        }
        let a = addr::bchannel_addr(port, channel);
        self.layers.lock().unwrap_or_else(|e| e.into_inner()).insert(a);
        Ok(a)
    }

    fn del_layer(&self, addr: u32) -> Result<(), TransportErr> {
        if !self.layers.lock().unwrap_or_else(|e| e.into_inner()).remove(&addr) {
            tracing::debug!("loopback: layer 0x{:x} was not assigned", addr);
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::{TrunkType, debug};

    fn pair() -> LoopbackTransport {
        LoopbackTransport::crossed(
            StackInfo::new(1, Role::Te, TrunkType::Bri, false),
            StackInfo::new(2, Role::Nt, TrunkType::Bri, false),
        )
    }

    fn drain(lo: &LoopbackTransport) -> Vec<Frame> {
        let mut v = Vec::new();
        while let Ok(Some(f)) = lo.read(Duration::ZERO) {
            v.push(f);
        }
        v
    }

    #[test]
    fn test_link_activation_is_confirmed_and_indicated() {
        debug::setup_logging_verbose();
        let lo = pair();
        lo.write(Frame::control(prim::PH_ACTIVATE | prim::REQUEST, 1, 0)).unwrap();
        let got = drain(&lo);
        assert_eq!(got.len(), 2);
        assert_eq!((got[0].prim, got[0].port()), (prim::PH_ACTIVATE | prim::CONFIRM, 1));
        assert_eq!((got[1].prim, got[1].port()), (prim::PH_ACTIVATE | prim::INDICATION, 2));
    }

    #[test]
    fn test_setup_towards_terminal_gets_new_cr() {
        debug::setup_logging_verbose();
        let lo = pair();
        lo.write(Frame::new(prim::CC_SETUP | prim::REQUEST, 2, 0xff00, vec![0xa1])).unwrap();
        let got = drain(&lo);
        assert_eq!(got[0], Frame::control(prim::CC_NEW_CR | prim::INDICATION, 1, 0xff00));
        assert_eq!(got[1], Frame::new(prim::CC_SETUP | prim::INDICATION, 1, 0xff00, vec![0xa1]));

        lo.write(Frame::control(prim::CC_SETUP | prim::REQUEST, 1, 0x10001)).unwrap();
        let got = drain(&lo);
        assert_eq!(got, vec![Frame::control(prim::CC_SETUP | prim::INDICATION, 2, 0x10001)]);
    }

    #[test]
    fn test_release_complete_frees_both_call_refs() {
        debug::setup_logging_verbose();
        let lo = pair();
        lo.write(Frame::control(prim::CC_RELEASE_COMPLETE | prim::REQUEST, 1, 7)).unwrap();
        let prims: Vec<(u32, u8)> = drain(&lo).iter().map(|f| (f.prim, f.port())).collect();
        assert_eq!(
            prims,
            vec![
                (prim::CC_RELEASE_COMPLETE | prim::INDICATION, 2),
                (prim::CC_RELEASE_CR | prim::INDICATION, 2),
                (prim::CC_RELEASE_CR | prim::INDICATION, 1),
            ]
        );
        assert_eq!(lo.take_written().len(), 1);
    }

    #[test]
    fn test_layers_and_close() {
        debug::setup_logging_verbose();
        let lo = pair();
        let a = lo.new_layer(1, 2).unwrap();
        assert_eq!(a, addr::bchannel_addr(1, 2));
        assert_eq!(lo.layer_count(), 1);
        lo.set_layer_failure(true);
        assert_eq!(lo.new_layer(1, 1), Err(TransportErr::LayerFailed { port: 1, channel: 1 }));
        lo.del_layer(a).unwrap();
        assert_eq!(lo.layer_count(), 0);
        assert_eq!(lo.new_layer(9, 1).is_err(), true);
        lo.close();
        assert_eq!(lo.read(Duration::ZERO), Err(TransportErr::Closed));
    }
}
