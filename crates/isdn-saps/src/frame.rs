use core::fmt;
use std::time::Duration;

use isdn_core::L3Id;

use crate::addr;
use crate::prim;

/// Attempts made to get a frame buffer before giving up
pub const ALLOC_RETRIES: usize = 10;
pub const ALLOC_RETRY_SLEEP: Duration = Duration::from_millis(300);

/// Default payload capacity for signalling frames
pub const FRAME_DEFAULT_CAPACITY: usize = 260;

/// One primitive crossing the transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Primitive code, command plus qualifier
    pub prim: u32,
    /// Routing address, see [`crate::addr`]
    pub addr: u32,
    /// Call-scoped tag: the layer-3 id for call control frames
    pub dinfo: L3Id,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(prim: u32, addr: u32, dinfo: L3Id, payload: Vec<u8>) -> Self {
        Self { prim, addr, dinfo, payload }
    }

    /// Frame without payload
    pub fn control(prim: u32, addr: u32, dinfo: L3Id) -> Self {
        Self::new(prim, addr, dinfo, Vec::new())
    }

    pub fn command(&self) -> u32 {
        prim::command(self.prim)
    }

    pub fn qualifier(&self) -> u32 {
        prim::qualifier(self.prim)
    }

    pub fn port(&self) -> u8 {
        addr::addr_port(self.addr)
    }

    pub fn is_bchannel(&self) -> bool {
        addr::is_bchannel_addr(self.addr)
    }

    /// Frames that are all zero or carry the invalid primitive are noise from the device
    pub fn is_garbage(&self) -> bool {
        self.prim == 0xffff_ffff || (self.prim == 0 && self.addr == 0 && self.dinfo == 0 && self.payload.iter().all(|b| *b == 0))
    }

    /// PH_CONTROL request with a control word and its argument, both little endian
    pub fn ph_control(addr: u32, word: u32, arg: u32) -> Self {
        let mut payload = alloc_payload(8);
        payload.extend_from_slice(&word.to_le_bytes());
        payload.extend_from_slice(&arg.to_le_bytes());
        Self::new(prim::PH_CONTROL | prim::REQUEST, addr, 0, payload)
    }

    /// Leading u32 of the payload, little endian. Used by frames that carry a new layer-3 id in their body.
    pub fn payload_u32(&self) -> Option<u32> {
        let b = self.payload.get(0..4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prim 0x{:06x} ({}|{}) addr 0x{:x} dinfo 0x{:x} len {}",
            self.prim,
            prim::layer_name(self.prim),
            prim::qualifier_name(self.prim),
            self.addr,
            self.dinfo,
            self.payload.len()
        )
    }
}

/// Allocates a payload buffer, retrying a few times with a fixed sleep.
/// Running out of memory for signalling frames leaves the process with no consistent
/// call state, so exhaustion ends the process.
pub fn alloc_payload(capacity: usize) -> Vec<u8> {
    for attempt in 0..ALLOC_RETRIES {
        let mut buf = Vec::new();
        match buf.try_reserve(capacity) {
            Ok(()) => return buf,
            Err(e) => {
                tracing::warn!("frame alloc of {} bytes failed (attempt {}): {}", capacity, attempt + 1, e);
                std::thread::sleep(ALLOC_RETRY_SLEEP);
            }
        }
    }
    tracing::error!("cannot allocate frame buffer after {} attempts, exiting", ALLOC_RETRIES);
    std::process::exit(1);
}
