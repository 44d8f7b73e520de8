use std::time::Duration;

use isdn_core::{Role, TrunkType};
use isdn_saps::Frame;

pub mod loopback;

pub use loopback::LoopbackTransport;

/// Attempts to acquire the device before giving up
pub const OPEN_RETRIES: usize = 10;
pub const OPEN_RETRY_SLEEP: Duration = Duration::from_millis(300);

/// Write timeout used for control frames
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// What the device reports about one of its ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackInfo {
    pub port: u8,
    pub role: Role,
    pub trunk: TrunkType,
    pub ptp: bool,
    /// Number of B-channels
    pub b_num: u8,
}

impl StackInfo {
    pub fn new(port: u8, role: Role, trunk: TrunkType, ptp: bool) -> Self {
        Self {
            port,
            role,
            trunk,
            ptp,
            b_num: trunk.b_num(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErr {
    /// Device busy or missing
    OpenFailed(String),
    WriteFailed(String),
    ReadFailed(String),
    UnknownPort(u8),
    /// Could not assign a B-channel sub-layer
    LayerFailed { port: u8, channel: u8 },
    Closed,
}

impl std::fmt::Display for TransportErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportErr::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
            TransportErr::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            TransportErr::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
            TransportErr::UnknownPort(port) => write!(f, "Unknown port {}", port),
            TransportErr::LayerFailed { port, channel } => {
                write!(f, "No B-channel layer for port {} channel {}", port, channel)
            }
            TransportErr::Closed => write!(f, "Transport closed"),
        }
    }
}

impl std::error::Error for TransportErr {}

/// The device below the stack. Implementations are shared between the reader
/// thread, the writer thread and application threads.
pub trait Transport: Send + Sync {
    /// Next frame from the device. `Ok(None)` when nothing arrived within `timeout`.
    fn read(&self, timeout: Duration) -> Result<Option<Frame>, TransportErr>;

    fn write(&self, frame: Frame) -> Result<(), TransportErr>;

    /// Number of ports the device has
    fn stack_count(&self) -> usize;

    fn stack_info(&self, port: u8) -> Option<StackInfo>;

    /// Assigns a B-channel sub-layer and returns its address
    fn new_layer(&self, port: u8, channel: u8) -> Result<u32, TransportErr>;

    /// Removes a sub-layer obtained from `new_layer`
    fn del_layer(&self, addr: u32) -> Result<(), TransportErr>;

    fn close(&self);
}

/// Runs `open` until it succeeds. A device that stays busy leaves nothing to run
/// on, so the process exits after the last attempt.
pub fn open_with_retry<T, F>(mut open: F) -> T
where
    F: FnMut() -> Result<T, TransportErr>,
{
    for attempt in 0..OPEN_RETRIES {
        match open() {
            Ok(t) => return t,
            Err(e) => {
                tracing::warn!("cannot open device (attempt {}): {}", attempt + 1, e);
                std::thread::sleep(OPEN_RETRY_SLEEP);
            }
        }
    }
    tracing::error!("device unavailable after {} attempts, exiting", OPEN_RETRIES);
    std::process::exit(1);
}
