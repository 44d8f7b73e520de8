//! Reader and writer threads of a running manager

use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use isdn_saps::Frame;

use crate::manager::IsdnManager;
use crate::transport::TransportErr;

/// How long a blocked read or wait lasts before the running flag is checked again
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after a failed read
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Drops the all-zero and invalid-primitive frames some devices emit while resyncing,
/// and reports how many were dropped once real traffic is back.
#[derive(Debug, Default)]
pub struct GarbageFilter {
    dropped: u64,
}

impl GarbageFilter {
    /// True if `frame` should be processed
    pub fn pass(&mut self, frame: &Frame) -> bool {
        if frame.is_garbage() {
            self.dropped += 1;
            return false;
        }
        if self.dropped > 0 {
            tracing::info!("dropped {} garbage frames", self.dropped);
            self.dropped = 0;
        }
        true
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

pub(crate) fn reader_loop(mgr: IsdnManager) {
    tracing::debug!("reader started");
    let mut filter = GarbageFilter::default();
    while mgr.is_running() {
        match mgr.transport().read(POLL_INTERVAL) {
            Ok(Some(frame)) => {
                if filter.pass(&frame) {
                    mgr.handle_frame(frame);
                }
            }
            Ok(None) => {}
            Err(TransportErr::Closed) => {
                tracing::info!("device closed, reader stops");
                break;
            }
            Err(e) => {
                tracing::warn!("read failed: {}", e);
                std::thread::sleep(READ_ERROR_BACKOFF);
            }
        }
    }
    tracing::debug!("reader stopped");
}

pub(crate) fn writer_loop(mgr: IsdnManager) {
    tracing::debug!("writer started");
    while mgr.is_running() {
        match mgr.wakeups().recv_timeout(POLL_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {
                mgr.flush_queues();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    // Whatever was queued during shutdown still goes out
    mgr.flush_queues();
    tracing::debug!("writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::debug;
    use isdn_saps::prim;

    #[test]
    fn test_garbage_is_counted_and_reset() {
        debug::setup_logging_verbose();
        let mut filter = GarbageFilter::default();
        assert!(!filter.pass(&Frame::control(0, 0, 0)));
        assert!(!filter.pass(&Frame::control(0xffff_ffff, 1, 0)));
        assert_eq!(filter.dropped(), 2);
        assert!(filter.pass(&Frame::control(prim::PH_ACTIVATE | prim::INDICATION, 1, 0)));
        assert_eq!(filter.dropped(), 0);
    }
}
