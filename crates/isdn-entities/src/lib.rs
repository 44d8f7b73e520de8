//! Interface and call management on top of the Q.931 codec
//!
//! - `stack`: per-port interface state, call contexts, held calls, call references
//! - `manager`: the application-facing API and the inbound dispatch chain
//! - `workers`: reader and writer threads
//! - `transport`: the device boundary and an in-process loopback device
//! - `app`: the callback trait the application implements

pub mod app;
pub mod manager;
pub mod stack;
pub mod transport;
pub mod workers;

pub use app::{Action, ActionQueue, EventResponse, IsdnApp};
pub use manager::{IsdnManager, SendErr};
pub use stack::call_context::{CallContext, CallHandle};
pub use stack::bchan_fsm::BchanState;
pub use transport::{StackInfo, Transport, TransportErr};
