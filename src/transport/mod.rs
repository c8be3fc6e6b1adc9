//! Transport providers for the SPP command bridge
//!
//! This module handles:
//! - The event interface providers report lifecycle and data on
//! - The control interface the session manager drives
//! - Bluetooth RFCOMM and TCP simulation providers sharing one link layer

pub mod link;
pub mod mock;
pub mod rfcomm;
pub mod tcp;
pub mod traits;

pub use link::{event_channel, EventReceiver, EventSender, LinkConfig, LinkTable};
pub use mock::{ControlCall, MockTransport};
pub use rfcomm::RfcommTransport;
pub use tcp::{SimulatedRadio, TcpTransport};
pub use traits::{ServiceRecord, TransportControl, TransportEvent, TransportStream};
