//! SPP Bridge Shared Types
//!
//! This crate provides the I/O-free domain types used by the SPP command
//! bridge: connection handles, actuator states, command decoding and the
//! session state machine.

pub mod command;
pub mod error;
pub mod state_machine;

use std::fmt;
use std::num::NonZeroU32;

pub use command::{RecognizedCommand, SCRATCH_LEN};
pub use error::{ActuatorError, TransportError};
pub use state_machine::{SessionEvent, SessionState, SessionStateMachine, TransitionResult};

/// Opaque identifier for one open transport session.
///
/// A raw value of `0` is reserved by transports to mean "no connection", so it
/// can never become a handle. Code that needs the sentinel uses
/// `Option<ConnectionHandle>` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(NonZeroU32);

impl ConnectionHandle {
    /// Wrap a raw transport handle, returning `None` for the `0` sentinel
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw value as reported by the transport
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Level of the single binary output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Asserted,
    Deasserted,
}

impl ActuatorState {
    /// Wire-level output value (`1` asserted, `0` deasserted)
    pub fn level(self) -> u8 {
        match self {
            ActuatorState::Asserted => 1,
            ActuatorState::Deasserted => 0,
        }
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorState::Asserted => write!(f, "ON"),
            ActuatorState::Deasserted => write!(f, "OFF"),
        }
    }
}

/// Serial Port Profile parameters for the bridge
pub mod spp {
    /// Visible device name and advertised service name
    pub const SERVER_NAME: &str = "ESP32_SPP_SERVER";

    /// Serial Port Profile service class
    pub const SERVICE_CLASS_ID: u16 = 0x1101;

    /// Bluetooth base UUID (`00000000-0000-1000-8000-00805F9B34FB`)
    pub const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

    /// GPIO line driven by recognized commands
    pub const DEFAULT_OUTPUT_LINE: u32 = 2;

    /// Largest payload delivered by a single data event
    pub const MAX_FRAME_LEN: usize = 990;

    /// Outbound frames buffered per link before congestion is reported
    pub const WRITE_QUEUE_DEPTH: usize = 8;

    /// Expand a 16-bit service class into its full 128-bit UUID value
    pub const fn service_uuid(class_id: u16) -> u128 {
        BASE_UUID | ((class_id as u128) << 96)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_handle() {
        assert!(ConnectionHandle::new(0).is_none());
        assert_eq!(ConnectionHandle::new(7).map(ConnectionHandle::get), Some(7));
    }

    #[test]
    fn test_handle_display() {
        let handle = ConnectionHandle::new(129).unwrap();
        assert_eq!(handle.to_string(), "129");
    }

    #[test]
    fn test_actuator_levels() {
        assert_eq!(ActuatorState::Asserted.level(), 1);
        assert_eq!(ActuatorState::Deasserted.level(), 0);
    }

    #[test]
    fn test_spp_uuid() {
        assert_eq!(
            spp::service_uuid(spp::SERVICE_CLASS_ID),
            0x0000_1101_0000_1000_8000_0080_5f9b_34fb
        );
    }
}
