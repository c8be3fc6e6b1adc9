//! Command vocabulary carried over the serial byte stream
//!
//! Frames are classified by prefix:
//! ```text
//! "ON"  + anything  -> TurnOn
//! "OFF" + anything  -> TurnOff
//! anything else     -> Unrecognized
//! ```
//!
//! `"ON"` is tested before `"OFF"` and neither check looks past its token, so
//! `"ONX"` still turns the output on.

use crate::ActuatorState;

/// Bytes of a frame examined by the decoder. Longer frames are truncated.
pub const SCRATCH_LEN: usize = 4;

const TURN_ON: &[u8] = b"ON";
const TURN_OFF: &[u8] = b"OFF";

/// Command decoded from one received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizedCommand {
    TurnOn,
    TurnOff,
    Unrecognized,
}

impl RecognizedCommand {
    /// Classify a received frame
    ///
    /// At most [`SCRATCH_LEN`] bytes are copied into a zeroed scratch buffer
    /// and compared; every byte sequence maps to exactly one variant.
    pub fn decode(frame: &[u8]) -> Self {
        let mut scratch = [0u8; SCRATCH_LEN];
        let n = frame.len().min(SCRATCH_LEN);
        scratch[..n].copy_from_slice(&frame[..n]);

        if scratch.starts_with(TURN_ON) {
            RecognizedCommand::TurnOn
        } else if scratch.starts_with(TURN_OFF) {
            RecognizedCommand::TurnOff
        } else {
            RecognizedCommand::Unrecognized
        }
    }

    /// Actuator state this command requests, if any
    pub fn effect(self) -> Option<ActuatorState> {
        match self {
            RecognizedCommand::TurnOn => Some(ActuatorState::Asserted),
            RecognizedCommand::TurnOff => Some(ActuatorState::Deasserted),
            RecognizedCommand::Unrecognized => None,
        }
    }
}
