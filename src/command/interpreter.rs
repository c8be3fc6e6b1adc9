//! Command interpreter - applies one received frame and echoes it back

use crate::actuator::Actuator;
use crate::transport::TransportControl;
use bytes::Bytes;
use spp_bridge_shared::{ConnectionHandle, RecognizedCommand};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one frame did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Command decoded from the frame
    pub command: RecognizedCommand,
    /// Handle the echo was addressed to, `None` when no session was active
    pub echoed_to: Option<ConnectionHandle>,
}

/// Decodes frames, drives the actuator and acknowledges by echo
pub struct CommandInterpreter {
    actuator: Box<dyn Actuator>,
    transport: Arc<dyn TransportControl>,
}

impl CommandInterpreter {
    /// Create a new command interpreter
    pub fn new(actuator: Box<dyn Actuator>, transport: Arc<dyn TransportControl>) -> Self {
        Self {
            actuator,
            transport,
        }
    }

    /// Handle one frame
    ///
    /// The full original frame is echoed to `active`, whatever the decoded
    /// command. Without an active session the frame is ignored: no effect,
    /// no echo. Actuator and transport failures are logged, never returned.
    pub async fn interpret(&mut self, frame: &Bytes, active: Option<ConnectionHandle>) -> Outcome {
        let command = RecognizedCommand::decode(frame);

        let Some(handle) = active else {
            debug!("[SPP] No active session, frame ignored");
            return Outcome {
                command,
                echoed_to: None,
            };
        };

        match command.effect() {
            Some(state) => {
                info!("[SPP] Setting output to {}", state);
                if let Err(e) = self.actuator.set_output(state) {
                    warn!("[SPP] Failed to set output to {}: {}", state, e);
                }
            }
            None => debug!("[SPP] Unrecognized command, output unchanged"),
        }

        if let Err(e) = self.transport.write(handle, frame.clone()).await {
            warn!("[SPP] Echo of {} bytes to {} failed: {}", frame.len(), handle, e);
        }

        Outcome {
            command,
            echoed_to: Some(handle),
        }
    }
}
