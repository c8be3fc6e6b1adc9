//! Mock actuator for unit testing.

use super::Actuator;
use spp_bridge_shared::{ActuatorError, ActuatorState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records every requested state. Clones share the same history so a test
/// can keep one while the bridge owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    history: Arc<Mutex<Vec<ActuatorState>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingActuator {
    /// Create an actuator with an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail after being recorded
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every state requested so far, in order
    pub fn history(&self) -> Vec<ActuatorState> {
        self.history.lock().expect("lock poisoned").clone()
    }

    /// Most recently requested state
    pub fn last(&self) -> Option<ActuatorState> {
        self.history().last().copied()
    }
}

impl Actuator for RecordingActuator {
    fn set_output(&mut self, state: ActuatorState) -> Result<(), ActuatorError> {
        self.history.lock().expect("lock poisoned").push(state);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::Pin {
                line: 0,
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}
