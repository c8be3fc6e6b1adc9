//! Binary output driven by recognized commands
//!
//! Any `embedded_hal::digital::OutputPin` can back the actuator through
//! [`PinActuator`]; on Linux the line is a sysfs GPIO, elsewhere a
//! [`SimulatedPin`] logs the level instead.

pub mod mock;
pub mod pin;
pub mod sysfs;

pub use mock::RecordingActuator;
pub use pin::{PinActuator, SimulatedPin};
pub use sysfs::{SysfsPin, SysfsPinError};

use spp_bridge_shared::{ActuatorError, ActuatorState};

/// The single output line controlled by the bridge
pub trait Actuator: Send {
    /// Drive the output to `state`. Called for every recognized command,
    /// whether or not the level changes.
    fn set_output(&mut self, state: ActuatorState) -> Result<(), ActuatorError>;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_output(&mut self, state: ActuatorState) -> Result<(), ActuatorError> {
        (**self).set_output(state)
    }
}
