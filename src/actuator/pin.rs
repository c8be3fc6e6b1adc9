//! Actuator over an embedded-hal output pin

use super::Actuator;
use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};
use spp_bridge_shared::{ActuatorError, ActuatorState};
use std::convert::Infallible;
use tracing::{debug, info};

/// Drives an [`OutputPin`] high for `Asserted` and low for `Deasserted`
pub struct PinActuator<P> {
    pin: P,
    line: u32,
}

impl<P> PinActuator<P> {
    /// Wrap a pin already configured as an output
    pub fn new(pin: P, line: u32) -> Self {
        Self { pin, line }
    }

    /// GPIO line number, used in logs and errors
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Borrow the underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Release the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> Actuator for PinActuator<P>
where
    P: OutputPin + Send,
{
    fn set_output(&mut self, state: ActuatorState) -> Result<(), ActuatorError> {
        let result = match state {
            ActuatorState::Asserted => self.pin.set_high(),
            ActuatorState::Deasserted => self.pin.set_low(),
        };

        result.map_err(|e| ActuatorError::Pin {
            line: self.line,
            reason: format!("{:?}", e),
        })?;
        debug!("[GPIO] line {} set to {}", self.line, state.level());
        Ok(())
    }
}

/// In-memory pin used when no GPIO hardware is available
#[derive(Debug)]
pub struct SimulatedPin {
    line: u32,
    state: PinState,
}

impl SimulatedPin {
    /// Configure a simulated output line; it starts low
    pub fn output(line: u32) -> Self {
        info!("[GPIO] Simulated output on line {}", line);
        Self {
            line,
            state: PinState::Low,
        }
    }

    /// Level last driven onto the line
    pub fn state(&self) -> PinState {
        self.state
    }
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state = PinState::Low;
        info!("[GPIO] (simulated) line {} -> low", self.line);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state = PinState::High;
        info!("[GPIO] (simulated) line {} -> high", self.line);
        Ok(())
    }
}

impl StatefulOutputPin for SimulatedPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state == PinState::High)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state == PinState::Low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenPin;

    #[derive(Debug)]
    struct BrokenPinError;

    impl embedded_hal::digital::Error for BrokenPinError {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl ErrorType for BrokenPin {
        type Error = BrokenPinError;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(BrokenPinError)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(BrokenPinError)
        }
    }

    #[test]
    fn test_states_map_to_levels() {
        let mut actuator = PinActuator::new(SimulatedPin::output(2), 2);
        assert_eq!(actuator.pin().state(), PinState::Low);

        actuator.set_output(ActuatorState::Asserted).unwrap();
        assert_eq!(actuator.pin().state(), PinState::High);

        actuator.set_output(ActuatorState::Deasserted).unwrap();
        let mut pin = actuator.into_inner();
        assert!(pin.is_set_low().unwrap());
    }

    #[test]
    fn test_pin_errors_name_the_line() {
        let mut actuator = PinActuator::new(BrokenPin, 17);
        let err = actuator.set_output(ActuatorState::Asserted).unwrap_err();
        assert!(matches!(err, ActuatorError::Pin { line: 17, .. }));
        assert!(err.to_string().contains("GPIO line 17"));
    }
}
