//! Command handling for frames received from the peer
//!
//! This module handles:
//! - Decoding frames into recognized commands
//! - Driving the actuator for each recognized command
//! - Echoing every frame back as acknowledgment

mod interpreter;

pub use interpreter::{CommandInterpreter, Outcome};
