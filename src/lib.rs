//! Serial Port Profile command bridge
//!
//! Accepts one peer over an SPP (or simulated) byte stream, maps `ON`/`OFF`
//! frames onto a single GPIO output and echoes every frame back.

pub mod actuator;
pub mod command;
pub mod config;
pub mod session;
pub mod transport;

pub use spp_bridge_shared as shared;
