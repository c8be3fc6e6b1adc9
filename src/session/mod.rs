//! Session management for the single connected peer
//!
//! This module handles:
//! - Advertising the service once the transport is ready
//! - Tracking the active connection handle
//! - Dispatching received frames to the command interpreter

mod manager;

pub use manager::{SessionConfig, SessionManager};
