//! Session State Machine
//!
//! Tracks the single active peer session.
//!
//! ```text
//! Disconnected --PeerConnected(h)--> Connected(h)
//! Connected(h1) --PeerConnected(h2)--> Connected(h2)
//! Connected(h) --PeerDisconnected--> Disconnected
//! ```

use crate::ConnectionHandle;

/// Events that can trigger session transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A peer opened a session
    PeerConnected(ConnectionHandle),
    /// The peer closed its session
    PeerDisconnected,
}

/// Current session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(ConnectionHandle),
}

/// Result of processing a session event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// First peer connected
    Opened(ConnectionHandle),
    /// A new peer connected while another was active; the newer handle wins
    Replaced {
        previous: ConnectionHandle,
        current: ConnectionHandle,
    },
    /// The active session was closed
    Closed(ConnectionHandle),
    /// Disconnect reported with no active session
    AlreadyClosed,
}

/// The session state machine; owns the active connection handle
#[derive(Debug, Default)]
pub struct SessionStateMachine {
    current_state: SessionState,
}

impl SessionStateMachine {
    /// Create a new state machine in Disconnected state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.current_state
    }

    /// Handle of the active session, `None` when disconnected
    pub fn active_handle(&self) -> Option<ConnectionHandle> {
        match self.current_state {
            SessionState::Connected(handle) => Some(handle),
            SessionState::Disconnected => None,
        }
    }

    /// Check if a peer is connected
    pub fn is_connected(&self) -> bool {
        self.active_handle().is_some()
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: SessionEvent) -> TransitionResult {
        let (next, result) = match (self.current_state, event) {
            (SessionState::Disconnected, SessionEvent::PeerConnected(handle)) => {
                (SessionState::Connected(handle), TransitionResult::Opened(handle))
            }
            (SessionState::Connected(previous), SessionEvent::PeerConnected(current)) => (
                SessionState::Connected(current),
                TransitionResult::Replaced { previous, current },
            ),
            (SessionState::Connected(handle), SessionEvent::PeerDisconnected) => {
                (SessionState::Disconnected, TransitionResult::Closed(handle))
            }
            (SessionState::Disconnected, SessionEvent::PeerDisconnected) => {
                (SessionState::Disconnected, TransitionResult::AlreadyClosed)
            }
        };

        self.current_state = next;
        result
    }
}
