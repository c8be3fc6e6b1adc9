//! Mock transport for unit testing.
//!
//! Records every control call so tests can assert on what the session
//! manager asked the transport to do, without a radio or sockets.

use crate::transport::traits::{ServiceRecord, TransportControl};
use async_trait::async_trait;
use bytes::Bytes;
use spp_bridge_shared::{ConnectionHandle, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// One call made against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCall {
    SetVisibleName(String),
    SetDiscoverable,
    StartListening(ServiceRecord),
    Write { handle: ConnectionHandle, data: Bytes },
}

/// A [`TransportControl`] that records calls instead of performing them
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<ControlCall>>,
    fail_writes: AtomicBool,
}

impl MockTransport {
    /// Create a mock with no recorded calls
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with `UnknownHandle`
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Only the write calls, as `(handle, data)` pairs
    pub fn writes(&self) -> Vec<(ConnectionHandle, Bytes)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ControlCall::Write { handle, data } => Some((handle, data)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ControlCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

#[async_trait]
impl TransportControl for MockTransport {
    async fn set_visible_name(&self, name: &str) -> Result<(), TransportError> {
        self.record(ControlCall::SetVisibleName(name.to_string()));
        Ok(())
    }

    async fn set_discoverable(&self) -> Result<(), TransportError> {
        self.record(ControlCall::SetDiscoverable);
        Ok(())
    }

    async fn start_listening(&self, service: &ServiceRecord) -> Result<(), TransportError> {
        self.record(ControlCall::StartListening(service.clone()));
        Ok(())
    }

    async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError> {
        self.record(ControlCall::Write { handle, data });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::UnknownHandle(handle));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
