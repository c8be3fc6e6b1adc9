//! Transport abstraction: lifecycle events in, control calls out

use async_trait::async_trait;
use bytes::Bytes;
use spp_bridge_shared::{spp, ConnectionHandle, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};

/// Events delivered by a transport provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Provider is up and ready to be configured
    ServerReady,
    /// Service is registered and accepting sessions
    SessionStarted,
    /// A peer opened a session
    PeerConnected { handle: ConnectionHandle, peer: String },
    /// A session was closed
    PeerDisconnected { handle: ConnectionHandle },
    /// Bytes arrived on a session
    DataReceived { handle: ConnectionHandle, data: Bytes },
    /// An outbound frame was written in full
    WriteCompleted { handle: ConnectionHandle, len: usize },
    /// Outbound queue for a session filled up (`true`) or drained (`false`)
    Congested {
        handle: ConnectionHandle,
        congested: bool,
    },
    /// Client-role initialisation finished
    ClientInitiated,
    /// Remote service discovery finished
    DiscoveryComplete,
}

/// Service identity advertised when listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    /// 16-bit service class (0x1101 for SPP)
    pub class_id: u16,
    /// Human-readable service name
    pub name: String,
    /// Fixed RFCOMM channel, or `None` to let the stack choose
    pub channel: Option<u8>,
}

impl ServiceRecord {
    /// Full 128-bit service UUID
    pub fn uuid(&self) -> u128 {
        spp::service_uuid(self.class_id)
    }
}

impl Default for ServiceRecord {
    fn default() -> Self {
        Self {
            class_id: spp::SERVICE_CLASS_ID,
            name: spp::SERVER_NAME.into(),
            channel: None,
        }
    }
}

/// Control surface of a transport provider
#[async_trait]
pub trait TransportControl: Send + Sync {
    /// Set the name peers see during discovery
    async fn set_visible_name(&self, name: &str) -> Result<(), TransportError>;

    /// Make the device connectable and discoverable
    async fn set_discoverable(&self) -> Result<(), TransportError>;

    /// Register the service and begin accepting sessions
    async fn start_listening(&self, service: &ServiceRecord) -> Result<(), TransportError>;

    /// Queue `data` for delivery on the session identified by `handle`
    async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError>;

    /// Human-readable name for this transport
    fn name(&self) -> &'static str;
}

/// A byte stream accepted from a peer
pub trait TransportStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> TransportStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}
