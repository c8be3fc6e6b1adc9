//! TCP transport provider simulating the SPP server for development

use crate::transport::link::{EventSender, LinkConfig, LinkTable};
use crate::transport::traits::{ServiceRecord, TransportControl, TransportEvent};
use async_trait::async_trait;
use bytes::Bytes;
use spp_bridge_shared::{ConnectionHandle, TransportError};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Radio settings recorded by the simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedRadio {
    pub visible_name: Option<String>,
    pub discoverable: bool,
}

/// TCP listener standing in for the RFCOMM server
pub struct TcpTransport {
    listen_addr: SocketAddr,
    local_addr: Mutex<Option<SocketAddr>>,
    radio: Mutex<SimulatedRadio>,
    links: Arc<LinkTable>,
}

impl TcpTransport {
    /// Create the provider and report `ServerReady` on `events`
    pub fn new(listen_addr: SocketAddr, config: LinkConfig, events: EventSender) -> Self {
        let links = LinkTable::with_config(events, config);
        links.emit(TransportEvent::ServerReady);

        Self {
            listen_addr,
            local_addr: Mutex::new(None),
            radio: Mutex::new(SimulatedRadio::default()),
            links,
        }
    }

    /// Address actually bound once listening (useful with port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Radio settings applied so far
    pub fn radio(&self) -> SimulatedRadio {
        self.radio.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TransportControl for TcpTransport {
    async fn set_visible_name(&self, name: &str) -> Result<(), TransportError> {
        self.radio.lock().unwrap_or_else(|e| e.into_inner()).visible_name = Some(name.to_string());
        info!("[TCP] Simulated visible name: {}", name);
        Ok(())
    }

    async fn set_discoverable(&self) -> Result<(), TransportError> {
        self.radio.lock().unwrap_or_else(|e| e.into_inner()).discoverable = true;
        info!("[TCP] Simulated discoverable mode");
        Ok(())
    }

    async fn start_listening(&self, service: &ServiceRecord) -> Result<(), TransportError> {
        let listener = TcpListener::bind(self.listen_addr).await?;
        let local = listener.local_addr()?;
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = Some(local);
        info!("[TCP] Service {} listening on {}", service.name, local);
        self.links.emit(TransportEvent::SessionStarted);

        let links = self.links.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, peer)) => {
                        info!("[TCP] Accepted connection from {}", peer);
                        if let Err(e) = socket.set_nodelay(true) {
                            warn!("[TCP] Failed to set TCP_NODELAY for {}: {}", peer, e);
                        }
                        links.attach(socket, peer.to_string()).await;
                    }
                    Err(e) => {
                        warn!("[TCP] Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
            }
        });

        Ok(())
    }

    async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError> {
        self.links.write(handle, data).await
    }

    fn name(&self) -> &'static str {
        "TCP simulation"
    }
}
