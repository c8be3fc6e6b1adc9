//! RFCOMM transport provider for Bluetooth Serial Port Profile sessions

use crate::transport::link::{EventSender, LinkConfig, LinkTable};
use crate::transport::traits::{ServiceRecord, TransportControl, TransportEvent};
use async_trait::async_trait;
use bluer::rfcomm::{Profile, Role};
use bluer::{Adapter, Session, Uuid};
use bytes::Bytes;
use futures::StreamExt;
use spp_bridge_shared::{ConnectionHandle, TransportError};
use std::sync::Arc;
use tracing::{info, warn};

fn radio(e: bluer::Error) -> TransportError {
    TransportError::Radio(e.to_string())
}

fn setup_step(step: &'static str) -> impl Fn(bluer::Error) -> TransportError {
    move |e| TransportError::Radio(format!("{} failed: {}", step, e))
}

/// Build the server-role profile registered with BlueZ
pub fn server_profile(service: &ServiceRecord) -> Profile {
    Profile {
        uuid: Uuid::from_u128(service.uuid()),
        name: Some(service.name.clone()),
        role: Some(Role::Server),
        channel: service.channel.map(u16::from),
        require_authentication: Some(false),
        require_authorization: Some(false),
        ..Default::default()
    }
}

/// Bluetooth SPP server on the default adapter
pub struct RfcommTransport {
    session: Session,
    adapter: Adapter,
    links: Arc<LinkTable>,
}

impl RfcommTransport {
    /// Bring up the radio and report `ServerReady` on `events`
    ///
    /// Fails if no BlueZ session or adapter is available or the adapter
    /// cannot be powered.
    pub async fn open(config: LinkConfig, events: EventSender) -> Result<Self, TransportError> {
        let session = Session::new()
            .await
            .map_err(setup_step("open BlueZ session"))?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(setup_step("initialize controller"))?;
        adapter
            .set_powered(true)
            .await
            .map_err(setup_step("enable controller"))?;
        info!("[BT] Adapter {} powered on", adapter.name());

        let links = LinkTable::with_config(events, config);
        links.emit(TransportEvent::ServerReady);

        Ok(Self {
            session,
            adapter,
            links,
        })
    }
}

#[async_trait]
impl TransportControl for RfcommTransport {
    async fn set_visible_name(&self, name: &str) -> Result<(), TransportError> {
        self.adapter.set_alias(name.to_string()).await.map_err(radio)?;
        info!("[BT] Visible name set to {}", name);
        Ok(())
    }

    async fn set_discoverable(&self) -> Result<(), TransportError> {
        self.adapter.set_discoverable_timeout(0).await.map_err(radio)?;
        self.adapter.set_discoverable(true).await.map_err(radio)?;
        self.adapter.set_pairable(true).await.map_err(radio)?;
        info!("[BT] Connectable and discoverable");
        Ok(())
    }

    async fn start_listening(&self, service: &ServiceRecord) -> Result<(), TransportError> {
        let requests = self
            .session
            .register_profile(server_profile(service))
            .await
            .map_err(radio)?;
        info!(
            "[BT] Service {} ({:#06x}) registered, channel {}",
            service.name,
            service.class_id,
            service
                .channel
                .map(|c| c.to_string())
                .unwrap_or_else(|| "auto".into())
        );
        self.links.emit(TransportEvent::SessionStarted);

        let links = self.links.clone();
        tokio::spawn(async move {
            tokio::pin!(requests);
            while let Some(request) = requests.next().await {
                let peer = request.device();
                match request.accept() {
                    Ok(stream) => {
                        info!("[BT] Accepted connection from {}", peer);
                        links.attach(stream, peer.to_string()).await;
                    }
                    Err(e) => warn!("[BT] Failed to accept {}: {}", peer, e),
                }
            }
            warn!("[BT] Profile registration ended");
        });

        Ok(())
    }

    async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError> {
        self.links.write(handle, data).await
    }

    fn name(&self) -> &'static str {
        "Bluetooth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = server_profile(&ServiceRecord::default());
        assert_eq!(
            profile.uuid,
            Uuid::parse_str("00001101-0000-1000-8000-00805f9b34fb").unwrap()
        );
        assert_eq!(profile.name.as_deref(), Some("ESP32_SPP_SERVER"));
        assert_eq!(profile.role, Some(Role::Server));
        assert_eq!(profile.channel, None);
        assert_eq!(profile.require_authentication, Some(false));
    }

    #[test]
    fn test_fixed_channel() {
        let service = ServiceRecord {
            channel: Some(3),
            ..Default::default()
        };
        assert_eq!(server_profile(&service).channel, Some(3));
    }
}
