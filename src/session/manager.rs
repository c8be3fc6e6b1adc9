//! Session manager - owns the active connection and dispatches transport events

use crate::actuator::Actuator;
use crate::command::CommandInterpreter;
use crate::transport::{EventReceiver, ServiceRecord, TransportControl, TransportEvent};
use spp_bridge_shared::{
    spp, ConnectionHandle, SessionEvent, SessionState, SessionStateMachine, TransitionResult,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Identity the bridge advertises once the transport is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Name shown to peers during discovery
    pub visible_name: String,
    /// Service registered for inbound sessions
    pub service: ServiceRecord,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            visible_name: spp::SERVER_NAME.into(),
            service: ServiceRecord::default(),
        }
    }
}

/// Single source of truth for the connected peer
///
/// Events must be fed one at a time; [`SessionManager::run`] does this by
/// draining the provider's channel on a single task.
pub struct SessionManager {
    config: SessionConfig,
    transport: Arc<dyn TransportControl>,
    interpreter: CommandInterpreter,
    session: SessionStateMachine,
}

impl SessionManager {
    /// Create a new session manager in the Disconnected state
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn TransportControl>,
        actuator: Box<dyn Actuator>,
    ) -> Self {
        let interpreter = CommandInterpreter::new(actuator, transport.clone());
        Self {
            config,
            transport,
            interpreter,
            session: SessionStateMachine::new(),
        }
    }

    /// Get current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Handle of the connected peer, if any
    pub fn active_handle(&self) -> Option<ConnectionHandle> {
        self.session.active_handle()
    }

    /// Dispatch events until the provider's channel closes
    pub async fn run(&mut self, events: &mut EventReceiver) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("[SPP] Transport event channel closed");
    }

    /// Dispatch a single transport event
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ServerReady => {
                info!("[SPP] Server ready ({})", self.transport.name());
                self.on_server_ready().await;
            }
            TransportEvent::SessionStarted => {
                info!("[SPP] Service started");
            }
            TransportEvent::PeerConnected { handle, peer } => {
                info!("[SPP] Peer {} connected, handle={}", peer, handle);
                match self.session.process_event(SessionEvent::PeerConnected(handle)) {
                    TransitionResult::Replaced { previous, current } => {
                        warn!("[SPP] Handle {} replaces active handle {}", current, previous);
                    }
                    result => debug!("[SPP] Session transition: {:?}", result),
                }
            }
            TransportEvent::PeerDisconnected { handle } => {
                info!("[SPP] Peer disconnected, handle={}", handle);
                if let TransitionResult::Closed(active) =
                    self.session.process_event(SessionEvent::PeerDisconnected)
                {
                    if active != handle {
                        warn!(
                            "[SPP] Close of handle {} cleared active handle {}",
                            handle, active
                        );
                    }
                }
            }
            TransportEvent::DataReceived { handle, data } => {
                info!("[SPP] Data received len={} handle={}", data.len(), handle);
                debug!("[SPP] {}", hex::encode(&data));

                let outcome = self
                    .interpreter
                    .interpret(&data, self.session.active_handle())
                    .await;
                debug!("[SPP] Frame outcome: {:?}", outcome);
            }
            TransportEvent::WriteCompleted { handle, len } => {
                debug!("[SPP] Write completed len={} handle={}", len, handle);
            }
            TransportEvent::Congested { handle, congested } => {
                info!("[SPP] Congestion on handle {}: {}", handle, congested);
            }
            TransportEvent::ClientInitiated => {
                info!("[SPP] Client initiated");
            }
            TransportEvent::DiscoveryComplete => {
                info!("[SPP] Discovery complete");
            }
        }
    }

    async fn on_server_ready(&mut self) {
        if let Err(e) = self.transport.set_visible_name(&self.config.visible_name).await {
            error!("[SPP] Failed to set visible name: {}", e);
        }
        if let Err(e) = self.transport.set_discoverable().await {
            error!("[SPP] Failed to set discoverable: {}", e);
        }
        if let Err(e) = self.transport.start_listening(&self.config.service).await {
            error!("[SPP] Failed to start listening: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::RecordingActuator;
    use crate::transport::{ControlCall, LinkTable, MockTransport};
    use bytes::Bytes;
    use spp_bridge_shared::{ActuatorState, TransportError};

    fn manager() -> (SessionManager, RecordingActuator, Arc<MockTransport>) {
        let actuator = RecordingActuator::new();
        let transport = Arc::new(MockTransport::new());
        let manager = SessionManager::new(
            SessionConfig::default(),
            transport.clone(),
            Box::new(actuator.clone()),
        );
        (manager, actuator, transport)
    }

    fn handle(raw: u32) -> ConnectionHandle {
        ConnectionHandle::new(raw).unwrap()
    }

    fn connected(raw: u32) -> TransportEvent {
        TransportEvent::PeerConnected {
            handle: handle(raw),
            peer: format!("peer-{}", raw),
        }
    }

    fn data(raw: u32, bytes: &'static [u8]) -> TransportEvent {
        TransportEvent::DataReceived {
            handle: handle(raw),
            data: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn test_server_ready_configures_transport() {
        let (mut manager, _, transport) = manager();

        manager.handle_event(TransportEvent::ServerReady).await;

        assert_eq!(
            transport.calls(),
            vec![
                ControlCall::SetVisibleName("ESP32_SPP_SERVER".into()),
                ControlCall::SetDiscoverable,
                ControlCall::StartListening(ServiceRecord::default()),
            ]
        );
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let (mut manager, _, _) = manager();
        assert_eq!(manager.state(), SessionState::Disconnected);

        manager.handle_event(connected(5)).await;
        assert_eq!(manager.state(), SessionState::Connected(handle(5)));

        manager
            .handle_event(TransportEvent::PeerDisconnected { handle: handle(5) })
            .await;
        assert_eq!(manager.active_handle(), None);
    }

    #[tokio::test]
    async fn test_second_connect_replaces_handle() {
        let (mut manager, _, transport) = manager();

        manager.handle_event(connected(1)).await;
        manager.handle_event(connected(2)).await;
        assert_eq!(manager.active_handle(), Some(handle(2)));

        // Echo targets the active handle, not the handle the data arrived on
        manager.handle_event(data(1, b"ON")).await;
        assert_eq!(transport.writes(), vec![(handle(2), Bytes::from_static(b"ON"))]);
    }

    #[tokio::test]
    async fn test_data_after_disconnect_has_no_effect() {
        let (mut manager, actuator, transport) = manager();

        manager.handle_event(connected(5)).await;
        manager
            .handle_event(TransportEvent::PeerDisconnected { handle: handle(5) })
            .await;
        manager.handle_event(data(5, b"ON")).await;

        assert_eq!(manager.active_handle(), None);
        assert!(actuator.history().is_empty());
        assert!(transport.writes().is_empty());
    }

    /// Transport backed directly by a link table, for driving real links
    struct LinkTransport {
        links: Arc<LinkTable>,
    }

    #[async_trait::async_trait]
    impl TransportControl for LinkTransport {
        async fn set_visible_name(&self, _name: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn set_discoverable(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn start_listening(&self, _service: &ServiceRecord) -> Result<(), TransportError> {
            Ok(())
        }

        async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError> {
            self.links.write(handle, data).await
        }

        fn name(&self) -> &'static str {
            "link"
        }
    }

    #[tokio::test]
    async fn test_stalled_peer_does_not_block_dispatch() {
        let (tx, mut rx) = crate::transport::event_channel();
        let links = LinkTable::new(tx, 64, 1);
        let actuator = RecordingActuator::new();
        let mut manager = SessionManager::new(
            SessionConfig::default(),
            Arc::new(LinkTransport {
                links: links.clone(),
            }),
            Box::new(actuator.clone()),
        );

        // Peer stays connected but never reads
        let (local, _remote) = tokio::io::duplex(1);
        let stalled = links.attach(local, "stalled".into()).await;
        manager.handle_event(rx.recv().await.unwrap()).await;
        assert_eq!(manager.active_handle(), Some(stalled));

        for n in 0..5 {
            tokio::time::timeout(
                std::time::Duration::from_secs(1),
                manager.handle_event(TransportEvent::DataReceived {
                    handle: stalled,
                    data: Bytes::from_static(b"OFF"),
                }),
            )
            .await
            .unwrap_or_else(|_| panic!("dispatch stalled on frame {}", n));
        }

        // Every frame still drives the output; only echoes are dropped
        assert_eq!(actuator.history(), vec![ActuatorState::Deasserted; 5]);

        manager
            .handle_event(TransportEvent::PeerDisconnected { handle: stalled })
            .await;
        assert_eq!(manager.active_handle(), None);
    }

    #[tokio::test]
    async fn test_observability_events_change_nothing() {
        let (mut manager, actuator, transport) = manager();
        manager.handle_event(connected(4)).await;

        for event in [
            TransportEvent::SessionStarted,
            TransportEvent::WriteCompleted {
                handle: handle(4),
                len: 2,
            },
            TransportEvent::Congested {
                handle: handle(4),
                congested: true,
            },
            TransportEvent::ClientInitiated,
            TransportEvent::DiscoveryComplete,
        ] {
            manager.handle_event(event).await;
        }

        assert_eq!(manager.active_handle(), Some(handle(4)));
        assert!(actuator.history().is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_drains_until_closed() {
        let (mut manager, actuator, transport) = manager();
        let (tx, mut rx) = crate::transport::event_channel();

        tx.send(connected(7)).unwrap();
        tx.send(data(7, b"OFF")).unwrap();
        drop(tx);

        manager.run(&mut rx).await;

        assert_eq!(actuator.last(), Some(ActuatorState::Deasserted));
        assert_eq!(transport.writes(), vec![(handle(7), Bytes::from_static(b"OFF"))]);
    }
}
