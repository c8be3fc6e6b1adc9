//! End-to-end behaviour of the bridge: session lifecycle, command effects and
//! echo acknowledgments.

use bytes::Bytes;
use spp_bridge::actuator::RecordingActuator;
use spp_bridge::session::{SessionConfig, SessionManager};
use spp_bridge::shared::{ActuatorState, ConnectionHandle, SessionState};
use spp_bridge::transport::{
    event_channel, LinkConfig, MockTransport, TcpTransport, TransportControl, TransportEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

struct Bridge {
    manager: SessionManager,
    actuator: RecordingActuator,
    transport: Arc<MockTransport>,
}

impl Bridge {
    fn new() -> Self {
        let actuator = RecordingActuator::new();
        let transport = Arc::new(MockTransport::new());
        let manager = SessionManager::new(
            SessionConfig::default(),
            transport.clone(),
            Box::new(actuator.clone()),
        );
        Self {
            manager,
            actuator,
            transport,
        }
    }

    async fn connect(&mut self, raw: u32) {
        self.manager
            .handle_event(TransportEvent::PeerConnected {
                handle: handle(raw),
                peer: "00:11:22:33:44:55".into(),
            })
            .await;
    }

    async fn disconnect(&mut self, raw: u32) {
        self.manager
            .handle_event(TransportEvent::PeerDisconnected {
                handle: handle(raw),
            })
            .await;
    }

    async fn receive(&mut self, raw: u32, frame: &'static [u8]) {
        self.manager
            .handle_event(TransportEvent::DataReceived {
                handle: handle(raw),
                data: Bytes::from_static(frame),
            })
            .await;
    }
}

fn handle(raw: u32) -> ConnectionHandle {
    ConnectionHandle::new(raw).unwrap()
}

#[tokio::test]
async fn on_asserts_output_and_echoes() {
    let mut bridge = Bridge::new();
    bridge.connect(7).await;

    bridge.receive(7, b"ON").await;

    assert_eq!(bridge.actuator.history(), vec![ActuatorState::Asserted]);
    let writes = bridge.transport.writes();
    assert_eq!(writes, vec![(handle(7), Bytes::from_static(b"ON"))]);
    assert_eq!(writes[0].1.len(), 2);
}

#[tokio::test]
async fn off_deasserts_output_and_echoes() {
    let mut bridge = Bridge::new();
    bridge.connect(7).await;

    bridge.receive(7, b"OFF").await;

    assert_eq!(bridge.actuator.history(), vec![ActuatorState::Deasserted]);
    assert_eq!(
        bridge.transport.writes(),
        vec![(handle(7), Bytes::from_static(b"OFF"))]
    );
}

#[tokio::test]
async fn on_prefix_wins_over_trailing_bytes() {
    let mut bridge = Bridge::new();
    bridge.connect(7).await;

    bridge.receive(7, b"ONX").await;

    assert_eq!(bridge.actuator.history(), vec![ActuatorState::Asserted]);
    assert_eq!(
        bridge.transport.writes(),
        vec![(handle(7), Bytes::from_static(b"ONX"))]
    );
}

#[tokio::test]
async fn empty_frame_is_echoed_without_effect() {
    let mut bridge = Bridge::new();
    bridge.connect(7).await;

    bridge.receive(7, b"").await;

    assert!(bridge.actuator.history().is_empty());
    assert_eq!(bridge.transport.writes(), vec![(handle(7), Bytes::new())]);
}

#[tokio::test]
async fn long_unrecognized_frame_is_echoed_in_full() {
    let mut bridge = Bridge::new();
    bridge.connect(7).await;

    bridge.receive(7, b"HELLO").await;

    assert!(bridge.actuator.history().is_empty());
    assert_eq!(
        bridge.transport.writes(),
        vec![(handle(7), Bytes::from_static(b"HELLO"))]
    );
}

#[tokio::test]
async fn no_echo_after_disconnect() {
    let mut bridge = Bridge::new();
    bridge.connect(5).await;
    bridge.disconnect(5).await;
    assert_eq!(bridge.manager.state(), SessionState::Disconnected);

    bridge.receive(5, b"ON").await;

    assert!(bridge.transport.writes().is_empty());
}

#[tokio::test]
async fn frame_after_disconnect_leaves_output_untouched() {
    let mut bridge = Bridge::new();
    bridge.connect(5).await;
    bridge.disconnect(5).await;

    bridge.receive(5, b"OFF").await;

    assert!(bridge.actuator.history().is_empty());
    assert!(bridge.transport.writes().is_empty());
}

#[tokio::test]
async fn last_connect_wins() {
    let mut bridge = Bridge::new();
    bridge.connect(1).await;
    bridge.connect(2).await;

    assert_eq!(bridge.manager.active_handle(), Some(handle(2)));

    bridge.disconnect(2).await;
    assert_eq!(bridge.manager.active_handle(), None);
}

#[tokio::test]
async fn identical_frames_have_identical_results() {
    let mut bridge = Bridge::new();
    bridge.connect(3).await;

    bridge.receive(3, b"OFF").await;
    bridge.receive(3, b"OFF").await;

    assert_eq!(
        bridge.actuator.history(),
        vec![ActuatorState::Deasserted, ActuatorState::Deasserted]
    );
    let writes = bridge.transport.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}

#[tokio::test]
async fn tcp_simulation_round_trip() {
    let (events_tx, mut events_rx) = event_channel();
    let tcp = Arc::new(TcpTransport::new(
        "127.0.0.1:0".parse().unwrap(),
        LinkConfig::default(),
        events_tx,
    ));
    let transport: Arc<dyn TransportControl> = tcp.clone();
    let actuator = RecordingActuator::new();
    let mut manager = SessionManager::new(
        SessionConfig::default(),
        transport,
        Box::new(actuator.clone()),
    );

    tokio::spawn(async move {
        manager.run(&mut events_rx).await;
    });

    let addr = timeout(Duration::from_secs(2), async {
        loop {
            if let Some(addr) = tcp.local_addr() {
                return addr;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("listener never started");

    let radio = tcp.radio();
    assert_eq!(radio.visible_name.as_deref(), Some("ESP32_SPP_SERVER"));
    assert!(radio.discoverable);

    let mut peer = TcpStream::connect(addr).await.unwrap();

    peer.write_all(b"ON").await.unwrap();
    let mut echo = [0u8; 2];
    timeout(Duration::from_secs(2), peer.read_exact(&mut echo))
        .await
        .expect("no echo")
        .unwrap();
    assert_eq!(&echo, b"ON");
    assert_eq!(actuator.last(), Some(ActuatorState::Asserted));

    peer.write_all(b"OFF").await.unwrap();
    let mut echo = [0u8; 3];
    timeout(Duration::from_secs(2), peer.read_exact(&mut echo))
        .await
        .expect("no echo")
        .unwrap();
    assert_eq!(&echo, b"OFF");
    assert_eq!(actuator.last(), Some(ActuatorState::Deasserted));
}
