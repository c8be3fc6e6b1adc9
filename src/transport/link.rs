//! Per-session link plumbing shared by the transport providers
//!
//! Every accepted stream gets a fresh handle, a reader task that turns reads
//! into `DataReceived` events and a writer task that drains a bounded queue.
//! Writes never wait for room: a full queue drops the frame and flags the
//! link congested until the writer catches up.
//! ```text
//!   peer --read--> [reader task] --DataReceived--> events
//!   write(handle) --queue--> [writer task] --write_all--> peer
//! ```

use crate::transport::traits::{TransportEvent, TransportStream};
use bytes::Bytes;
use spp_bridge_shared::{spp, ConnectionHandle, TransportError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Sender half of the event channel handed to a provider at registration
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Receiver half drained by the session manager
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Create the channel a provider reports its events on
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sizing shared by every link of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Largest payload delivered per `DataReceived`
    pub max_frame: usize,
    /// Outbound frames buffered before congestion is reported
    pub write_queue_depth: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_frame: spp::MAX_FRAME_LEN,
            write_queue_depth: spp::WRITE_QUEUE_DEPTH,
        }
    }
}

#[derive(Clone)]
struct Link {
    queue: mpsc::Sender<Bytes>,
    congested: Arc<AtomicBool>,
}

/// Table of open links keyed by handle
pub struct LinkTable {
    next_handle: AtomicU32,
    links: RwLock<HashMap<ConnectionHandle, Link>>,
    events: EventSender,
    max_frame: usize,
    write_queue_depth: usize,
}

impl LinkTable {
    /// Create an empty table reporting to `events`
    pub fn with_config(events: EventSender, config: LinkConfig) -> Arc<Self> {
        Self::new(events, config.max_frame, config.write_queue_depth)
    }

    /// Create an empty table with explicit sizing
    pub fn new(events: EventSender, max_frame: usize, write_queue_depth: usize) -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU32::new(1),
            links: RwLock::new(HashMap::new()),
            events,
            max_frame: max_frame.max(1),
            write_queue_depth: write_queue_depth.max(1),
        })
    }

    /// Report an event; a closed channel means the bridge is shutting down
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn allocate_handle(&self) -> ConnectionHandle {
        loop {
            let raw = self.next_handle.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = ConnectionHandle::new(raw) {
                return handle;
            }
        }
    }

    /// Take ownership of an accepted stream and start its tasks
    pub async fn attach<S: TransportStream>(
        self: &Arc<Self>,
        stream: S,
        peer: String,
    ) -> ConnectionHandle {
        let handle = self.allocate_handle();
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::channel::<Bytes>(self.write_queue_depth);
        let congested = Arc::new(AtomicBool::new(false));

        self.links.write().await.insert(
            handle,
            Link {
                queue: tx,
                congested: congested.clone(),
            },
        );
        self.emit(TransportEvent::PeerConnected { handle, peer });

        tokio::spawn(write_loop(
            writer,
            rx,
            self.events.clone(),
            handle,
            congested,
        ));
        tokio::spawn(read_loop(self.clone(), reader, handle));

        handle
    }

    /// Queue a frame on an open link
    ///
    /// Never waits for the peer. A full queue drops the frame with
    /// `Congested`; the first drop on a link also emits `Congested { true }`.
    pub async fn write(&self, handle: ConnectionHandle, data: Bytes) -> Result<(), TransportError> {
        let link = self
            .links
            .read()
            .await
            .get(&handle)
            .cloned()
            .ok_or(TransportError::UnknownHandle(handle))?;

        match link.queue.try_send(data) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                if !link.congested.swap(true, Ordering::SeqCst) {
                    self.emit(TransportEvent::Congested {
                        handle,
                        congested: true,
                    });
                }
                Err(TransportError::Congested(handle))
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::LinkClosed(handle)),
        }
    }

    /// Number of links currently open
    pub async fn open_links(&self) -> usize {
        self.links.read().await.len()
    }
}

async fn read_loop<R>(table: Arc<LinkTable>, mut reader: R, handle: ConnectionHandle)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; table.max_frame];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("[LINK] {} closed by peer", handle);
                break;
            }
            Ok(n) => {
                table.emit(TransportEvent::DataReceived {
                    handle,
                    data: Bytes::copy_from_slice(&buf[..n]),
                });
            }
            Err(e) => {
                warn!("[LINK] {} read error: {}", handle, e);
                break;
            }
        }
    }

    // Dropping the queue sender stops the writer task
    table.links.write().await.remove(&handle);
    table.emit(TransportEvent::PeerDisconnected { handle });
}

async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<Bytes>,
    events: EventSender,
    handle: ConnectionHandle,
    congested: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        // Taking a frame frees a slot
        if congested.swap(false, Ordering::SeqCst) {
            let _ = events.send(TransportEvent::Congested {
                handle,
                congested: false,
            });
        }

        let result = async {
            writer.write_all(&frame).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => {
                let _ = events.send(TransportEvent::WriteCompleted {
                    handle,
                    len: frame.len(),
                });
            }
            Err(e) => {
                warn!("[LINK] {} write error: {}", handle, e);
                break;
            }
        }
    }

    let _ = writer.shutdown().await;
}
