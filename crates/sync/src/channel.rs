//! Focus sync over a relay WebSocket.
//!
//! Send path: locally originated focus changes are written into a
//! latest-value slot and flushed at most once per `min_send_interval`; a
//! newer value overwrites one still waiting, so only the most recent focus
//! leaves the client.
//!
//! Receive path: `focusUpdated` frames are applied to the store with
//! [`FocusOrigin::Remote`], which the send path ignores. A received value is
//! therefore never echoed back to the relay.

use std::sync::Arc;
use std::time::Instant;

use focus::{FocusChanged, FocusOrigin, FocusStore};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use runtime::{Backoff, EventBus, SubscriptionId, Throttle};
use scene::EntityRef;
use streaming::{
    ClientMessage, ConnectionState, ControlEvent, FocusPayload, ProtocolError, ServerMessage,
    SyncConfig, decode_server, encode,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Shared {
    store: Arc<FocusStore>,
    config: SyncConfig,
    state: Mutex<ConnectionState>,
    states: EventBus<ConnectionState>,
    controls: EventBus<ControlEvent>,
}

/// Receiving halves of the outbound queues, owned by the connection task.
struct Outbound {
    focus: watch::Receiver<Option<FocusPayload>>,
    controls: mpsc::Receiver<ControlEvent>,
    /// Last focus the relay is known to have accepted.
    last_sent: Option<FocusPayload>,
}

impl Outbound {
    /// Re-arms the focus slot if its value never made it out, e.g. the
    /// session ended between taking the value and finishing the send.
    fn resume_unsent(&mut self) {
        let unsent = self
            .focus
            .borrow()
            .as_ref()
            .is_some_and(|p| self.last_sent.as_ref() != Some(p));
        if unsent {
            self.focus.mark_changed();
        }
    }
}

/// Client side of the focus relay.
///
/// Creating a channel only subscribes to the store. The connection is opened
/// by the first [`SyncChannel::ensure_connected`] call and kept alive (with
/// reconnects) until [`SyncChannel::shutdown`] or drop.
pub struct SyncChannel {
    shared: Arc<Shared>,
    control_tx: mpsc::Sender<ControlEvent>,
    outbound: Mutex<Option<Outbound>>,
    task: Mutex<Option<JoinHandle<()>>>,
    focus_subscription: SubscriptionId,
}

impl SyncChannel {
    pub fn new(store: Arc<FocusStore>, config: SyncConfig) -> Self {
        let (focus_tx, focus_rx) = watch::channel(None);
        let (control_tx, control_rx) = mpsc::channel(config.control_queue.max(1));

        let focus_subscription = store.subscribe(move |ev: &FocusChanged| {
            match (&ev.focus, ev.origin) {
                (Some(focus), FocusOrigin::Local) => {
                    focus_tx.send_replace(Some(FocusPayload::from(focus)));
                }
                _ => {
                    // Anything still waiting for the throttle is stale now.
                    focus_tx.send_if_modified(|pending| {
                        pending.take();
                        false
                    });
                }
            }
        });

        Self {
            shared: Arc::new(Shared {
                store,
                config,
                state: Mutex::new(ConnectionState::Disconnected),
                states: EventBus::new(),
                controls: EventBus::new(),
            }),
            control_tx,
            outbound: Mutex::new(Some(Outbound {
                focus: focus_rx,
                controls: control_rx,
                last_sent: None,
            })),
            task: Mutex::new(None),
            focus_subscription,
        }
    }

    /// Starts the connection task on first use; later calls reuse it.
    ///
    /// Returns `false` when no task is running: called outside a tokio
    /// runtime, or after [`SyncChannel::shutdown`].
    pub fn ensure_connected(&self) -> bool {
        let mut task = self.task.lock();
        if task.is_some() {
            return true;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("sync channel needs a tokio runtime; staying disconnected");
            return false;
        };
        let Some(outbound) = self.outbound.lock().take() else {
            return false;
        };

        debug!("starting relay connection to {}", self.shared.config.url);
        *task = Some(handle.spawn(connection_loop(Arc::clone(&self.shared), outbound)));
        true
    }

    /// Stops the connection task. The channel cannot be restarted.
    pub fn shutdown(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Connection state changes. Useful for "relay offline" indicators.
    pub fn connection_events(&self) -> &EventBus<ConnectionState> {
        &self.shared.states
    }

    /// `resetView` / `startCounting` signals received from other clients.
    pub fn control_events(&self) -> &EventBus<ControlEvent> {
        &self.shared.controls
    }

    /// Queues a control signal for the relay. Dropped when the queue is full.
    pub fn send_control(&self, event: ControlEvent) -> bool {
        match self.control_tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("dropping control event {event:?}: {e}");
                false
            }
        }
    }

    pub fn store(&self) -> &Arc<FocusStore> {
        &self.shared.store
    }
}

impl Drop for SyncChannel {
    fn drop(&mut self) {
        self.shared.store.unsubscribe(self.focus_subscription);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.lock();
            if *state == next {
                return;
            }
            if !state.can_transition_to(next) {
                warn!("unexpected connection transition {:?} -> {next:?}", *state);
            }
            *state = next;
        }
        self.states.publish(&next);
    }

    /// Applies one relay text frame. Malformed frames are logged and dropped.
    fn apply_inbound(&self, text: &str) {
        match decode_server(text) {
            Ok(ServerMessage::FocusUpdated(payload)) => {
                let focus = EntityRef::from(payload);
                self.store.set_current(Some(focus), FocusOrigin::Remote);
            }
            Ok(msg) => {
                if let Some(ev) = msg.control() {
                    debug!("relay control event {ev:?}");
                    self.controls.publish(&ev);
                }
            }
            Err(e) => warn!("discarding relay message: {e}"),
        }
    }
}

async fn connection_loop(shared: Arc<Shared>, mut outbound: Outbound) {
    let cfg = &shared.config;
    let mut backoff = Backoff::new(cfg.retry_initial(), cfg.retry_max());
    let mut throttle = Throttle::new(cfg.min_send_interval());
    let mut failures = 0u32;

    loop {
        shared.set_state(ConnectionState::Connecting);
        match connect_async(cfg.url.as_str()).await {
            Ok((socket, _response)) => {
                info!("connected to relay {}", cfg.url);
                shared.set_state(ConnectionState::Connected);
                backoff.reset();
                failures = 0;

                match run_session(&shared, socket, &mut outbound, &mut throttle).await {
                    Ok(()) => info!("relay connection closed"),
                    Err(e) => warn!("relay connection lost: {e}"),
                }
                shared.set_state(ConnectionState::Disconnected);
            }
            Err(e) => {
                shared.set_state(ConnectionState::Disconnected);
                failures += 1;
                warn!("relay connect to {} failed (attempt {failures}): {e}", cfg.url);
                if let Some(max) = cfg.max_attempts
                    && failures >= max
                {
                    error!("giving up on relay after {failures} attempts");
                    return;
                }
            }
        }

        let delay = backoff.next_delay();
        debug!("reconnecting in {delay:?}");
        tokio::time::sleep(delay).await;
    }
}

async fn run_session(
    shared: &Shared,
    socket: Socket,
    outbound: &mut Outbound,
    throttle: &mut Throttle,
) -> Result<(), SyncError> {
    outbound.resume_unsent();
    let (sink, stream) = socket.split();
    tokio::select! {
        r = read_loop(shared, stream) => r,
        r = write_loop(sink, outbound, throttle) => r,
    }
}

async fn read_loop(shared: &Shared, mut stream: SplitStream<Socket>) -> Result<(), SyncError> {
    while let Some(msg) = stream.next().await {
        match msg? {
            Message::Text(text) => shared.apply_inbound(&text),
            Message::Close(_) => return Ok(()),
            // Pings are answered by tungstenite; binary frames are not part
            // of the protocol.
            _ => {}
        }
    }
    Ok(())
}

async fn write_loop(
    mut sink: SplitSink<Socket, Message>,
    outbound: &mut Outbound,
    throttle: &mut Throttle,
) -> Result<(), SyncError> {
    loop {
        let msg = tokio::select! {
            changed = outbound.focus.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let wait = throttle.remaining(Instant::now());
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
                let pending = outbound.focus.borrow_and_update().clone();
                let Some(payload) = pending else {
                    continue;
                };
                throttle.try_acquire(Instant::now());
                ClientMessage::UpdateFocus(payload)
            }
            ev = outbound.controls.recv() => match ev {
                Some(ev) => ClientMessage::from(ev),
                None => return Ok(()),
            },
        };

        let text = encode(&msg)?;
        sink.send(Message::Text(text)).await?;
        if let ClientMessage::UpdateFocus(payload) = msg {
            outbound.last_sent = Some(payload);
        }
    }
}
