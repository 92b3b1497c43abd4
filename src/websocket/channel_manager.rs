//! Realtime channel manager.
//!
//! Owns at most one socket for one wallet address, keeps the set of channels
//! the consumer wants, replays that set after every reconnect and exposes the
//! newest inbound message plus the connection state.
//!
//! The connection task walks `Connecting -> Connected -> ReconnectPending ->
//! Connecting ...` with a fixed delay between attempts and no retry cap. All
//! mutable state sits behind one mutex that is never held across an await,
//! and every write from the task is checked against a generation counter, so
//! once [`ChannelManager::set_address`] or [`ChannelManager::shutdown`]
//! returns the previous task can neither publish a message nor connect again.

use super::transport::{Connection, Transport};
use crate::types::{ConnectionState, InboundMessage, SubscriptionRequest};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

struct Shared {
    address: Option<String>,
    subscriptions: HashSet<String>,
    /// Queue into the live socket; `Some` only while connected.
    outbound: Option<mpsc::UnboundedSender<String>>,
    generation: u64,
    last_error: Option<String>,
}

impl Shared {
    fn frame(&self, request: SubscriptionRequest) -> Option<String> {
        match serde_json::to_string(&request) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Failed to encode subscription frame: {}", e);
                None
            }
        }
    }

    fn enqueue(&self, text: String) -> bool {
        match &self.outbound {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }
}

/// Handles shared between the manager and its connection task.
struct Cells {
    shared: Mutex<Shared>,
    latest: watch::Sender<Option<InboundMessage>>,
    state: watch::Sender<ConnectionState>,
}

impl Cells {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maintains one reconnecting socket per wallet address.
///
/// Must be driven from inside a tokio runtime: setting an address spawns the
/// connection task.
pub struct ChannelManager<T: Transport> {
    transport: Arc<T>,
    url: String,
    reconnect_delay: Duration,
    cells: Arc<Cells>,
    task: Option<JoinHandle<()>>,
}

impl<T: Transport> ChannelManager<T> {
    /// Create an idle manager. No socket is opened until an address is set.
    pub fn new(transport: T, url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        let (state, _) = watch::channel(ConnectionState::Idle);

        Self {
            transport: Arc::new(transport),
            url: url.into(),
            reconnect_delay,
            cells: Arc::new(Cells {
                shared: Mutex::new(Shared {
                    address: None,
                    subscriptions: HashSet::new(),
                    outbound: None,
                    generation: 0,
                    last_error: None,
                }),
                latest,
                state,
            }),
            task: None,
        }
    }

    /// Point the manager at a wallet address, or at none.
    ///
    /// Any existing socket and pending reconnect are torn down first. The
    /// retained subscriptions carry over to the new address.
    pub fn set_address(&mut self, address: Option<String>) {
        if self.address() == address && (address.is_none() || self.task.is_some()) {
            return;
        }

        let generation = self.teardown();
        self.cells.latest.send_replace(None);

        let Some(address) = address else {
            return;
        };

        self.cells.lock().address = Some(address.clone());
        info!("Starting realtime feed for {}", address);

        let driver = Driver {
            transport: self.transport.clone(),
            url: self.url.clone(),
            address,
            reconnect_delay: self.reconnect_delay,
            cells: self.cells.clone(),
            generation,
        };
        self.task = Some(tokio::spawn(driver.run()));
    }

    /// Tear down the socket, cancel any pending reconnect and forget the
    /// retained subscriptions.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.cells.lock().subscriptions.clear();
    }

    /// Invalidate the running task and return the new generation.
    fn teardown(&mut self) -> u64 {
        let generation = {
            let mut shared = self.cells.lock();
            shared.generation += 1;
            shared.outbound = None;
            shared.address = None;
            self.cells.state.send_replace(ConnectionState::Idle);
            shared.generation
        };

        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Realtime task aborted");
        }
        generation
    }

    /// Add channels to the retained set. While connected, one subscribe frame
    /// is sent for each channel that was not already retained.
    pub fn subscribe<I, S>(&self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.cells.lock();
        for channel in channels {
            let channel = channel.as_ref();
            if !shared.subscriptions.insert(channel.to_string()) {
                continue;
            }
            let request = SubscriptionRequest::subscribe(channel, shared.address.as_deref());
            if let Some(frame) = shared.frame(request) {
                if shared.enqueue(frame) {
                    debug!("Subscribed to {}", channel);
                }
            }
        }
    }

    /// Remove channels from the retained set. While connected, one
    /// unsubscribe frame is sent for each channel that was retained.
    pub fn unsubscribe<I, S>(&self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut shared = self.cells.lock();
        for channel in channels {
            let channel = channel.as_ref();
            if !shared.subscriptions.remove(channel) {
                continue;
            }
            let request = SubscriptionRequest::unsubscribe(channel, shared.address.as_deref());
            if let Some(frame) = shared.frame(request) {
                if shared.enqueue(frame) {
                    debug!("Unsubscribed from {}", channel);
                }
            }
        }
    }

    /// Send an arbitrary JSON payload. Dropped when not connected; returns
    /// whether it was handed to the socket.
    pub fn send_message(&self, payload: &Value) -> bool {
        let shared = self.cells.lock();
        if shared.outbound.is_none() {
            debug!("Dropping outbound message while disconnected");
            return false;
        }
        match serde_json::to_string(payload) {
            Ok(text) => shared.enqueue(text),
            Err(e) => {
                warn!("Failed to encode outbound message: {}", e);
                false
            }
        }
    }

    pub fn address(&self) -> Option<String> {
        self.cells.lock().address.clone()
    }

    pub fn state(&self) -> ConnectionState {
        *self.cells.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.cells.state.subscribe()
    }

    /// The newest well-formed inbound message, if any.
    pub fn last_message(&self) -> Option<InboundMessage> {
        self.cells.latest.borrow().clone()
    }

    /// Latest-value receiver for inbound messages. Frames that arrive faster
    /// than the consumer reads them overwrite each other.
    pub fn messages(&self) -> watch::Receiver<Option<InboundMessage>> {
        self.cells.latest.subscribe()
    }

    /// Channels retained for the current and future connections.
    pub fn subscriptions(&self) -> HashSet<String> {
        self.cells.lock().subscriptions.clone()
    }

    /// Most recent connection error, cleared on a successful connect.
    pub fn last_error(&self) -> Option<String> {
        self.cells.lock().last_error.clone()
    }
}

impl<T: Transport> Drop for ChannelManager<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// The connection task for one address and one generation.
struct Driver<T: Transport> {
    transport: Arc<T>,
    url: String,
    address: String,
    reconnect_delay: Duration,
    cells: Arc<Cells>,
    generation: u64,
}

impl<T: Transport> Driver<T> {
    async fn run(self) {
        loop {
            if !self.transition(ConnectionState::Connecting) {
                return;
            }
            info!("Connecting to realtime feed at {}", self.url);

            match self.transport.connect(&self.url).await {
                Ok(connection) => self.run_connection(connection).await,
                Err(e) => {
                    warn!("Realtime connection failed: {}", e);
                    self.record_error(e.to_string());
                }
            }

            if !self.transition(ConnectionState::ReconnectPending) {
                return;
            }
            info!(
                "Realtime feed disconnected, reconnecting in {:?}",
                self.reconnect_delay
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Apply a state change unless this task has been superseded.
    fn transition(&self, next: ConnectionState) -> bool {
        let shared = self.cells.lock();
        if shared.generation != self.generation {
            return false;
        }
        self.cells.state.send_replace(next);
        true
    }

    fn record_error(&self, error: String) {
        let mut shared = self.cells.lock();
        if shared.generation == self.generation {
            shared.last_error = Some(error);
        }
    }

    async fn run_connection(&self, connection: Connection) {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let replayed = {
            let mut shared = self.cells.lock();
            if shared.generation != self.generation {
                return;
            }

            let mut replayed = 0;
            for channel in &shared.subscriptions {
                let request = SubscriptionRequest::subscribe(channel, Some(&self.address));
                if let Some(frame) = shared.frame(request) {
                    if tx.send(frame).is_ok() {
                        replayed += 1;
                    }
                }
            }
            shared.outbound = Some(tx);
            shared.last_error = None;
            self.cells.state.send_replace(ConnectionState::Connected);
            replayed
        };
        info!(
            "Connected to realtime feed for {} ({} channels)",
            self.address, replayed
        );

        let Connection {
            mut sink,
            mut stream,
        } = connection;

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => {
                        warn!("Realtime read error: {}", e);
                        self.record_error(e.to_string());
                        break;
                    }
                    None => {
                        info!("Realtime socket closed by peer");
                        break;
                    }
                },
                outgoing = rx.recv() => match outgoing {
                    Some(text) => {
                        debug!("-> {}", text);
                        if let Err(e) = sink.send(text).await {
                            warn!("Realtime write error: {}", e);
                            self.record_error(e.to_string());
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        let mut shared = self.cells.lock();
        if shared.generation == self.generation {
            shared.outbound = None;
        }
    }

    fn handle_frame(&self, text: &str) {
        let message: InboundMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping malformed realtime frame: {}", e);
                return;
            }
        };

        let shared = self.cells.lock();
        if shared.generation != self.generation {
            return;
        }
        debug!("<- {} frame", message.channel);
        self.cells.latest.send_replace(Some(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::types::{SubscriptionMethod, ALL_MIDS_CHANNEL, USER_CHANNEL};
    use futures_util::future::{self, BoxFuture};
    use futures_util::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADDRESS: &str = "0x742e4c4b9f6abd59f4c37b7f5c9c8b9aef123456";
    const OTHER_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
    const DELAY: Duration = Duration::from_secs(3);

    /// Server-side view of one fake connection.
    struct FakeSession {
        sent: mpsc::UnboundedReceiver<String>,
        inbound: mpsc::UnboundedSender<Result<String>>,
    }

    #[derive(Clone)]
    struct FakeTransport {
        attempts: Arc<AtomicUsize>,
        failures_left: Arc<AtomicUsize>,
        sessions: mpsc::UnboundedSender<FakeSession>,
    }

    impl FakeTransport {
        fn new() -> (Self, mpsc::UnboundedReceiver<FakeSession>) {
            let (sessions, rx) = mpsc::unbounded_channel();
            let transport = Self {
                attempts: Arc::new(AtomicUsize::new(0)),
                failures_left: Arc::new(AtomicUsize::new(0)),
                sessions,
            };
            (transport, rx)
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        fn fail_next(&self, count: usize) {
            self.failures_left.store(count, Ordering::SeqCst);
        }
    }

    impl Transport for FakeTransport {
        fn connect(&self, _url: &str) -> BoxFuture<'static, Result<Connection>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);

            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return future::ready(Err(AppError::WebSocket("connection refused".into()))).boxed();
            }

            let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
            let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<String>>();
            let _ = self.sessions.send(FakeSession {
                sent: out_rx,
                inbound: in_tx,
            });

            let sink = futures_util::sink::unfold(out_tx, |tx, frame: String| async move {
                tx.send(frame)
                    .map_err(|_| AppError::WebSocket("peer gone".into()))?;
                Ok::<_, AppError>(tx)
            });
            let stream = futures_util::stream::unfold(in_rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            });

            future::ready(Ok(Connection {
                sink: Box::pin(sink),
                stream: stream.boxed(),
            }))
            .boxed()
        }
    }

    fn manager(transport: &FakeTransport) -> ChannelManager<FakeTransport> {
        ChannelManager::new(transport.clone(), "ws://fake/ws", DELAY)
    }

    async fn recv_frames(session: &mut FakeSession, count: usize) -> Vec<SubscriptionRequest> {
        let mut frames = Vec::new();
        for _ in 0..count {
            let text = session.sent.recv().await.unwrap();
            frames.push(serde_json::from_str(&text).unwrap());
        }
        frames
    }

    async fn assert_quiet(session: &mut FakeSession) {
        let extra = tokio::time::timeout(Duration::from_secs(1), session.sent.recv()).await;
        assert!(extra.is_err(), "unexpected frame: {:?}", extra);
    }

    fn channels(frames: &[SubscriptionRequest]) -> HashSet<String> {
        frames
            .iter()
            .map(|f| f.subscription.channel.clone())
            .collect()
    }

    fn expected(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_idle_without_address() {
        let (transport, _sessions) = FakeTransport::new();
        let manager = manager(&transport);

        manager.subscribe([USER_CHANNEL]);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(manager.state(), ConnectionState::Idle);
        assert_eq!(transport.attempts(), 0);
        assert_eq!(manager.subscriptions(), expected(&[USER_CHANNEL]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriptions_requested_while_idle_sent_on_connect() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);

        manager.subscribe([USER_CHANNEL, ALL_MIDS_CHANNEL]);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut session = sessions.recv().await.unwrap();
        let frames = recv_frames(&mut session, 2).await;

        assert_eq!(channels(&frames), expected(&[USER_CHANNEL, ALL_MIDS_CHANNEL]));
        for frame in &frames {
            assert_eq!(frame.method, SubscriptionMethod::Subscribe);
            assert_eq!(frame.subscription.user.as_deref(), Some(ADDRESS));
        }
        assert!(manager.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_replays_each_subscription_once() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut first = sessions.recv().await.unwrap();
        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        manager.subscribe([USER_CHANNEL, ALL_MIDS_CHANNEL]);
        let frames = recv_frames(&mut first, 2).await;
        assert_eq!(channels(&frames), expected(&[USER_CHANNEL, ALL_MIDS_CHANNEL]));

        // Peer closes the socket
        drop(first.inbound);

        let mut second = sessions.recv().await.unwrap();
        let frames = recv_frames(&mut second, 2).await;
        assert_eq!(channels(&frames), expected(&[USER_CHANNEL, ALL_MIDS_CHANNEL]));
        assert_quiet(&mut second).await;
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_waits_fixed_delay() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let first = sessions.recv().await.unwrap();
        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        let closed_at = tokio::time::Instant::now();
        drop(first);

        let _second = sessions.recv().await.unwrap();
        assert!(closed_at.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connects_retry_indefinitely() {
        let (transport, mut sessions) = FakeTransport::new();
        transport.fail_next(5);
        let mut manager = manager(&transport);
        manager.subscribe([USER_CHANNEL]);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut session = sessions.recv().await.unwrap();
        assert_eq!(transport.attempts(), 6);

        let frames = recv_frames(&mut session, 1).await;
        assert_eq!(channels(&frames), expected(&[USER_CHANNEL]));
        assert!(manager.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_recorded() {
        let (transport, _sessions) = FakeTransport::new();
        transport.fail_next(usize::MAX);
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::ReconnectPending)
            .await
            .unwrap();

        assert!(!manager.is_connected());
        assert!(manager
            .last_error()
            .unwrap()
            .contains("connection refused"));
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_reconnect() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.subscribe([USER_CHANNEL]);
        manager.set_address(Some(ADDRESS.to_string()));

        let first = sessions.recv().await.unwrap();
        drop(first);

        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::ReconnectPending)
            .await
            .unwrap();

        let mut messages = manager.messages();
        manager.shutdown();
        tokio::time::sleep(DELAY * 10).await;

        assert_eq!(transport.attempts(), 1);
        assert!(sessions.try_recv().is_err());
        assert!(!messages.has_changed().unwrap_or(false));
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(manager.subscriptions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_messages_after_shutdown() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let session = sessions.recv().await.unwrap();
        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        let mut messages = manager.messages();
        manager.shutdown();

        let _ = session
            .inbound
            .send(Ok(r#"{"channel":"user","data":{}}"#.to_string()));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!messages.has_changed().unwrap_or(false));
        assert!(manager.last_message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let first = sessions.recv().await.unwrap();
        drop(manager);
        drop(first);
        tokio::time::sleep(DELAY * 10).await;

        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_address_change_starts_fresh_socket() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.subscribe([USER_CHANNEL]);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut first = sessions.recv().await.unwrap();
        recv_frames(&mut first, 1).await;

        manager.set_address(Some(OTHER_ADDRESS.to_string()));
        let mut second = sessions.recv().await.unwrap();
        let frames = recv_frames(&mut second, 1).await;

        assert_eq!(frames[0].subscription.user.as_deref(), Some(OTHER_ADDRESS));
        assert_eq!(manager.address().as_deref(), Some(OTHER_ADDRESS));
        assert_eq!(transport.attempts(), 2);

        // Old socket is gone
        assert!(first.sent.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_address_goes_idle() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));
        let _session = sessions.recv().await.unwrap();

        manager.set_address(None);
        tokio::time::sleep(DELAY * 2).await;

        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(manager.address().is_none());
        assert_eq!(transport.attempts(), 1);
    }

    // =========================================================================
    // Frames
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frames_dropped_without_disconnect() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let session = sessions.recv().await.unwrap();
        let mut messages = manager.messages();

        session.inbound.send(Ok("not json".to_string())).unwrap();
        session
            .inbound
            .send(Ok(r#"{"no_channel":true}"#.to_string()))
            .unwrap();
        session
            .inbound
            .send(Ok(r#"{"channel":"allMids","data":{"mids":{"BTC":"1"}}}"#.to_string()))
            .unwrap();

        messages.changed().await.unwrap();
        let latest = messages.borrow_and_update().clone().unwrap();
        assert_eq!(latest.channel, ALL_MIDS_CHANNEL);
        assert!(manager.is_connected());
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_message_replaces_previous() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let session = sessions.recv().await.unwrap();
        let mut messages = manager.messages();
        session
            .inbound
            .send(Ok(r#"{"channel":"user","data":1}"#.to_string()))
            .unwrap();
        session
            .inbound
            .send(Ok(r#"{"channel":"allMids","data":2}"#.to_string()))
            .unwrap();

        messages
            .wait_for(|m| m.as_ref().is_some_and(|m| m.data == serde_json::json!(2)))
            .await
            .unwrap();

        let latest = manager.last_message().unwrap();
        assert_eq!(latest.channel, ALL_MIDS_CHANNEL);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_while_connected_sends_once() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut session = sessions.recv().await.unwrap();
        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        manager.subscribe([USER_CHANNEL]);
        manager.subscribe([USER_CHANNEL]);
        let frames = recv_frames(&mut session, 1).await;
        assert_eq!(frames[0].method, SubscriptionMethod::Subscribe);
        assert_quiet(&mut session).await;

        manager.unsubscribe([USER_CHANNEL, ALL_MIDS_CHANNEL]);
        let frames = recv_frames(&mut session, 1).await;
        assert_eq!(frames[0].method, SubscriptionMethod::Unsubscribe);
        assert_eq!(frames[0].subscription.channel, USER_CHANNEL);
        assert_quiet(&mut session).await;
        assert!(manager.subscriptions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_while_disconnected_skips_replay() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.subscribe([USER_CHANNEL, ALL_MIDS_CHANNEL]);
        manager.unsubscribe([ALL_MIDS_CHANNEL]);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut session = sessions.recv().await.unwrap();
        let frames = recv_frames(&mut session, 1).await;
        assert_eq!(channels(&frames), expected(&[USER_CHANNEL]));
        assert_quiet(&mut session).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_dropped_when_disconnected() {
        let (transport, _sessions) = FakeTransport::new();
        let manager = manager(&transport);
        assert!(!manager.send_message(&serde_json::json!({"method": "ping"})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_when_connected() {
        let (transport, mut sessions) = FakeTransport::new();
        let mut manager = manager(&transport);
        manager.set_address(Some(ADDRESS.to_string()));

        let mut session = sessions.recv().await.unwrap();
        let mut state = manager.state_changes();
        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        assert!(manager.send_message(&serde_json::json!({"method": "ping"})));
        let text = session.sent.recv().await.unwrap();
        assert_eq!(text, r#"{"method":"ping"}"#);
    }
}
