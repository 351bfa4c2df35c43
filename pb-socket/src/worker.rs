//! The real-time connection worker.
//!
//! One worker maintains one logical subscription (the global feed or a
//! single channel's feed) over a persistent WebSocket. A dedicated tokio
//! task owns the socket; outbound control frames from other threads are
//! handed off through a channel so there is only ever one writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use pb_core::constants;
use pb_core::error::PbError;

use crate::events::{ConnectionState, ReadConfirmation, WsCallbacks, WsEvent};

/// Subscription scope for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The server-wide feed.
    Global,
    /// A single channel's feed.
    Channel(String),
}

impl Scope {
    /// The socket path for this scope.
    fn ws_path(&self) -> String {
        match self {
            Self::Global => "/ws".to_string(),
            Self::Channel(channel_id) => format!("/ws/channels/{channel_id}"),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Channel(channel_id) => write!(f, "channel {channel_id}"),
        }
    }
}

/// Configuration for a worker's reconnection behavior.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Cap on reconnection attempts after failures. Exhaustion stops the
    /// worker until the next connect().
    pub max_reconnect_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub initial_reconnect_delay: Duration,
    /// Cap on the exponential backoff delay.
    pub max_reconnect_delay: Duration,
    /// Bound on how long disconnect() waits for the worker task to exit.
    pub disconnect_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: constants::DEFAULT_MAX_RECONNECT_ATTEMPTS,
            initial_reconnect_delay: Duration::from_secs_f64(
                constants::DEFAULT_RECONNECT_DELAY_SECS,
            ),
            max_reconnect_delay: Duration::from_secs_f64(constants::MAX_RECONNECT_DELAY_SECS),
            disconnect_timeout: Duration::from_secs(5),
        }
    }
}

impl WsConfig {
    /// Backoff delay for the given attempt: initial * 2^attempt, capped.
    fn reconnect_delay(&self, attempt: u32) -> Duration {
        let base = self.initial_reconnect_delay.as_secs_f64();
        let max = self.max_reconnect_delay.as_secs_f64();
        let exponential = base * 2.0_f64.powi(attempt.min(31) as i32);
        Duration::from_secs_f64(exponential.min(max))
    }
}

/// How a connected session ended.
enum SessionEnd {
    /// Remote closed the socket cleanly.
    Closed,
    /// disconnect() was requested locally.
    Cancelled,
    /// The transport failed.
    Error(PbError),
}

/// State shared between the handle and the worker task.
struct WorkerInner {
    ws_url: String,
    scope: Scope,
    config: WsConfig,
    callbacks: WsCallbacks,
    running: AtomicBool,
    connected: AtomicBool,
    /// Sender side of the per-connection outbound handoff channel.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl WorkerInner {
    fn set_state(&self, new_state: ConnectionState) {
        let changed = {
            let current = *self.state_tx.borrow();
            current != new_state
        };
        if changed {
            debug!("worker ({}) state -> {}", self.scope, new_state);
            let _ = self.state_tx.send(new_state);
        }
    }
}

/// A real-time connection worker.
///
/// Invariant: at most one live socket per worker instance. connect() while
/// the worker task is alive is a no-op; disconnect() is always safe and
/// leaves the worker restartable.
pub struct WsWorker {
    inner: Arc<WorkerInner>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    /// Replaced on every connect() so stale cancellation permits from a
    /// previous run cannot leak into the next one.
    disconnect_notify: Mutex<Arc<Notify>>,
}

impl WsWorker {
    /// Create a worker for the given endpoint, token snapshot, and scope.
    ///
    /// `ws_origin` is "ws://host:port" or "wss://host:port"; the token is
    /// carried as a query credential, matching the server contract.
    pub fn new(
        ws_origin: &str,
        auth_token: &str,
        scope: Scope,
        config: WsConfig,
        callbacks: WsCallbacks,
    ) -> Self {
        let ws_url = format!("{}{}?auth_token={}", ws_origin, scope.ws_path(), auth_token);
        let (state_tx, _) = watch::channel(ConnectionState::Idle);

        Self {
            inner: Arc::new(WorkerInner {
                ws_url,
                scope,
                config,
                callbacks,
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                outbound: Mutex::new(None),
                state_tx,
            }),
            task: Mutex::new(None),
            disconnect_notify: Mutex::new(Arc::new(Notify::new())),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Start the worker task if it is not already running.
    ///
    /// Non-blocking and idempotent: calling this while the task is alive
    /// does nothing. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut task = self.task.lock().unwrap();
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                debug!("worker ({}) already running, connect is a no-op", self.inner.scope);
                return;
            }
        }

        self.inner.running.store(true, Ordering::SeqCst);
        let notify = Arc::new(Notify::new());
        *self.disconnect_notify.lock().unwrap() = Arc::clone(&notify);

        let inner = Arc::clone(&self.inner);
        info!("worker ({}) starting", inner.scope);
        *task = Some(tokio::spawn(run_loop(inner, notify)));
    }

    /// Stop the worker: clears the running flag, requests the socket close,
    /// and waits (bounded) for the task to exit.
    ///
    /// Safe to call from any task, including when never connected. A fresh
    /// connect() afterwards restarts the worker cleanly.
    pub async fn disconnect(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.disconnect_notify.lock().unwrap().notify_one();

        let handle = self.task.lock().unwrap().take();
        if let Some(mut handle) = handle {
            let timeout = self.inner.config.disconnect_timeout;
            if tokio::time::timeout(timeout, &mut handle).await.is_err() {
                warn!("worker ({}) did not exit within {:?}, aborting", self.inner.scope, timeout);
                handle.abort();
            }
        }
        self.inner.set_state(ConnectionState::Stopped);
        info!("worker ({}) disconnected", self.inner.scope);
    }

    /// Best-effort read confirmation for a message.
    ///
    /// The frame is serialized on the calling thread and handed off to the
    /// task owning the socket. Returns false when no connection is
    /// established; true means the frame was dispatched, not that the
    /// remote acknowledged it.
    pub fn send_read_confirmation(&self, message_id: &str, channel_id: Option<&str>) -> bool {
        let frame = ReadConfirmation {
            message_id: message_id.to_string(),
            channel_id: channel_id.map(str::to_string),
        };
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(_) => return false,
        };

        if !self.inner.connected.load(Ordering::SeqCst) {
            return false;
        }
        match &*self.inner.outbound.lock().unwrap() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }
}

/// The connection loop. Runs as long as `running` is set; exits on local
/// disconnect or retry-budget exhaustion, leaving the worker Stopped.
async fn run_loop(inner: Arc<WorkerInner>, notify: Arc<Notify>) {
    let mut attempt: u32 = 0;

    while inner.running.load(Ordering::SeqCst) {
        inner.set_state(ConnectionState::Connecting);
        debug!("worker ({}) handshake, attempt {}", inner.scope, attempt);

        match connect_async(&inner.ws_url).await {
            Ok((stream, _)) => {
                let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                *inner.outbound.lock().unwrap() = Some(outbound_tx);
                inner.connected.store(true, Ordering::SeqCst);
                inner.set_state(ConnectionState::Connected);
                attempt = 0;
                info!("worker ({}) connected", inner.scope);
                inner.callbacks.emit_connected();

                let end = drive_connection(&inner, stream, outbound_rx, &notify).await;

                inner.connected.store(false, Ordering::SeqCst);
                *inner.outbound.lock().unwrap() = None;

                match end {
                    SessionEnd::Closed => {
                        inner.set_state(ConnectionState::Closing);
                        info!("worker ({}) connection closed by remote", inner.scope);
                        inner.callbacks.emit_disconnected("connection closed");
                        // An orderly remote close does not consume retry
                        // budget; reconnect right away if still running.
                    }
                    SessionEnd::Cancelled => {
                        inner.set_state(ConnectionState::Closing);
                        inner.callbacks.emit_disconnected("disconnect requested");
                        break;
                    }
                    SessionEnd::Error(err) => {
                        inner.set_state(ConnectionState::Failed);
                        error!("worker ({}) transport error: {}", inner.scope, err);
                        inner.callbacks.emit_error(&err);
                        inner.callbacks.emit_disconnected("connection lost");
                        if !backoff_or_stop(&inner, &notify, &mut attempt).await {
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                let err = PbError::Socket(format!("handshake failed: {e}"));
                inner.set_state(ConnectionState::Failed);
                warn!("worker ({}) {}", inner.scope, err);
                inner.callbacks.emit_error(&err);
                if !backoff_or_stop(&inner, &notify, &mut attempt).await {
                    break;
                }
            }
        }
    }

    inner.running.store(false, Ordering::SeqCst);
    inner.set_state(ConnectionState::Stopped);
    debug!("worker ({}) stopped", inner.scope);
}

/// Sleep out the backoff for the current attempt and bump the counter.
/// Returns false when the retry budget is exhausted or a disconnect landed.
async fn backoff_or_stop(inner: &WorkerInner, notify: &Notify, attempt: &mut u32) -> bool {
    if !inner.running.load(Ordering::SeqCst) || *attempt >= inner.config.max_reconnect_attempts {
        return false;
    }

    let delay = inner.config.reconnect_delay(*attempt);
    warn!(
        "worker ({}) retrying in {:.2}s (attempt {}/{})",
        inner.scope,
        delay.as_secs_f64(),
        *attempt + 1,
        inner.config.max_reconnect_attempts
    );
    tokio::select! {
        _ = sleep(delay) => {}
        _ = notify.notified() => return false,
    }
    *attempt += 1;
    inner.running.load(Ordering::SeqCst)
}

/// Drive one established connection until it ends.
///
/// The socket is owned here: inbound frames are decoded and dispatched in
/// arrival order, outbound frames arrive through the handoff channel, and a
/// disconnect request closes the socket.
async fn drive_connection(
    inner: &WorkerInner,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    notify: &Notify,
) -> SessionEnd {
    let (mut sink, mut reader) = stream.split();

    loop {
        tokio::select! {
            _ = notify.notified() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            outbound = outbound_rx.recv() => {
                if let Some(text) = outbound {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        return SessionEnd::Error(PbError::Socket(format!("send failed: {e}")));
                    }
                }
            }
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<WsEvent>(&text) {
                    Ok(event) => inner.callbacks.emit_message(event),
                    // Malformed frames are expected noise, not faults.
                    Err(_) => debug!("worker ({}) discarding malformed frame", inner.scope),
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Error(PbError::Socket(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn quick_config() -> WsConfig {
        WsConfig {
            max_reconnect_attempts: 2,
            initial_reconnect_delay: Duration::from_millis(10),
            max_reconnect_delay: Duration::from_millis(100),
            disconnect_timeout: Duration::from_secs(2),
        }
    }

    /// Bind a listener, remember its port, and drop it so connections to
    /// that port are refused.
    async fn refused_origin() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("ws://127.0.0.1:{port}")
    }

    async fn wait_for_state(worker: &WsWorker, target: ConnectionState, timeout: Duration) {
        let mut rx = worker.state_receiver();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if *rx.borrow() == target {
                return;
            }
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .unwrap_or_default();
            if remaining.is_zero() {
                panic!("state {target} not reached, currently {}", *rx.borrow());
            }
            let _ = tokio::time::timeout(remaining, rx.changed()).await;
        }
    }

    #[test]
    fn test_ws_url_building() {
        let worker = WsWorker::new(
            "ws://127.0.0.1:7575",
            "u-1.token",
            Scope::Global,
            WsConfig::default(),
            WsCallbacks::new(),
        );
        assert_eq!(worker.inner.ws_url, "ws://127.0.0.1:7575/ws?auth_token=u-1.token");

        let worker = WsWorker::new(
            "ws://127.0.0.1:7575",
            "u-1.token",
            Scope::Channel("c-9".to_string()),
            WsConfig::default(),
            WsCallbacks::new(),
        );
        assert_eq!(
            worker.inner.ws_url,
            "ws://127.0.0.1:7575/ws/channels/c-9?auth_token=u-1.token"
        );
    }

    #[test]
    fn test_reconnect_delay_sequence() {
        let config = WsConfig {
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            ..WsConfig::default()
        };
        assert_eq!(config.reconnect_delay(0), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(config.reconnect_delay(4), Duration::from_secs(16));
        assert_eq!(config.reconnect_delay(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_initial_state_and_send_before_connect() {
        let worker = WsWorker::new(
            "ws://127.0.0.1:7575",
            "t",
            Scope::Global,
            WsConfig::default(),
            WsCallbacks::new(),
        );
        assert_eq!(worker.state(), ConnectionState::Idle);
        assert!(!worker.send_read_confirmation("m-1", None));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_safe() {
        let worker = WsWorker::new(
            "ws://127.0.0.1:7575",
            "t",
            Scope::Global,
            WsConfig::default(),
            WsCallbacks::new(),
        );
        worker.disconnect().await;
        assert_eq!(worker.state(), ConnectionState::Stopped);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_fires_error_per_attempt_and_restarts() {
        let origin = refused_origin().await;
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_cb = Arc::clone(&errors);

        let worker = WsWorker::new(
            &origin,
            "t",
            Scope::Global,
            quick_config(),
            WsCallbacks::new().on_error(move |_| {
                errors_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );

        worker.connect();
        wait_for_state(&worker, ConnectionState::Stopped, Duration::from_secs(5)).await;
        // Initial attempt plus two retries.
        assert_eq!(errors.load(Ordering::SeqCst), 3);

        // A fresh connect() restarts from attempt 0 and runs the full
        // budget again.
        worker.connect();
        wait_for_state(&worker, ConnectionState::Stopped, Duration::from_secs(5)).await;
        assert_eq!(errors.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_while_running() {
        let origin = refused_origin().await;
        let worker = WsWorker::new(
            &origin,
            "t",
            Scope::Global,
            WsConfig {
                // Long delays keep the task alive for the whole test.
                max_reconnect_attempts: 50,
                initial_reconnect_delay: Duration::from_secs(5),
                ..quick_config()
            },
            WsCallbacks::new(),
        );

        worker.connect();
        worker.connect();
        {
            let task = worker.task.lock().unwrap();
            assert!(task.as_ref().is_some_and(|h| !h.is_finished()));
        }
        worker.disconnect().await;
        assert_eq!(worker.state(), ConnectionState::Stopped);
    }

    #[tokio::test]
    async fn test_send_read_confirmation_after_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Text(text) = msg {
                    let _ = frame_tx.send(text);
                }
            }
        });

        let worker = WsWorker::new(
            &format!("ws://127.0.0.1:{port}"),
            "t",
            Scope::Channel("c-1".to_string()),
            quick_config(),
            WsCallbacks::new(),
        );
        worker.connect();
        wait_for_state(&worker, ConnectionState::Connected, Duration::from_secs(5)).await;

        assert!(worker.send_read_confirmation("m-1", Some("c-1")));

        let raw = tokio::time::timeout(Duration::from_secs(5), frame_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(frame["type"], "read_confirmation");
        assert_eq!(frame["message_id"], "m-1");
        assert_eq!(frame["channel_id"], "c-1");

        worker.disconnect().await;
        assert!(!worker.send_read_confirmation("m-2", None));
    }

    #[tokio::test]
    async fn test_events_dispatched_and_malformed_frames_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            ws.send(Message::Text("not json at all".to_string()))
                .await
                .unwrap();
            ws.send(Message::Text(
                r#"{"type":"presence_update","user_id":"u-2"}"#.to_string(),
            ))
            .await
            .unwrap();
            ws.send(Message::Text(
                r#"{"type":"chat_message","message_id":"m-7","sender_user_id":"u-2","channel_id":"c-1","message":"hey"}"#
                    .to_string(),
            ))
            .await
            .unwrap();
            // Hold the connection open until the client disconnects.
            while ws.next().await.is_some() {}
        });

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WsEvent>();
        let worker = WsWorker::new(
            &format!("ws://127.0.0.1:{port}"),
            "t",
            Scope::Global,
            quick_config(),
            WsCallbacks::new().on_message(move |event| {
                let _ = event_tx.send(event);
            }),
        );
        worker.connect();

        // Only the well-formed frame comes through.
        let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            WsEvent::ChatMessage(msg) => {
                assert_eq!(msg.message_id, "m-7");
                assert_eq!(msg.channel_id.as_deref(), Some("c-1"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(event_rx.try_recv().is_err());

        worker.disconnect().await;
    }

    #[tokio::test]
    async fn test_retry_counter_resets_on_successful_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Connections 1-2: dropped before the handshake (failures).
        // Connection 3: accepted, then closed cleanly (success).
        // Connections 4+: dropped again (failures).
        tokio::spawn(async move {
            let mut accepted = 0u32;
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    break;
                };
                accepted += 1;
                if accepted == 3 {
                    if let Ok(mut ws) = accept_async(tcp).await {
                        let _ = ws.close(None).await;
                    }
                } else {
                    drop(tcp);
                }
            }
        });

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_cb = Arc::clone(&errors);
        let connects = Arc::new(AtomicUsize::new(0));
        let connects_cb = Arc::clone(&connects);

        let worker = WsWorker::new(
            &format!("ws://127.0.0.1:{port}"),
            "t",
            Scope::Global,
            quick_config(),
            WsCallbacks::new()
                .on_error(move |_| {
                    errors_cb.fetch_add(1, Ordering::SeqCst);
                })
                .on_connected(move || {
                    connects_cb.fetch_add(1, Ordering::SeqCst);
                }),
        );

        worker.connect();
        wait_for_state(&worker, ConnectionState::Stopped, Duration::from_secs(10)).await;

        // Two failures before the success, then the full budget again after
        // it: the success reset the counter.
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_disconnect_during_backoff_is_prompt() {
        let origin = refused_origin().await;
        let worker = WsWorker::new(
            &origin,
            "t",
            Scope::Global,
            WsConfig {
                max_reconnect_attempts: 10,
                initial_reconnect_delay: Duration::from_secs(30),
                max_reconnect_delay: Duration::from_secs(60),
                disconnect_timeout: Duration::from_secs(2),
            },
            WsCallbacks::new(),
        );

        worker.connect();
        // Give the first attempt time to fail and enter backoff.
        sleep(Duration::from_millis(200)).await;

        let started = tokio::time::Instant::now();
        worker.disconnect().await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(worker.state(), ConnectionState::Stopped);
    }
}
