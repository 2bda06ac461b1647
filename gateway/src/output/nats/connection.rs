//! Broker connection management
//!
//! Every connection is dialed by our own loop so that dialing can run
//! forever and still be cancelled promptly. The NATS client gets a single
//! immediate reconnect attempt of its own; when that fails the connection is
//! dropped and the supervisor dials a fresh one behind the same
//! [`ConnectionManager`]. Writes made while no connection is installed are
//! held in a bounded backlog and replayed, in order, once one is.
//!
//! ```text
//! establish ──► spawn supervisor ──► wait for first connection (or cancel)
//!                    │
//!                    ├─ dial ok ─────► replay backlog, fill slot, watch link
//!                    ├─ dial err ────► log, sleep retry wait, dial again
//!                    ├─ link lost ───► empty slot, dial again
//!                    └─ shutdown ────► stop
//! ```

use crate::output::nats::config::{Credentials, ResolvedConfig};
use crate::shutdown::{Shutdown, ShutdownSignal};
use async_nats::connection::State;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use relay_core::PluginError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Bound on a single dial attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages buffered while the broker is unreachable
pub const PUBLISH_BUFFER_CAPACITY: usize = 65_536;

/// Bound on flushing pending messages at close
pub const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Reconnect attempts the NATS client makes on its own before the
/// connection is given up and redialed
pub const CLIENT_RECONNECT_ATTEMPTS: usize = 1;

/// Opens one connection to a broker address
#[async_trait]
pub trait Dialer: Send + Sync {
    type Connection: Send;

    async fn dial(&self, address: &str) -> Result<Self::Connection, PluginError>;
}

/// An open connection that messages can be published on
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<(), PluginError>;

    fn is_connected(&self) -> bool;

    /// Resolves once the connection is gone for good and must be redialed
    async fn lost(&self) {
        std::future::pending::<()>().await
    }

    /// Flush what is buffered and release the connection
    async fn close(&self) -> Result<(), PluginError>;
}

#[async_trait]
impl<P: Publish + ?Sized> Publish for Arc<P> {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<(), PluginError> {
        (**self).publish(subject, payload).await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn lost(&self) {
        (**self).lost().await
    }

    async fn close(&self) -> Result<(), PluginError> {
        (**self).close().await
    }
}

/// Link state as reported by the client's event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Connected,
    Disconnected,
    Closed,
}

/// A NATS client plus the link state fed by its event callback
pub struct NatsConnection {
    client: async_nats::Client,
    link: watch::Receiver<Link>,
}

impl NatsConnection {
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl Publish for NatsConnection {
    async fn publish(&self, subject: String, payload: Bytes) -> Result<(), PluginError> {
        self.client
            .publish(subject, payload)
            .await
            .map_err(|e| PluginError::Publish(e.to_string()))
    }

    fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), State::Connected)
    }

    /// The client's event task owns the link sender, so the sender going
    /// away means the client stopped for good.
    async fn lost(&self) {
        let mut link = self.link.clone();
        loop {
            let closed = match link.wait_for(|state| *state != Link::Connected).await {
                Ok(state) => *state == Link::Closed,
                Err(_) => true,
            };
            if closed {
                return;
            }

            // one in-place reconnect attempt, bounded by the dial timeout
            let back = matches!(
                tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    link.wait_for(|state| *state == Link::Connected),
                )
                .await,
                Ok(Ok(_))
            );
            if !back {
                return;
            }
        }
    }

    async fn close(&self) -> Result<(), PluginError> {
        if !Publish::is_connected(self) {
            return Ok(());
        }
        self.client
            .flush()
            .await
            .map_err(|e| PluginError::Shutdown(format!("flush: {e}")))
    }
}

/// Dial `address` until it succeeds or `signal` fires
///
/// Failures are logged and retried after `retry_wait`, without limit. The
/// signal is honored before each attempt, during an attempt and during the
/// wait, in which case [`PluginError::Cancelled`] is returned.
pub async fn dial_with_retry<D: Dialer + ?Sized>(
    dialer: &D,
    address: &str,
    retry_wait: Duration,
    signal: &mut ShutdownSignal,
) -> Result<D::Connection, PluginError> {
    let mut attempt: u64 = 0;

    loop {
        if signal.is_triggered() {
            return Err(PluginError::Cancelled);
        }
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = signal.triggered() => return Err(PluginError::Cancelled),
            result = dialer.dial(address) => result,
        };

        match outcome {
            Ok(connection) => {
                debug!(address, attempt, "dial succeeded");
                return Ok(connection);
            }
            Err(e) => {
                error!(
                    address,
                    attempt,
                    error = %e,
                    retry_in = ?retry_wait,
                    "failed to create connection"
                );
            }
        }

        tokio::select! {
            biased;
            _ = signal.triggered() => return Err(PluginError::Cancelled),
            _ = tokio::time::sleep(retry_wait) => {}
        }
    }
}

/// Delay the client sleeps before its reconnect attempt number `attempts`
///
/// The first attempt after a drop goes out at once.
pub fn reconnect_delay(attempts: usize, retry_wait: Duration) -> Duration {
    if attempts <= 1 {
        Duration::ZERO
    } else {
        retry_wait
    }
}

/// Dials real NATS brokers with the resolved connection settings
pub struct NatsDialer {
    name: String,
    credentials: Option<Credentials>,
    retry_wait: Duration,
}

impl NatsDialer {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            name: config.name.clone(),
            credentials: config.credentials.clone(),
            retry_wait: config.connect_retry_wait,
        }
    }
}

#[async_trait]
impl Dialer for NatsDialer {
    type Connection = NatsConnection;

    async fn dial(&self, address: &str) -> Result<NatsConnection, PluginError> {
        let retry_wait = self.retry_wait;
        let (link_tx, link) = watch::channel(Link::Connected);
        let link_tx = Arc::new(link_tx);

        let mut options = async_nats::ConnectOptions::new()
            .name(&self.name)
            .connection_timeout(CONNECT_TIMEOUT)
            .max_reconnects(CLIENT_RECONNECT_ATTEMPTS)
            .reconnect_delay_callback(move |attempts| reconnect_delay(attempts, retry_wait))
            .client_capacity(PUBLISH_BUFFER_CAPACITY)
            .event_callback(move |event| {
                let link_tx = Arc::clone(&link_tx);
                async move {
                    track_link(&link_tx, &event);
                    log_client_event(event);
                }
            });

        if let Some(credentials) = &self.credentials {
            options = options
                .user_and_password(credentials.username.clone(), credentials.password.clone());
        }

        let client = options
            .connect(address)
            .await
            .map_err(|e| PluginError::Connection(format!("{address}: {e}")))?;

        Ok(NatsConnection { client, link })
    }
}

fn track_link(link: &watch::Sender<Link>, event: &async_nats::Event) {
    let state = match event {
        async_nats::Event::Connected => Link::Connected,
        async_nats::Event::Disconnected => Link::Disconnected,
        async_nats::Event::Closed => Link::Closed,
        _ => return,
    };
    link.send_replace(state);
}

fn log_client_event(event: async_nats::Event) {
    match event {
        async_nats::Event::Connected => info!("nats connection established"),
        async_nats::Event::Disconnected => warn!("nats connection lost"),
        async_nats::Event::Closed => info!("nats connection closed"),
        async_nats::Event::ServerError(e) => error!(error = %e, "nats server error"),
        async_nats::Event::ClientError(e) => error!(error = %e, "nats client error"),
        other => debug!(event = %other, "nats client event"),
    }
}

/// State shared between the manager and its supervisor task
struct Shared {
    slot: watch::Sender<Option<Arc<dyn Publish>>>,
    backlog: Mutex<VecDeque<(String, Bytes)>>,
    capacity: usize,
}

impl Shared {
    /// Replay the backlog on `connection`, then make it the live one
    ///
    /// The slot is filled under the backlog lock, so a write either lands
    /// in the backlog before the final drain or goes straight out.
    async fn install(&self, connection: &Arc<dyn Publish>) {
        loop {
            let pending: Vec<(String, Bytes)> = {
                let mut backlog = self.backlog.lock();
                if backlog.is_empty() {
                    self.slot.send_replace(Some(Arc::clone(connection)));
                    return;
                }
                backlog.drain(..).collect()
            };

            debug!(count = pending.len(), "replaying buffered messages");
            for (subject, payload) in pending {
                if let Err(e) = connection.publish(subject.clone(), payload).await {
                    error!(subject = %subject, error = %e, "failed to replay buffered message");
                }
            }
        }
    }
}

async fn supervise<D>(
    dialer: D,
    address: String,
    retry_wait: Duration,
    shared: Arc<Shared>,
    mut signal: ShutdownSignal,
) where
    D: Dialer,
    D::Connection: Publish + 'static,
{
    loop {
        let connection: Arc<dyn Publish> =
            match dial_with_retry(&dialer, &address, retry_wait, &mut signal).await {
                Ok(connection) => Arc::new(connection) as Arc<dyn Publish>,
                Err(e) => {
                    debug!(address = %address, error = %e, "dial loop stopped");
                    return;
                }
            };

        shared.install(&connection).await;
        info!(address = %address, "connected to broker");

        tokio::select! {
            biased;
            _ = signal.triggered() => return,
            _ = connection.lost() => {
                shared.slot.send_replace(None);
                warn!(address = %address, "broker connection lost, redialing");
            }
        }
    }
}

/// Owns the broker connection and the supervisor that keeps it dialed
///
/// Writers go through [`ConnectionManager::publish`]; the connection behind
/// it may be replaced any number of times until [`close`](Self::close).
pub struct ConnectionManager {
    shared: Arc<Shared>,
    shutdown: Shutdown,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Dial `address` and wait for the first connection
    ///
    /// Blocks until a dial succeeds. If `cancel` fires first, dialing stops
    /// and [`PluginError::Cancelled`] is returned.
    pub async fn establish<D>(
        dialer: D,
        address: String,
        retry_wait: Duration,
        mut cancel: ShutdownSignal,
    ) -> Result<Self, PluginError>
    where
        D: Dialer + 'static,
        D::Connection: Publish + 'static,
    {
        let manager = Self::start(dialer, address, retry_wait, PUBLISH_BUFFER_CAPACITY);
        let mut slot = manager.shared.slot.subscribe();

        let connected = tokio::select! {
            biased;
            _ = cancel.triggered() => false,
            ready = slot.wait_for(Option::is_some) => ready.is_ok(),
        };

        if !connected {
            if let Err(e) = manager.close().await {
                debug!(error = %e, "close after cancelled connect");
            }
            return Err(PluginError::Cancelled);
        }

        Ok(manager)
    }

    /// Spawn the supervisor without waiting for it
    fn start<D>(dialer: D, address: String, retry_wait: Duration, capacity: usize) -> Self
    where
        D: Dialer + 'static,
        D::Connection: Publish + 'static,
    {
        let (slot, _) = watch::channel::<Option<Arc<dyn Publish>>>(None);
        let shared = Arc::new(Shared {
            slot,
            backlog: Mutex::new(VecDeque::new()),
            capacity,
        });
        let shutdown = Shutdown::new();

        let task = tokio::spawn(supervise(
            dialer,
            address,
            retry_wait,
            Arc::clone(&shared),
            shutdown.signal(),
        ));

        Self {
            shared,
            shutdown,
            task: Mutex::new(Some(task)),
            closed: AtomicBool::new(false),
        }
    }

    /// Publish on the live connection, or buffer until one is installed
    ///
    /// Fails with [`PluginError::NotReady`] after close, and with
    /// [`PluginError::Publish`] when the backlog is full.
    pub async fn publish(&self, subject: String, payload: Bytes) -> Result<(), PluginError> {
        if self.is_closed() {
            return Err(PluginError::NotReady);
        }

        let connection = {
            let mut backlog = self.shared.backlog.lock();
            let live = self.shared.slot.borrow().clone();
            match live {
                Some(connection) => connection,
                None => {
                    if backlog.len() >= self.shared.capacity {
                        return Err(PluginError::Publish(format!(
                            "reconnect buffer full ({} messages)",
                            self.shared.capacity
                        )));
                    }
                    backlog.push_back((subject, payload));
                    return Ok(());
                }
            }
        };

        connection.publish(subject, payload).await
    }

    /// Current connection, if one is installed
    pub fn connection(&self) -> Option<Arc<dyn Publish>> {
        self.shared.slot.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection().is_some_and(|c| c.is_connected())
    }

    /// Messages waiting for a connection
    pub fn buffered(&self) -> usize {
        self.shared.backlog.lock().len()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop dialing, flush and release the connection
    ///
    /// Calling it again is a no-op.
    pub async fn close(&self) -> Result<(), PluginError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.shutdown.trigger();

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "supervisor ended abnormally");
            }
        }

        let discarded = {
            let mut backlog = self.shared.backlog.lock();
            let count = backlog.len();
            backlog.clear();
            count
        };
        if discarded > 0 {
            warn!(count = discarded, "discarding buffered messages");
        }

        let Some(connection) = self.shared.slot.send_replace(None) else {
            return Ok(());
        };

        match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, connection.close()).await {
            Ok(result) => result,
            Err(_) => Err(PluginError::Shutdown(format!(
                "flush did not complete within {CLOSE_FLUSH_TIMEOUT:?}"
            ))),
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
