//! Session connector
//!
//! Keeps exactly one usable connection to the messaging backend. The
//! connector runs as a single background task: it opens a connection,
//! follows its lifecycle events, and reconnects with exponential backoff
//! whenever the connection closes. Retries are unbounded.
//!
//! The live session is published through [`SessionConnector::current`],
//! a lock-free accessor backed by an atomic swap slot. Only the connector
//! task writes to it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use domain::RecipientId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::ApplicationError;
use crate::ports::{
    CredentialStore, Credentials, MessagingSession, OpenedSession, SessionBackend, SessionEvent,
};

/// Delay before the first reconnect attempt in milliseconds
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 5_000;

/// Upper bound for the reconnect delay in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

const QR_LINK_BASE: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Exponential backoff between reconnect attempts
///
/// `delay = min(initial * 2^attempt, max)`, so the defaults produce
/// 5s, 10s, 20s, 40s, 60s, 60s, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay for attempt 0 in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_delay_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy with custom bounds
    #[must_use]
    pub const fn new(initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before reconnect attempt `attempt` (0-indexed)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Connector created, task not started
    Initializing,
    /// Opening a connection
    Connecting,
    /// Connection authenticated and published
    Open,
    /// Connection gone, waiting to reconnect
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Snapshot of the connector's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatus {
    /// Current lifecycle state
    pub state: ConnectionState,
    /// Consecutive closes since the last successful open
    pub retry_count: u32,
    /// Generation of the most recently published session (0 = never opened)
    pub generation: u64,
    /// Pairing link waiting to be scanned, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_link: Option<String>,
    /// Reason the last connection closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_close_reason: Option<String>,
}

impl Default for ConnectorStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Initializing,
            retry_count: 0,
            generation: 0,
            qr_link: None,
            last_close_reason: None,
        }
    }
}

/// A published session
///
/// Sessions are never mutated; a reconnect publishes a new one with the
/// next generation number.
pub struct ActiveSession {
    generation: u64,
    session: Arc<dyn MessagingSession>,
}

impl ActiveSession {
    /// Wrap a session handle
    pub fn new(generation: u64, session: Arc<dyn MessagingSession>) -> Self {
        Self {
            generation,
            session,
        }
    }

    /// Generation number of this session
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Send a text message on this session
    pub async fn send_text(
        &self,
        recipient: &RecipientId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        self.session.send_text(recipient, text).await
    }
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Read access to the current session
pub trait SessionProvider: Send + Sync {
    /// The session to send on, `None` while disconnected
    fn current_session(&self) -> Option<Arc<ActiveSession>>;
}

/// Build a link that renders `code` as a scannable QR image
pub fn qr_link(code: &str) -> Option<String> {
    Url::parse_with_params(QR_LINK_BASE, &[("size", "300x300"), ("data", code)])
        .map(String::from)
        .ok()
}

/// Maintains the connection to the messaging backend
pub struct SessionConnector {
    backend: Arc<dyn SessionBackend>,
    credentials: Arc<dyn CredentialStore>,
    policy: ReconnectPolicy,
    current: ArcSwapOption<ActiveSession>,
    status: RwLock<ConnectorStatus>,
    started: AtomicBool,
}

impl fmt::Debug for SessionConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConnector")
            .field("policy", &self.policy)
            .field("status", &*self.status.read())
            .finish_non_exhaustive()
    }
}

impl SessionConnector {
    /// Create a connector; nothing connects until [`Self::run`] is driven
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        credentials: Arc<dyn CredentialStore>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            backend,
            credentials,
            policy,
            current: ArcSwapOption::empty(),
            status: RwLock::new(ConnectorStatus::default()),
            started: AtomicBool::new(false),
        }
    }

    /// The currently published session
    pub fn current(&self) -> Option<Arc<ActiveSession>> {
        self.current.load_full()
    }

    /// Snapshot of the connector state
    pub fn status(&self) -> ConnectorStatus {
        self.status.read().clone()
    }

    /// Spawn the connection loop on the tokio runtime
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let connector = Arc::clone(self);
        tokio::spawn(async move { connector.run().await })
    }

    /// Connection loop; only returns when the task is aborted
    ///
    /// A connector drives at most one loop. Later calls log and return
    /// immediately so attempts never overlap.
    pub async fn run(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!("Session connector already running, ignoring second start");
            return;
        }

        info!(
            initial_delay_ms = self.policy.initial_delay_ms,
            max_delay_ms = self.policy.max_delay_ms,
            "Session connector starting"
        );

        loop {
            self.connect_once().await;

            let (attempt, delay) = self.schedule_retry();
            info!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting to messaging backend"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Open one connection and follow it until it closes
    #[instrument(skip(self))]
    async fn connect_once(&self) {
        self.status.write().state = ConnectionState::Connecting;

        let credentials = match self.credentials.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Failed to load credentials, connecting without them");
                None
            },
        };
        debug!(
            has_credentials = credentials.is_some(),
            "Opening messaging session"
        );

        let OpenedSession {
            session,
            mut events,
        } = match self.backend.open(credentials).await {
            Ok(opened) => opened,
            Err(e @ ApplicationError::ConnectionLost(_)) => {
                self.mark_closed(&e);
                return;
            },
            Err(e) => {
                self.mark_closed(&ApplicationError::ConnectionLost(e.to_string()));
                return;
            },
        };

        let reason = loop {
            match events.recv().await {
                Some(SessionEvent::Open) => self.publish(Arc::clone(&session)),
                Some(SessionEvent::QrChallenge(code)) => self.handle_qr(&code),
                Some(SessionEvent::CredentialsUpdated(credentials)) => {
                    self.persist(&credentials).await;
                },
                Some(SessionEvent::MessagesUpserted(messages)) => {
                    debug!(count = messages.len(), "Inbound messages received");
                },
                Some(SessionEvent::Close { reason }) => break reason,
                None => break "event stream ended".to_string(),
            }
        };

        self.mark_closed(&ApplicationError::ConnectionLost(reason));
    }

    fn publish(&self, session: Arc<dyn MessagingSession>) {
        let mut status = self.status.write();
        status.generation += 1;
        status.state = ConnectionState::Open;
        status.retry_count = 0;
        status.qr_link = None;
        status.last_close_reason = None;

        self.current
            .store(Some(Arc::new(ActiveSession::new(status.generation, session))));

        info!(generation = status.generation, "Messaging session open");
    }

    fn handle_qr(&self, code: &str) {
        let Some(link) = qr_link(code) else {
            warn!("Failed to build pairing link for QR challenge");
            return;
        };
        info!(qr_link = %link, "Scan the QR code to link the WhatsApp account");
        self.status.write().qr_link = Some(link);
    }

    async fn persist(&self, credentials: &Credentials) {
        match self.credentials.save(credentials).await {
            Ok(()) => debug!("Credentials saved"),
            Err(e) => warn!(error = %e, "Failed to save credentials"),
        }
    }

    fn mark_closed(&self, cause: &ApplicationError) {
        self.current.store(None);

        let mut status = self.status.write();
        status.state = ConnectionState::Closed;
        status.last_close_reason = Some(cause.to_string());

        warn!(
            error = %cause,
            retry_count = status.retry_count,
            "Messaging session closed"
        );
    }

    /// Delay for the next attempt; bumps the retry counter
    fn schedule_retry(&self) -> (u32, Duration) {
        let mut status = self.status.write();
        let attempt = status.retry_count;
        status.retry_count = attempt.saturating_add(1);
        (attempt, self.policy.delay_for_attempt(attempt))
    }
}

impl SessionProvider for SessionConnector {
    fn current_session(&self) -> Option<Arc<ActiveSession>> {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    use super::*;
    use crate::ports::MockMessagingSession;

    struct Script {
        events: Vec<SessionEvent>,
        hold_open: bool,
    }

    impl Script {
        fn closing(events: Vec<SessionEvent>) -> Self {
            Self {
                events,
                hold_open: false,
            }
        }

        fn holding(events: Vec<SessionEvent>) -> Self {
            Self {
                events,
                hold_open: true,
            }
        }
    }

    /// Backend that replays one script per `open` call
    struct ScriptedBackend {
        scripts: Mutex<VecDeque<Script>>,
        opened_at: Mutex<Vec<Instant>>,
        held: Mutex<Vec<mpsc::Sender<SessionEvent>>>,
        received_credentials: Mutex<Vec<Option<Credentials>>>,
    }

    impl ScriptedBackend {
        fn new(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into()),
                opened_at: Mutex::new(Vec::new()),
                held: Mutex::new(Vec::new()),
                received_credentials: Mutex::new(Vec::new()),
            })
        }

        fn gaps(&self) -> Vec<Duration> {
            let opened = self.opened_at.lock();
            opened.windows(2).map(|w| w[1] - w[0]).collect()
        }

        fn close_held(&self, reason: &str) {
            let held = self.held.lock().pop().unwrap();
            held.try_send(SessionEvent::Close {
                reason: reason.to_string(),
            })
            .unwrap();
        }
    }

    #[async_trait]
    impl SessionBackend for ScriptedBackend {
        async fn open(
            &self,
            credentials: Option<Credentials>,
        ) -> Result<OpenedSession, ApplicationError> {
            self.opened_at.lock().push(Instant::now());
            self.received_credentials.lock().push(credentials);

            let Some(script) = self.scripts.lock().pop_front() else {
                return Err(ApplicationError::ConnectionLost("backend offline".into()));
            };

            let (tx, rx) = mpsc::channel(16);
            for event in script.events {
                tx.try_send(event).unwrap();
            }
            if script.hold_open {
                self.held.lock().push(tx);
            }

            let mut session = MockMessagingSession::new();
            session
                .expect_send_text()
                .returning(|_, _| Ok("MSG-1".to_string()));

            Ok(OpenedSession {
                session: Arc::new(session),
                events: rx,
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        stored: Mutex<Option<Credentials>>,
        saves: Mutex<usize>,
    }

    #[async_trait]
    impl CredentialStore for RecordingStore {
        async fn load(&self) -> Result<Option<Credentials>, ApplicationError> {
            Ok(self.stored.lock().clone())
        }

        async fn save(&self, credentials: &Credentials) -> Result<(), ApplicationError> {
            *self.stored.lock() = Some(credentials.clone());
            *self.saves.lock() += 1;
            Ok(())
        }
    }

    fn connector(backend: Arc<ScriptedBackend>) -> Arc<SessionConnector> {
        Arc::new(SessionConnector::new(
            backend,
            Arc::new(RecordingStore::default()),
            ReconnectPolicy::default(),
        ))
    }

    fn close(reason: &str) -> SessionEvent {
        SessionEvent::Close {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn backoff_sequence_doubles_and_caps() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..7)
            .map(|n| u64::try_from(policy.delay_for_attempt(n).as_millis()).unwrap())
            .collect();
        assert_eq!(delays, vec![5_000, 10_000, 20_000, 40_000, 60_000, 60_000, 60_000]);
    }

    #[test]
    fn backoff_saturates_for_huge_attempts() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for_attempt(64), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn custom_policy_bounds() {
        let policy = ReconnectPolicy::new(100, 1_000);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1_000));
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Initializing.to_string(), "initializing");
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }

    #[test]
    fn connection_state_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
    }

    #[test]
    fn qr_link_encodes_code() {
        let link = qr_link("2@abc,def==").unwrap();
        assert!(link.starts_with("https://api.qrserver.com/v1/create-qr-code/?size=300x300"));
        assert!(link.contains("data=2%40abc%2Cdef%3D%3D"));
    }

    #[test]
    fn new_connector_is_initializing() {
        let connector = connector(ScriptedBackend::new(Vec::new()));
        let status = connector.status();
        assert_eq!(status.state, ConnectionState::Initializing);
        assert_eq!(status.retry_count, 0);
        assert!(connector.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_delays_follow_backoff() {
        let backend = ScriptedBackend::new(
            (0..6).map(|i| Script::closing(vec![close(&format!("drop {i}"))])).collect(),
        );
        let handle = connector(Arc::clone(&backend)).spawn();

        tokio::time::sleep(Duration::from_secs(200)).await;
        handle.abort();

        let gaps = backend.gaps();
        assert_eq!(
            &gaps[..6],
            &[
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(20),
                Duration::from_secs(40),
                Duration::from_secs(60),
                Duration::from_secs(60),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn open_resets_backoff() {
        let backend = ScriptedBackend::new(vec![
            Script::closing(vec![close("first")]),
            Script::closing(vec![SessionEvent::Open, close("second")]),
            Script::closing(vec![close("third")]),
        ]);
        let handle = connector(Arc::clone(&backend)).spawn();

        tokio::time::sleep(Duration::from_secs(21)).await;
        handle.abort();

        let gaps = backend.gaps();
        assert_eq!(
            &gaps[..3],
            &[
                Duration::from_secs(5),
                Duration::from_secs(5),
                Duration::from_secs(10),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn open_publishes_and_close_withdraws_session() {
        let backend = ScriptedBackend::new(vec![Script::holding(vec![SessionEvent::Open])]);
        let connector = connector(Arc::clone(&backend));
        let handle = connector.spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        let session = connector.current().unwrap();
        assert_eq!(session.generation(), 1);
        let status = connector.status();
        assert_eq!(status.state, ConnectionState::Open);
        assert_eq!(status.retry_count, 0);

        let recipient = RecipientId::new("11987654321").unwrap();
        assert_eq!(session.send_text(&recipient, "hi").await.unwrap(), "MSG-1");

        backend.close_held("logged out elsewhere");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(connector.current().is_none());
        assert!(connector.current_session().is_none());
        let status = connector.status();
        assert_eq!(status.state, ConnectionState::Closed);
        assert_eq!(status.retry_count, 1);
        assert!(
            status
                .last_close_reason
                .unwrap()
                .contains("logged out elsewhere")
        );

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_publishes_new_generation() {
        let backend = ScriptedBackend::new(vec![
            Script::closing(vec![SessionEvent::Open, close("blip")]),
            Script::holding(vec![SessionEvent::Open]),
        ]);
        let connector = connector(Arc::clone(&backend));
        let handle = connector.spawn();

        tokio::time::sleep(Duration::from_secs(6)).await;

        let session = connector.current().unwrap();
        assert_eq!(session.generation(), 2);
        assert_eq!(connector.status().retry_count, 0);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn qr_challenge_is_exposed_until_open() {
        let backend = ScriptedBackend::new(vec![Script::holding(vec![
            SessionEvent::QrChallenge("2@pairing".to_string()),
        ])]);
        let connector = connector(Arc::clone(&backend));
        let handle = connector.spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        let status = connector.status();
        assert_eq!(status.state, ConnectionState::Connecting);
        assert!(status.qr_link.unwrap().contains("data=2%40pairing"));

        let held = backend.held.lock().last().cloned().unwrap();
        held.send(SessionEvent::Open).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(connector.status().qr_link.is_none());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn credential_updates_are_persisted_and_reused() {
        let creds = Credentials::new(serde_json::json!({"me": "5511987654321"}));
        let backend = ScriptedBackend::new(vec![
            Script::closing(vec![
                SessionEvent::CredentialsUpdated(creds.clone()),
                close("restart required"),
            ]),
            Script::holding(vec![SessionEvent::Open]),
        ]);
        let store = Arc::new(RecordingStore::default());
        let connector = Arc::new(SessionConnector::new(
            Arc::clone(&backend) as Arc<dyn SessionBackend>,
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            ReconnectPolicy::default(),
        ));
        let handle = connector.spawn();

        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.abort();

        assert_eq!(*store.saves.lock(), 1);
        let received = backend.received_credentials.lock();
        assert!(received[0].is_none());
        assert_eq!(received[1].as_ref(), Some(&creds));
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_counts_as_close() {
        let backend = ScriptedBackend::new(Vec::new());
        let connector = connector(Arc::clone(&backend));
        let handle = connector.spawn();

        tokio::time::sleep(Duration::from_secs(16)).await;
        handle.abort();

        assert_eq!(
            backend.gaps(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        let status = connector.status();
        assert_eq!(status.retry_count, 3);
        assert!(status.last_close_reason.unwrap().contains("backend offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_overlap_attempts() {
        let backend = ScriptedBackend::new(Vec::new());
        let connector = connector(Arc::clone(&backend));
        let first = connector.spawn();
        let second = connector.spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(first.is_finished() ^ second.is_finished());
        assert_eq!(backend.opened_at.lock().len(), 1);
        assert_eq!(connector.status().retry_count, 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        first.abort();
        second.abort();

        assert_eq!(backend.opened_at.lock().len(), 2);
        assert_eq!(connector.status().retry_count, 2);
    }

    #[test]
    fn status_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ConnectorStatus::default()).unwrap();
        assert_eq!(json["state"], "initializing");
        assert!(json.get("qr_link").is_none());
    }
}
