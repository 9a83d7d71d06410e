//! Logical MCP sessions with idle eviction.
//!
//! Each client connection is bound to a [`Session`] identified by the
//! `mcp-session-id` header. Sessions are created lazily on first contact
//! and removed by a background sweeper once idle for longer than the TTL,
//! or when the client sends `DELETE /mcp`.
//!
//! Mutations on the map never hold a guard across an `.await`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::transport::upstream::env_parse;

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport for session {session_id} failed to close: {reason}")]
    CloseFailed { session_id: String, reason: String },
}

/// The connection binding owned by exactly one session.
pub trait SessionTransport: Send + Sync + fmt::Debug {
    /// Release the binding. Closing twice is a no-op.
    fn close(&self) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;

    /// Record one JSON-RPC exchange on this binding.
    fn record_exchange(&self) {}
}

/// Default binding for the streamable HTTP endpoint.
#[derive(Debug)]
pub struct HttpSessionTransport {
    session_id: String,
    closed: AtomicBool,
    exchanges: AtomicU64,
}

impl HttpSessionTransport {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            closed: AtomicBool::new(false),
            exchanges: AtomicU64::new(0),
        }
    }

    pub fn exchanges(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }
}

impl SessionTransport for HttpSessionTransport {
    fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(
                session_id = %self.session_id,
                exchanges = self.exchanges(),
                "Session transport closed"
            );
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn record_exchange(&self) {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
    }
}

/// Builds the transport for a freshly created session.
pub type TransportFactory = Arc<dyn Fn(&str) -> Box<dyn SessionTransport> + Send + Sync>;

fn http_transport_factory() -> TransportFactory {
    Arc::new(|id: &str| Box::new(HttpSessionTransport::new(id)) as Box<dyn SessionTransport>)
}

// ============================================================================
// Session
// ============================================================================

/// One logical MCP session.
#[derive(Debug)]
pub struct Session {
    id: String,
    transport: Box<dyn SessionTransport>,
    initialized: AtomicBool,
    created_at: Instant,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transport(&self) -> &dyn SessionTransport {
        self.transport.as_ref()
    }

    /// True once an `initialize` request has been answered.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

struct SessionEntry {
    session: Arc<Session>,
    last_activity: Instant,
}

// ============================================================================
// Configuration
// ============================================================================

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_SWEEP_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle time after which a session is evicted
    pub ttl: Duration,
    /// How often the sweeper runs
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// - `MCP_SESSION_TTL_SECS` (default: 300)
    /// - `MCP_SESSION_SWEEP_SECS` (default: 60)
    pub fn from_env() -> Self {
        let ttl = positive_secs("MCP_SESSION_TTL_SECS", DEFAULT_TTL_SECS);
        let sweep = positive_secs("MCP_SESSION_SWEEP_SECS", DEFAULT_SWEEP_SECS);

        Self {
            ttl: Duration::from_secs(ttl),
            sweep_interval: Duration::from_secs(sweep),
        }
        .normalized()
    }

    /// A sweep interval at or above the TTL would let sessions outlive it
    /// by almost a full period, so it is clamped to `ttl / 2`.
    pub fn normalized(mut self) -> Self {
        if self.sweep_interval >= self.ttl {
            let clamped = (self.ttl / 2).max(Duration::from_millis(1));
            warn!(
                sweep_secs = self.sweep_interval.as_secs(),
                ttl_secs = self.ttl.as_secs(),
                clamped_ms = clamped.as_millis() as u64,
                "Session sweep interval not below TTL, clamping"
            );
            self.sweep_interval = clamped;
        }
        self
    }
}

fn positive_secs(name: &str, default: u64) -> u64 {
    match env_parse(name, default) {
        0 => {
            warn!(
                variable = name,
                default, "Zero is not a valid duration, using default"
            );
            default
        }
        secs => secs,
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Owns every live session.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    config: SessionConfig,
    transport_factory: TransportFactory,
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_transport_factory(config, http_transport_factory())
    }

    pub fn with_transport_factory(config: SessionConfig, transport_factory: TransportFactory) -> Self {
        let config = config.normalized();
        info!(
            ttl_secs = config.ttl.as_secs(),
            sweep_ms = config.sweep_interval.as_millis() as u64,
            "Session registry configured"
        );
        Self {
            sessions: DashMap::new(),
            config,
            transport_factory,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Look up a session by id, or create a new one.
    ///
    /// A known id refreshes the session's activity and returns the same
    /// `Arc`. A missing or unknown id yields a brand-new session under a
    /// server-generated UUID; a client-chosen id is never adopted.
    pub fn resolve(&self, id: Option<&str>) -> (Arc<Session>, bool) {
        if let Some(id) = id {
            if let Some(mut entry) = self.sessions.get_mut(id) {
                entry.last_activity = Instant::now();
                return (Arc::clone(&entry.session), false);
            }
            debug!(requested_id = %id, "Unknown session id, creating a new session");
        }

        let id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let session = Arc::new(Session {
            transport: (self.transport_factory)(&id),
            id: id.clone(),
            initialized: AtomicBool::new(false),
            created_at: now,
        });

        self.sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&session),
                last_activity: now,
            },
        );
        info!(session_id = %id, active = self.sessions.len(), "Session created");

        (session, true)
    }

    /// Refresh a session's activity timestamp. Returns whether it exists.
    pub fn touch(&self, id: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.last_activity = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Remove and close every session idle for longer than `ttl` at `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn evict_expired(&self, now: Instant, ttl: Duration) -> usize {
        let is_expired =
            |entry: &SessionEntry| now.saturating_duration_since(entry.last_activity) > ttl;

        let candidates: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| is_expired(e.value()))
            .map(|e| e.key().clone())
            .collect();

        let mut removed = 0;
        for id in candidates {
            // Re-check under the shard lock: a touch since the scan wins.
            if let Some((_, entry)) = self.sessions.remove_if(&id, |_, e| is_expired(e)) {
                removed += 1;
                close_transport(&entry.session, "expired");
            }
        }

        if removed > 0 {
            info!(
                removed,
                remaining = self.sessions.len(),
                "Evicted idle sessions"
            );
        }
        removed
    }

    /// Client-initiated termination. Returns whether the session existed.
    pub fn close(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, entry)) => {
                close_transport(&entry.session, "client_closed");
                true
            }
            None => false,
        }
    }

    /// Close every session. Used at shutdown.
    pub fn close_all(&self) -> usize {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.close(id)).count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Spawn the idle-session sweeper.
    ///
    /// Runs `evict_expired` every `sweep_interval` and stops when the
    /// cancellation token is triggered.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let period = registry.config.sweep_interval;
        let ttl = registry.config.ttl;
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.tick().await; // Skip immediate first tick
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        registry.evict_expired(Instant::now(), ttl);
                    }
                    _ = shutdown.cancelled() => {
                        debug!("Session sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }
}

fn close_transport(session: &Session, reason: &'static str) {
    match session.transport.close() {
        Ok(()) => debug!(session_id = %session.id, reason, "Session closed"),
        Err(error) => warn!(
            session_id = %session.id,
            reason,
            error = %error,
            "Failed to close session transport"
        ),
    }
}
