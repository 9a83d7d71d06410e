//! Process lifecycle: startup state, uptime and shutdown coordination.
//!
//! ```text
//! Starting → Ready → ShuttingDown → Stopped
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod health;

pub use health::{HealthResponse, health_router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Starting = 0,
    Ready = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Ready,
            2 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared lifecycle state.
///
/// The shutdown token is handed to background tasks (the session sweeper)
/// and to the HTTP server's graceful shutdown.
#[derive(Debug)]
pub struct LifecycleManager {
    state: AtomicU8,
    started_at: Instant,
    shutdown_token: CancellationToken,
    version: &'static str,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Starting as u8),
            started_at: Instant::now(),
            shutdown_token: CancellationToken::new(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        matches!(
            self.state(),
            LifecycleState::ShuttingDown | LifecycleState::Stopped
        )
    }

    pub fn mark_ready(&self) {
        self.state.store(LifecycleState::Ready as u8, Ordering::SeqCst);
        info!(
            version = %self.version,
            startup_duration_ms = self.started_at.elapsed().as_millis(),
            "sap-commerce-mcp ready"
        );
    }

    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Enter `ShuttingDown` and cancel the shutdown token. Idempotent.
    pub fn begin_shutdown(&self) {
        if self.is_shutting_down() {
            return;
        }
        self.state
            .store(LifecycleState::ShuttingDown as u8, Ordering::SeqCst);
        self.shutdown_token.cancel();
        info!("Shutdown initiated");
    }

    pub fn mark_stopped(&self) {
        self.state.store(LifecycleState::Stopped as u8, Ordering::SeqCst);
    }

    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        self.version
    }
}
