//! Liveness heartbeat for Rollcall sessions.
//!
//! While someone is signed in, the agent writes the current time to a
//! liveness marker in the durable store on a fixed interval (5 minutes
//! by default). It tells diagnostics that the session is in active use.
//!
//! The marker is write-only here. Nothing in Rollcall reads it, and it
//! never extends a session: expiry is measured from the issue time alone,
//! so an active session still expires 30 days after login.
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──(authenticated)──→ Beating ──(signed out)──→ Idle
//!    │                           │
//!    └────(store dropped)────────┴──→ Stopped
//! ```
//!
//! Leaving `Beating` drops the interval timer. A tick that was already
//! due when the session ended is discarded, never written.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use rollcall_session::{Clock, SessionStore, SessionSubscription};
use rollcall_storage::{CookieJar, DurableStore};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the heartbeat agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Time between liveness writes. Default: 5 minutes.
    pub interval: Duration,
    /// When false the agent never writes.
    pub enabled: bool,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            enabled: true,
        }
    }
}

impl HeartbeatConfig {
    /// Reference interval between liveness writes.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Shortest interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a config with a specific interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`HeartbeatAgent::new`]. An interval below
    /// [`Self::MIN_INTERVAL`] (including zero, which would spin) is raised
    /// to it.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "heartbeat interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    beats: AtomicU64,
    failures: AtomicU64,
    last_beat_ms: AtomicU64,
}

/// A snapshot of what the agent has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartbeatMetrics {
    /// Liveness writes that succeeded.
    pub beats: u64,
    /// Liveness writes the store rejected.
    pub failures: u64,
    /// Marker value of the last successful write, 0 if none yet.
    pub last_beat_ms: u64,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Writes the liveness marker while a session is authenticated.
///
/// Follows the session through a [`SessionSubscription`] and writes
/// through [`SessionStore::touch_liveness`], which takes the session lock.
/// A beat that races `clear` therefore waits for it and then finds
/// nobody signed in. The agent only holds a weak reference, so it never
/// keeps the store alive.
pub struct HeartbeatAgent<D, J, K>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    store: Weak<SessionStore<D, J, K>>,
    subscription: SessionSubscription,
    config: HeartbeatConfig,
    counters: Arc<Counters>,
}

impl<D, J, K> HeartbeatAgent<D, J, K>
where
    D: DurableStore,
    J: CookieJar,
    K: Clock,
{
    /// Create an agent. Nothing runs until [`spawn`](Self::spawn).
    pub fn new(store: &Arc<SessionStore<D, J, K>>, config: HeartbeatConfig) -> Self {
        Self {
            store: Arc::downgrade(store),
            subscription: store.subscribe(),
            config: config.validated(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Runs the agent on a background task.
    pub fn spawn(self) -> HeartbeatHandle {
        let counters = Arc::clone(&self.counters);
        let task = tokio::spawn(self.run());
        HeartbeatHandle { task, counters }
    }

    async fn run(mut self) {
        if !self.config.enabled {
            debug!("heartbeat disabled");
            return;
        }

        loop {
            // Idle until someone signs in (or the store goes away).
            if self.subscription.wait_for(|s| s.authenticated).await.is_none() {
                break;
            }
            if !self.beat_while_authenticated().await {
                break;
            }
        }

        debug!("heartbeat agent stopped");
    }

    /// Ticks until the session ends. Returns `false` if the store was
    /// dropped and the agent should stop for good.
    async fn beat_while_authenticated(&mut self) -> bool {
        let period = self.config.interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(interval_secs = period.as_secs(), "heartbeat started");

        loop {
            tokio::select! {
                // State changes win over a due tick, so a tick that is
                // ready in the same poll as a sign-out is dropped.
                biased;

                alive = self.subscription.changed() => {
                    if !alive {
                        return false;
                    }
                    if !self.subscription.current().authenticated {
                        debug!("heartbeat cancelled");
                        return true;
                    }
                }
                _ = ticker.tick() => {
                    if !self.subscription.peek().authenticated {
                        debug!("heartbeat cancelled");
                        return true;
                    }
                    self.beat().await;
                }
            }
        }
    }

    async fn beat(&self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        match store.touch_liveness().await {
            Ok(Some(at)) => {
                let beats = self.counters.beats.fetch_add(1, Ordering::SeqCst) + 1;
                self.counters.last_beat_ms.store(at, Ordering::SeqCst);
                trace!(beats, at, "liveness marker written");
            }
            Ok(None) => debug!("session ended before the beat, skipped"),
            Err(error) => {
                self.counters.failures.fetch_add(1, Ordering::SeqCst);
                warn!(%error, "failed to write liveness marker");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owner of a running heartbeat task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    task: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl HeartbeatHandle {
    /// Snapshot of the agent's counters.
    pub fn metrics(&self) -> HeartbeatMetrics {
        HeartbeatMetrics {
            beats: self.counters.beats.load(Ordering::SeqCst),
            failures: self.counters.failures.load(Ordering::SeqCst),
            last_beat_ms: self.counters.last_beat_ms.load(Ordering::SeqCst),
        }
    }

    /// Liveness writes performed so far.
    pub fn beats(&self) -> u64 {
        self.counters.beats.load(Ordering::SeqCst)
    }

    /// Whether the background task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the task. Safe to call more than once.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
