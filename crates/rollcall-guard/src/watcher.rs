//! Background re-evaluation of the guard.

use rollcall_session::SessionSubscription;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{GuardOutcome, RouteGuard};

/// Re-evaluates a [`RouteGuard`] whenever the session state or the
/// current location changes, and publishes the outcome.
///
/// Observers only see an outcome when it differs from the previous one.
/// The task ends when the session store, the location sender, or every
/// outcome receiver is gone.
#[derive(Debug)]
pub struct GuardWatcher {
    outcome: watch::Receiver<GuardOutcome>,
    task: JoinHandle<()>,
}

impl GuardWatcher {
    /// Starts watching. The first outcome is available immediately.
    pub fn spawn(
        guard: RouteGuard,
        session: SessionSubscription,
        location: watch::Receiver<String>,
    ) -> Self {
        let initial = guard.evaluate(&session.peek(), &location.borrow());
        let (tx, outcome) = watch::channel(initial);
        let task = tokio::spawn(run(guard, session, location, tx));
        Self { outcome, task }
    }

    /// The latest outcome, marking it as seen.
    pub fn outcome(&mut self) -> GuardOutcome {
        self.outcome.borrow_and_update().clone()
    }

    /// Waits for a different outcome. Returns `false` once the watcher
    /// has stopped.
    pub async fn changed(&mut self) -> bool {
        self.outcome.changed().await.is_ok()
    }

    /// Waits until the outcome satisfies `predicate`.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<GuardOutcome>
    where
        F: FnMut(&GuardOutcome) -> bool,
    {
        self.outcome
            .wait_for(predicate)
            .await
            .ok()
            .map(|outcome| outcome.clone())
    }

    /// Another receiver of the published outcomes.
    pub fn subscribe(&self) -> watch::Receiver<GuardOutcome> {
        self.outcome.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for GuardWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    guard: RouteGuard,
    mut session: SessionSubscription,
    mut location: watch::Receiver<String>,
    tx: watch::Sender<GuardOutcome>,
) {
    debug!("guard watcher started");

    loop {
        tokio::select! {
            alive = session.changed() => {
                if !alive {
                    break;
                }
            }
            res = location.changed() => {
                if res.is_err() {
                    break;
                }
            }
            _ = tx.closed() => break,
        }

        let state = session.current();
        let outcome = guard.evaluate(&state, &location.borrow_and_update());
        tx.send_if_modified(|current| {
            if *current == outcome {
                return false;
            }
            if let Some(to) = outcome.redirect_target() {
                info!(to, "navigation redirected");
            }
            *current = outcome;
            true
        });
    }

    debug!("guard watcher stopped");
}
