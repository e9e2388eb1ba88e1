//! Remote-signature hand-off polling
//!
//! While a hand-off session is open, a [`SignaturePoller`] re-reads the
//! candidate at a fixed interval until it is APPROVED or the workflow is
//! cancelled. Read failures are logged and the next tick retries. At most one
//! poller runs per candidate: opening a new hand-off cancels the previous one.

use async_trait::async_trait;
use chrono::Utc;
use cipa_common::models::{Candidate, CandidateStatus, HandoffSession, HandoffStatus};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db;

/// Where the poller reads candidate state from
#[async_trait]
pub trait CandidateStatusSource: Send + Sync {
    /// Current record, `None` once it no longer exists
    async fn fetch(&self, candidate_id: Uuid) -> cipa_common::Result<Option<Candidate>>;
}

/// Reads candidates straight from the database
#[derive(Clone)]
pub struct DbStatusSource {
    pool: SqlitePool,
}

impl DbStatusSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStatusSource for DbStatusSource {
    async fn fetch(&self, candidate_id: Uuid) -> cipa_common::Result<Option<Candidate>> {
        db::candidates::load_candidate(&self.pool, candidate_id).await
    }
}

/// Why polling stopped
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Approved(Candidate),
    Cancelled,
    /// The candidate was deleted while waiting
    Missing,
}

#[derive(Debug, Clone, Copy)]
pub struct SignaturePoller {
    interval: Duration,
}

impl SignaturePoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until APPROVED, deletion or cancellation
    pub async fn run<S>(&self, source: &S, candidate_id: Uuid, cancel: &CancellationToken) -> PollOutcome
    where
        S: CandidateStatusSource + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(candidate_id = %candidate_id, attempts, "Signature polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            attempts += 1;
            match source.fetch(candidate_id).await {
                Ok(Some(candidate)) if candidate.status == CandidateStatus::Approved => {
                    debug!(candidate_id = %candidate_id, attempts, "Signature observed");
                    return PollOutcome::Approved(candidate);
                }
                Ok(Some(_)) => {}
                Ok(None) => return PollOutcome::Missing,
                Err(e) => {
                    warn!(candidate_id = %candidate_id, "Status check failed, retrying: {}", e);
                }
            }
        }
    }
}

struct ActivePoller {
    session_token: Uuid,
    cancel: CancellationToken,
}

/// Active pollers keyed by candidate
#[derive(Clone, Default)]
pub struct PollerRegistry {
    active: Arc<RwLock<HashMap<Uuid, ActivePoller>>>,
}

impl PollerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a poller for `session`, cancelling any earlier one for the same candidate
    pub async fn start(&self, session: &HandoffSession) -> CancellationToken {
        let cancel = CancellationToken::new();
        let previous = self.active.write().await.insert(
            session.candidate_id,
            ActivePoller {
                session_token: session.token,
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
        cancel
    }

    /// Cancel the candidate's poller, if any
    pub async fn cancel(&self, candidate_id: Uuid) -> bool {
        match self.active.write().await.remove(&candidate_id) {
            Some(poller) => {
                poller.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the entry for a finished poller unless a newer one replaced it
    async fn finish(&self, candidate_id: Uuid, session_token: Uuid) {
        let mut active = self.active.write().await;
        if active
            .get(&candidate_id)
            .is_some_and(|p| p.session_token == session_token)
        {
            active.remove(&candidate_id);
        }
    }

    pub async fn is_active(&self, candidate_id: Uuid) -> bool {
        self.active.read().await.contains_key(&candidate_id)
    }

    pub async fn len(&self) -> usize {
        self.active.read().await.len()
    }
}

/// Watch an open hand-off until the candidate signs, the session expires or
/// the workflow is cancelled, then close the session accordingly
pub async fn spawn_handoff_watch(
    pool: SqlitePool,
    registry: PollerRegistry,
    poller: SignaturePoller,
    session: HandoffSession,
) -> JoinHandle<PollOutcome> {
    let cancel = registry.start(&session).await;

    tokio::spawn(async move {
        let source = DbStatusSource::new(pool.clone());
        let ttl = (session.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        let expiry = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(ttl) => {
                        cancel.cancel();
                        true
                    }
                    _ = cancel.cancelled() => false,
                }
            })
        };

        let outcome = poller.run(&source, session.candidate_id, &cancel).await;
        cancel.cancel();
        let expired = expiry.await.unwrap_or(false);

        let close_as = match (&outcome, expired) {
            (PollOutcome::Approved(_), _) => Some(HandoffStatus::Completed),
            (PollOutcome::Missing, _) | (PollOutcome::Cancelled, true) => Some(HandoffStatus::Expired),
            (PollOutcome::Cancelled, false) => None,
        };

        if let Some(status) = close_as {
            match db::handoffs::close_session(&pool, session.token, status).await {
                Ok(true) => info!(
                    candidate_id = %session.candidate_id,
                    status = %status,
                    "Hand-off session closed"
                ),
                Ok(false) => {}
                Err(e) => warn!(candidate_id = %session.candidate_id, "Failed to close hand-off session: {}", e),
            }
        }

        registry.finish(session.candidate_id, session.token).await;
        outcome
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails twice, reports pending once, then approved
    struct ScriptedSource {
        calls: AtomicUsize,
        candidate: Candidate,
    }

    #[async_trait]
    impl CandidateStatusSource for ScriptedSource {
        async fn fetch(&self, _candidate_id: Uuid) -> cipa_common::Result<Option<Candidate>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match call {
                0 | 1 => Err(cipa_common::Error::Internal("connection reset".to_string())),
                2 => Ok(Some(self.candidate.clone())),
                _ => {
                    let mut approved = self.candidate.clone();
                    approved.status = CandidateStatus::Approved;
                    approved.signature_url = Some("/files/signatures/x.png".to_string());
                    Ok(Some(approved))
                }
            }
        }
    }

    fn pending() -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            term_id: Uuid::new_v4(),
            collaborator_id: Uuid::new_v4(),
            registered_at: Utc::now(),
            signature_url: None,
            status: CandidateStatus::PendingSignature,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_survives_transient_errors_and_stops_on_approval() {
        let candidate = pending();
        let source = ScriptedSource {
            calls: AtomicUsize::new(0),
            candidate: candidate.clone(),
        };
        let poller = SignaturePoller::new(Duration::from_secs(3));

        let outcome = poller.run(&source, candidate.id, &CancellationToken::new()).await;
        assert!(matches!(outcome, PollOutcome::Approved(c) if c.id == candidate.id));
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_when_cancelled() {
        struct NeverApproved(Candidate);

        #[async_trait]
        impl CandidateStatusSource for NeverApproved {
            async fn fetch(&self, _id: Uuid) -> cipa_common::Result<Option<Candidate>> {
                Ok(Some(self.0.clone()))
            }
        }

        let candidate = pending();
        let cancel = CancellationToken::new();
        let source = NeverApproved(candidate.clone());
        let poller = SignaturePoller::new(Duration::from_secs(3));

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.run(&source, candidate.id, &cancel).await })
        };
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_registry_keeps_one_poller_per_candidate() {
        let registry = PollerRegistry::new();
        let candidate_id = Uuid::new_v4();
        let session = |token| HandoffSession {
            token,
            candidate_id,
            status: HandoffStatus::Open,
            created_at: Utc::now(),
            expires_at: Utc::now(),
        };

        let first = registry.start(&session(Uuid::new_v4())).await;
        let second_token = Uuid::new_v4();
        let second = registry.start(&session(second_token)).await;

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.len().await, 1);

        assert!(registry.cancel(candidate_id).await);
        assert!(second.is_cancelled());
        assert!(!registry.is_active(candidate_id).await);
    }
}
