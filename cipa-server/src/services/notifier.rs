//! Approval confirmation
//!
//! Invoked once per candidacy, right after the write that makes it APPROVED.

use async_trait::async_trait;
use cipa_common::models::{Candidate, Collaborator};
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirm an approved candidacy to the collaborator
    async fn candidate_approved(
        &self,
        candidate: &Candidate,
        collaborator: Option<&Collaborator>,
    ) -> cipa_common::Result<()>;
}

/// Records confirmations in the service log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn candidate_approved(
        &self,
        candidate: &Candidate,
        collaborator: Option<&Collaborator>,
    ) -> cipa_common::Result<()> {
        let recipient = collaborator
            .and_then(|c| c.email.as_deref())
            .unwrap_or("<no email>");
        info!(
            candidate_id = %candidate.id,
            term_id = %candidate.term_id,
            recipient,
            "Candidacy confirmation dispatched"
        );
        Ok(())
    }
}
