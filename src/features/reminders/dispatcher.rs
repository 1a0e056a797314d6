//! Resolve, render and send one digest per owner

use super::digest::{DigestCandidate, ReminderDigest};
use super::resolver::{Resolution, UserResolver};
use super::summary::{DispatchOutcome, UserOutcome};
use super::template::{DigestRenderer, REMINDER_SUBJECT};
use crate::mailer::{EmailTransport, OutgoingEmail};
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use std::sync::Arc;

pub struct Dispatcher {
    resolver: UserResolver,
    transport: Arc<dyn EmailTransport>,
    renderer: DigestRenderer,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(
        resolver: UserResolver,
        transport: Arc<dyn EmailTransport>,
        renderer: DigestRenderer,
        concurrency: usize,
    ) -> Self {
        Dispatcher {
            resolver,
            transport,
            renderer,
            concurrency: concurrency.max(1),
        }
    }

    /// Process every candidate, at most `concurrency` at a time.
    ///
    /// A slow user only holds up its own slot. Outcomes come back in
    /// candidate order whatever order the sends finish in.
    pub async fn dispatch_all(&self, candidates: Vec<DigestCandidate>) -> Vec<UserOutcome> {
        let mut outcomes: Vec<(usize, UserOutcome)> =
            stream::iter(candidates.into_iter().enumerate())
                .map(|(index, candidate)| async move {
                    (index, self.dispatch_one(candidate).await)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    pub async fn dispatch_one(&self, candidate: DigestCandidate) -> UserOutcome {
        let owner = candidate.owner.clone();
        let task_count = candidate.tasks.len();

        let outcome = match self.resolver.resolve(&owner).await {
            Resolution::OptedOut => DispatchOutcome::OptedOut,
            Resolution::Unresolved(reason) => DispatchOutcome::Unresolved(reason),
            Resolution::Contact(contact) => {
                let digest = ReminderDigest::new(candidate, contact);
                self.send(&digest).await
            }
        };

        UserOutcome {
            owner,
            task_count,
            outcome,
        }
    }

    async fn send(&self, digest: &ReminderDigest) -> DispatchOutcome {
        let email = OutgoingEmail {
            to: digest.email.clone(),
            subject: REMINDER_SUBJECT.to_string(),
            html: self.renderer.render(digest),
        };

        match self.transport.send(&email).await {
            Ok(true) => {
                info!(
                    "Sent reminder for {} task(s) to {}",
                    digest.tasks.len(),
                    digest.email
                );
                DispatchOutcome::Sent
            }
            Ok(false) => {
                warn!("Email transport not configured, reminder for {} not sent", digest.owner);
                DispatchOutcome::NotSent
            }
            Err(e) => {
                error!("Failed to send reminder to {}: {}", digest.email, e);
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
