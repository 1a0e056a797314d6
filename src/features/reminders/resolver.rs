//! Resolves a task owner to a mail recipient, honouring the opt-out flag

use crate::core::model::UserContact;
use crate::database::{IdentityProvider, TaskStore};
use log::{debug, warn};
use std::sync::Arc;

pub const FALLBACK_DISPLAY_NAME: &str = "there";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Contact(UserContact),
    /// The user switched reminders off
    OptedOut,
    /// No usable address; carries the reason
    Unresolved(String),
}

pub struct UserResolver {
    store: Arc<dyn TaskStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl UserResolver {
    pub fn new(store: Arc<dyn TaskStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        UserResolver { store, identity }
    }

    pub async fn resolve(&self, user_id: &str) -> Resolution {
        let preference = match self.store.get_preference(user_id).await {
            Ok(preference) => preference,
            Err(e) => {
                warn!("Could not load notification preference for {user_id}, assuming defaults: {e}");
                None
            }
        };

        if let Some(pref) = &preference {
            if !pref.notifications_enabled {
                debug!("User {user_id} has reminders switched off");
                return Resolution::OptedOut;
            }
        }

        let email = match self.identity.get_user_email(user_id).await {
            Ok(Some(email)) if !email.trim().is_empty() => email,
            Ok(_) => {
                warn!("No email address on record for user {user_id}, skipping reminder");
                return Resolution::Unresolved("no email address".to_string());
            }
            Err(e) => {
                warn!("Email lookup failed for user {user_id}: {e}");
                return Resolution::Unresolved(format!("email lookup failed: {e}"));
            }
        };

        let profile_name = preference.as_ref().and_then(|p| p.display_name.as_deref());
        Resolution::Contact(UserContact {
            display_name: display_name_for(profile_name, &email),
            email,
        })
    }
}

/// Profile name, else the mailbox local part, else a generic greeting
pub fn display_name_for(profile_name: Option<&str>, email: &str) -> String {
    if let Some(name) = profile_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    match email.split('@').next().map(str::trim) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::testing::{FakeIdentity, FakeStore};

    fn resolver(store: FakeStore, identity: FakeIdentity) -> (UserResolver, Arc<FakeIdentity>) {
        let identity = Arc::new(identity);
        (UserResolver::new(Arc::new(store), identity.clone()), identity)
    }

    #[tokio::test]
    async fn test_opted_out_user_skips_email_lookup() {
        let (resolver, identity) = resolver(
            FakeStore::default().with_preference("U2", Some("Bob"), false),
            FakeIdentity::new().with_email("U2", "bob@example.com"),
        );

        assert_eq!(resolver.resolve("U2").await, Resolution::OptedOut);
        assert!(identity.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_profile_name_wins() {
        let (resolver, _) = resolver(
            FakeStore::default().with_preference("U1", Some("Alice"), true),
            FakeIdentity::new().with_email("U1", "alice@example.com"),
        );

        assert_eq!(
            resolver.resolve("U1").await,
            Resolution::Contact(UserContact {
                email: "alice@example.com".to_string(),
                display_name: "Alice".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_missing_preference_means_enabled() {
        let (resolver, _) = resolver(
            FakeStore::default(),
            FakeIdentity::new().with_email("U1", "carol.smith@example.com"),
        );

        match resolver.resolve("U1").await {
            Resolution::Contact(contact) => assert_eq!(contact.display_name, "carol.smith"),
            other => panic!("expected contact, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preference_failure_is_treated_as_no_preference() {
        let (resolver, identity) = resolver(
            FakeStore::default().with_failing_preference("U1"),
            FakeIdentity::new().with_email("U1", "dave@example.com"),
        );

        assert!(matches!(resolver.resolve("U1").await, Resolution::Contact(_)));
        assert_eq!(identity.lookups(), vec!["U1".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_or_failed_email_is_unresolved() {
        let (resolver, _) = resolver(
            FakeStore::default(),
            FakeIdentity::new().with_failure("U9"),
        );

        assert!(matches!(resolver.resolve("U8").await, Resolution::Unresolved(_)));
        assert!(matches!(resolver.resolve("U9").await, Resolution::Unresolved(_)));
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name_for(Some("  Eve "), "eve@example.com"), "Eve");
        assert_eq!(display_name_for(Some(""), "eve@example.com"), "eve");
        assert_eq!(display_name_for(None, "@example.com"), FALLBACK_DISPLAY_NAME);
    }
}
