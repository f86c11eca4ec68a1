use chrono::Utc;
use uuid::Uuid;

use super::events::UserEvent;
use crate::error::{Result, UserError};

/// User Aggregate Root
///
/// State is derived entirely from events. New events are applied immediately
/// and kept as pending changes until the repository persists them.
#[derive(Debug, Clone, Default)]
pub struct User {
    id: Option<Uuid>,
    email: String,
    version: u64,

    // Event tracking
    changes: Vec<UserEvent>,
}

impl User {
    /// Create an empty, unregistered user
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a user from its stored events
    pub fn from_history(events: impl IntoIterator<Item = UserEvent>) -> Self {
        let mut user = Self::new();
        for event in events {
            user.apply(&event);
        }
        user
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Number of events applied, pending changes included
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version as last persisted, before pending changes
    pub fn committed_version(&self) -> u64 {
        self.version - self.changes.len() as u64
    }

    pub fn changes(&self) -> &[UserEvent] {
        &self.changes
    }

    /// Get and clear pending changes
    pub fn take_changes(&mut self) -> Vec<UserEvent> {
        std::mem::take(&mut self.changes)
    }

    pub fn register_with_email(&mut self, id: Uuid, email: &str) -> Result<()> {
        self.ensure_unregistered()?;
        self.record(UserEvent::WasRegisteredWithEmail {
            id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub fn register_with_facebook(&mut self, id: Uuid, email: &str) -> Result<()> {
        self.ensure_unregistered()?;
        self.record(UserEvent::WasRegisteredWithFacebook {
            id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub fn register_with_google(&mut self, id: Uuid, email: &str) -> Result<()> {
        self.ensure_unregistered()?;
        self.record(UserEvent::WasRegisteredWithGoogle {
            id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub fn change_email_address(&mut self, email: &str) -> Result<()> {
        let id = self.id.ok_or(UserError::NotRegistered)?;
        self.record(UserEvent::EmailAddressWasChanged {
            id,
            email: email.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    fn ensure_unregistered(&self) -> Result<()> {
        match self.id {
            Some(id) => Err(UserError::AlreadyRegistered(id)),
            None => Ok(()),
        }
    }

    fn record(&mut self, event: UserEvent) {
        self.apply(&event);
        self.changes.push(event);
    }

    fn apply(&mut self, event: &UserEvent) {
        match event {
            UserEvent::WasRegisteredWithEmail { id, email, .. }
            | UserEvent::WasRegisteredWithFacebook { id, email, .. }
            | UserEvent::WasRegisteredWithGoogle { id, email, .. } => {
                self.id = Some(*id);
                self.email = email.clone();
            }
            UserEvent::EmailAddressWasChanged { email, .. } => {
                self.email = email.clone();
            }
        }
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_with_email() {
        let id = Uuid::new_v4();
        let mut user = User::new();
        user.register_with_email(id, "a@example.com").unwrap();

        assert_eq!(user.id(), Some(id));
        assert_eq!(user.email(), "a@example.com");
        assert_eq!(user.version(), 1);
        assert_eq!(user.committed_version(), 0);
        assert!(matches!(
            user.changes(),
            [UserEvent::WasRegisteredWithEmail { .. }]
        ));
    }

    #[test]
    fn test_register_twice_rejected() {
        let id = Uuid::new_v4();
        let mut user = User::new();
        user.register_with_google(id, "a@example.com").unwrap();

        let result = user.register_with_facebook(Uuid::new_v4(), "b@example.com");
        assert!(matches!(result, Err(UserError::AlreadyRegistered(existing)) if existing == id));
        assert_eq!(user.changes().len(), 1);
    }

    #[test]
    fn test_change_email_requires_registration() {
        let mut user = User::new();
        let result = user.change_email_address("a@example.com");

        assert!(matches!(result, Err(UserError::NotRegistered)));
        assert!(user.changes().is_empty());
    }

    #[test]
    fn test_from_history_replays_state() {
        let id = Uuid::new_v4();
        let mut user = User::new();
        user.register_with_facebook(id, "old@example.com").unwrap();
        user.change_email_address("new@example.com").unwrap();
        let events = user.take_changes();

        let rebuilt = User::from_history(events);
        assert_eq!(rebuilt.id(), Some(id));
        assert_eq!(rebuilt.email(), "new@example.com");
        assert_eq!(rebuilt.version(), 2);
        assert_eq!(rebuilt.committed_version(), 2);
        assert!(rebuilt.changes().is_empty());
    }
}
