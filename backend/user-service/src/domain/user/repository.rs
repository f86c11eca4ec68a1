//! User repository seam
//!
//! Handlers only see `UserRepository`. The in-memory implementation keeps one
//! event list per user and publishes live events to subscribers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::aggregate::User;
use super::events::UserEvent;
use crate::error::{Result, UserError};
use crate::execution_context::{ExecutionContext, Flag};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user by replaying its events
    ///
    /// ## Errors
    ///
    /// Returns `UserError::NotFound` if no events exist for `id`.
    async fn get(&self, id: Uuid) -> Result<User>;

    /// Persist the user's pending changes
    ///
    /// Changes are published only when `ctx` carries `Flag::Live`.
    async fn save(&self, ctx: &ExecutionContext, user: &mut User) -> Result<()>;
}

/// Event-list repository held in process memory
pub struct InMemoryUserRepository {
    streams: RwLock<HashMap<Uuid, Vec<UserEvent>>>,
    live: broadcast::Sender<UserEvent>,
}

impl InMemoryUserRepository {
    pub fn new(event_buffer: usize) -> Self {
        let (live, _) = broadcast::channel(event_buffer.max(1));
        Self {
            streams: RwLock::new(HashMap::new()),
            live,
        }
    }

    /// Receive events saved under a live context from now on
    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.live.subscribe()
    }

    /// Stored events for one user
    pub async fn events(&self, id: Uuid) -> Vec<UserEvent> {
        self.streams
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: Uuid) -> Result<User> {
        let streams = self.streams.read().await;
        match streams.get(&id) {
            Some(events) if !events.is_empty() => Ok(User::from_history(events.iter().cloned())),
            _ => Err(UserError::NotFound(id)),
        }
    }

    async fn save(&self, ctx: &ExecutionContext, user: &mut User) -> Result<()> {
        if user.changes().is_empty() {
            return Ok(());
        }
        let id = user.id().ok_or(UserError::NotRegistered)?;
        let expected_version = user.committed_version();

        let changes = {
            let mut streams = self.streams.write().await;
            let stream = streams.entry(id).or_default();

            // Optimistic concurrency: history must not have moved since load
            if stream.len() as u64 != expected_version {
                return Err(UserError::Repository(format!(
                    "Concurrency conflict on user {}: expected version {} but found {}",
                    id,
                    expected_version,
                    stream.len()
                )));
            }

            let changes = user.take_changes();
            stream.extend(changes.iter().cloned());
            changes
        };

        debug!(
            user_id = %id,
            events = changes.len(),
            live = ctx.has_flag(Flag::Live),
            "Saved user events"
        );

        if ctx.has_flag(Flag::Live) {
            for event in changes {
                // Err only means nobody is subscribed
                let _ = self.live.send(event);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered_user() -> User {
        let mut user = User::new();
        user.register_with_email(Uuid::new_v4(), "a@example.com")
            .unwrap();
        user
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let repository = InMemoryUserRepository::new(8);
        let id = Uuid::new_v4();

        let result = repository.get(id).await;
        assert!(matches!(result, Err(UserError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let repository = InMemoryUserRepository::new(8);
        let mut user = registered_user();
        let id = user.id().unwrap();

        repository
            .save(&ExecutionContext::new(), &mut user)
            .await
            .unwrap();
        assert!(user.changes().is_empty());

        let loaded = repository.get(id).await.unwrap();
        assert_eq!(loaded.email(), "a@example.com");
        assert_eq!(loaded.version(), 1);
    }

    #[tokio::test]
    async fn test_live_save_publishes() {
        let repository = InMemoryUserRepository::new(8);
        let mut events = repository.subscribe();
        let mut user = registered_user();

        let ctx = ExecutionContext::new().with_flag(Flag::Live);
        repository.save(&ctx, &mut user).await.unwrap();

        let event = events.try_recv().expect("live event published");
        assert_eq!(event.event_type(), "WasRegisteredWithEmail");
    }

    #[tokio::test]
    async fn test_replay_save_does_not_publish() {
        let repository = InMemoryUserRepository::new(8);
        let mut events = repository.subscribe();
        let mut user = registered_user();
        let id = user.id().unwrap();

        let ctx = ExecutionContext::new().with_flag(Flag::Replay);
        repository.save(&ctx, &mut user).await.unwrap();

        assert!(events.try_recv().is_err());
        assert_eq!(repository.events(id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_modification_rejected() {
        let repository = InMemoryUserRepository::new(8);
        let mut user = registered_user();
        let id = user.id().unwrap();
        repository
            .save(&ExecutionContext::new(), &mut user)
            .await
            .unwrap();

        let mut first = repository.get(id).await.unwrap();
        let mut second = repository.get(id).await.unwrap();
        first.change_email_address("first@example.com").unwrap();
        second.change_email_address("second@example.com").unwrap();

        repository
            .save(&ExecutionContext::new(), &mut first)
            .await
            .unwrap();
        let result = repository.save(&ExecutionContext::new(), &mut second).await;

        assert!(matches!(result, Err(UserError::Repository(_))));
        assert_eq!(second.changes().len(), 1);
        assert_eq!(
            repository.get(id).await.unwrap().email(),
            "first@example.com"
        );
    }
}
