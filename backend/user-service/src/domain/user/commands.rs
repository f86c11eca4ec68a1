//! User commands and their handlers
//!
//! Each handler loads or creates the aggregate, applies the command, and saves
//! under a live context. The outcome goes back on the reply channel; handlers
//! never panic on domain errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::aggregate::User;
use super::repository::UserRepository;
use crate::command_bus::CommandHandler;
use crate::error::Result;
use crate::execution_context::{ExecutionContext, Flag};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangeEmailAddress {
    pub id: Uuid,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterWithEmail {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterWithFacebook {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterWithGoogle {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Copy)]
enum Registration {
    Email,
    Facebook,
    Google,
}

fn reply(out: oneshot::Sender<Result<()>>, result: Result<()>) {
    if let Err(e) = &result {
        warn!("User command failed: {}", e);
    }
    // Caller gave up waiting; nothing left to report to
    let _ = out.send(result);
}

fn actor(ctx: &ExecutionContext) -> Option<Uuid> {
    ctx.identity().map(|identity| identity.id)
}

async fn register<R>(
    repository: &R,
    ctx: ExecutionContext,
    email: &str,
    registration: Registration,
) -> Result<()>
where
    R: UserRepository + ?Sized,
{
    // TODO: reject emails already registered once the repository exposes an email index
    let id = Uuid::new_v4();

    let mut user = User::new();
    match registration {
        Registration::Email => user.register_with_email(id, email)?,
        Registration::Facebook => user.register_with_facebook(id, email)?,
        Registration::Google => user.register_with_google(id, email)?,
    }

    repository
        .save(&ctx.clone().with_flag(Flag::Live), &mut user)
        .await?;

    info!(
        user_id = %id,
        actor = ?actor(&ctx),
        registration = ?registration,
        "User registered"
    );
    Ok(())
}

pub struct OnChangeEmailAddress<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> OnChangeEmailAddress<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    async fn change(&self, ctx: ExecutionContext, command: ChangeEmailAddress) -> Result<()>
    where
        R: UserRepository,
    {
        command.validate()?;

        let mut user = self.repository.get(command.id).await?;
        user.change_email_address(&command.email)?;
        self.repository
            .save(&ctx.clone().with_flag(Flag::Live), &mut user)
            .await?;

        info!(user_id = %command.id, actor = ?actor(&ctx), "User email address changed");
        Ok(())
    }
}

#[async_trait]
impl<R> CommandHandler<ChangeEmailAddress> for OnChangeEmailAddress<R>
where
    R: UserRepository + ?Sized + 'static,
{
    async fn handle(
        &self,
        ctx: ExecutionContext,
        command: ChangeEmailAddress,
        out: oneshot::Sender<Result<()>>,
    ) {
        reply(out, self.change(ctx, command).await);
    }
}

pub struct OnRegisterWithEmail<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> OnRegisterWithEmail<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R> CommandHandler<RegisterWithEmail> for OnRegisterWithEmail<R>
where
    R: UserRepository + ?Sized + 'static,
{
    async fn handle(
        &self,
        ctx: ExecutionContext,
        command: RegisterWithEmail,
        out: oneshot::Sender<Result<()>>,
    ) {
        let result = match command.validate() {
            Ok(()) => register(&*self.repository, ctx, &command.email, Registration::Email).await,
            Err(e) => Err(e.into()),
        };
        reply(out, result);
    }
}

pub struct OnRegisterWithFacebook<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> OnRegisterWithFacebook<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R> CommandHandler<RegisterWithFacebook> for OnRegisterWithFacebook<R>
where
    R: UserRepository + ?Sized + 'static,
{
    async fn handle(
        &self,
        ctx: ExecutionContext,
        command: RegisterWithFacebook,
        out: oneshot::Sender<Result<()>>,
    ) {
        let result = match command.validate() {
            Ok(()) => {
                register(&*self.repository, ctx, &command.email, Registration::Facebook).await
            }
            Err(e) => Err(e.into()),
        };
        reply(out, result);
    }
}

pub struct OnRegisterWithGoogle<R: ?Sized> {
    repository: Arc<R>,
}

impl<R: ?Sized> OnRegisterWithGoogle<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R> CommandHandler<RegisterWithGoogle> for OnRegisterWithGoogle<R>
where
    R: UserRepository + ?Sized + 'static,
{
    async fn handle(
        &self,
        ctx: ExecutionContext,
        command: RegisterWithGoogle,
        out: oneshot::Sender<Result<()>>,
    ) {
        let result = match command.validate() {
            Ok(()) => register(&*self.repository, ctx, &command.email, Registration::Google).await,
            Err(e) => Err(e.into()),
        };
        reply(out, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_bus::dispatch;
    use crate::domain::user::{InMemoryUserRepository, UserEvent};
    use crate::error::UserError;

    fn repository() -> Arc<InMemoryUserRepository> {
        Arc::new(InMemoryUserRepository::new(16))
    }

    #[tokio::test]
    async fn test_register_with_email_saves_live() {
        let repository = repository();
        let mut events = repository.subscribe();
        let handler = OnRegisterWithEmail::new(repository.clone());

        dispatch(
            &handler,
            ExecutionContext::new(),
            RegisterWithEmail {
                email: "new@example.com".to_string(),
            },
        )
        .await
        .expect("registered");

        let event = events.try_recv().expect("published");
        assert!(matches!(
            &event,
            UserEvent::WasRegisteredWithEmail { email, .. } if email == "new@example.com"
        ));

        let user = repository.get(event.aggregate_id()).await.unwrap();
        assert_eq!(user.email(), "new@example.com");
    }

    #[tokio::test]
    async fn test_register_with_providers() {
        let repository = repository();
        let mut events = repository.subscribe();

        dispatch(
            &OnRegisterWithFacebook::new(repository.clone()),
            ExecutionContext::new(),
            RegisterWithFacebook {
                email: "fb@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        dispatch(
            &OnRegisterWithGoogle::new(repository.clone()),
            ExecutionContext::new(),
            RegisterWithGoogle {
                email: "g@example.com".to_string(),
            },
        )
        .await
        .unwrap();

        let first = events.try_recv().unwrap();
        let second = events.try_recv().unwrap();
        assert_eq!(first.event_type(), "WasRegisteredWithFacebook");
        assert_eq!(second.event_type(), "WasRegisteredWithGoogle");
        assert_ne!(first.aggregate_id(), second.aggregate_id());
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let repository = repository();
        let mut events = repository.subscribe();
        let handler = OnRegisterWithEmail::new(repository.clone());

        let result = dispatch(
            &handler,
            ExecutionContext::new(),
            RegisterWithEmail {
                email: "not-an-email".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(UserError::Validation(_))));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_change_email_address() {
        let repository = repository();
        let mut events = repository.subscribe();
        dispatch(
            &OnRegisterWithEmail::new(repository.clone()),
            ExecutionContext::new(),
            RegisterWithEmail {
                email: "old@example.com".to_string(),
            },
        )
        .await
        .unwrap();
        let id = events.try_recv().unwrap().aggregate_id();

        dispatch(
            &OnChangeEmailAddress::new(repository.clone()),
            ExecutionContext::new(),
            ChangeEmailAddress {
                id,
                email: "new@example.com".to_string(),
            },
        )
        .await
        .expect("changed");

        assert_eq!(
            events.try_recv().unwrap().event_type(),
            "EmailAddressWasChanged"
        );
        assert_eq!(repository.get(id).await.unwrap().email(), "new@example.com");
        assert_eq!(repository.events(id).await.len(), 2);
    }

    #[tokio::test]
    async fn test_change_email_unknown_user() {
        let repository = repository();
        let id = Uuid::new_v4();

        let result = dispatch(
            &OnChangeEmailAddress::new(repository),
            ExecutionContext::new(),
            ChangeEmailAddress {
                id,
                email: "new@example.com".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(UserError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_handlers_work_behind_trait_object() {
        let repository: Arc<dyn UserRepository> = repository();
        let handler = OnRegisterWithGoogle::new(repository);

        let result = dispatch(
            &handler,
            ExecutionContext::new(),
            RegisterWithGoogle {
                email: "dyn@example.com".to_string(),
            },
        )
        .await;
        assert!(result.is_ok());
    }
}
