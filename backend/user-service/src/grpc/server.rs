//! gRPC command handlers for the user aggregate
//!
//! Each method pulls the identity attached by the role interceptor, wraps it
//! in an `ExecutionContext`, and dispatches the command to its handler.

use std::sync::Arc;

use grpc_identity_propagation::{IdentityExt, RoleInterceptor};
use tonic::{Request, Response, Status};
use tracing::warn;

use crate::command_bus::{dispatch, CommandHandler};
use crate::config::Settings;
use crate::domain::user::{
    ChangeEmailAddress, OnChangeEmailAddress, OnRegisterWithEmail, OnRegisterWithFacebook,
    OnRegisterWithGoogle, RegisterWithEmail, RegisterWithFacebook, RegisterWithGoogle,
    UserRepository,
};
use crate::execution_context::ExecutionContext;

/// UserCommandService - write side of the user service
pub struct UserCommandService<R: ?Sized> {
    settings: Settings,
    change_email_address: OnChangeEmailAddress<R>,
    register_with_email: OnRegisterWithEmail<R>,
    register_with_facebook: OnRegisterWithFacebook<R>,
    register_with_google: OnRegisterWithGoogle<R>,
}

impl<R> UserCommandService<R>
where
    R: UserRepository + ?Sized + 'static,
{
    pub fn new(repository: Arc<R>, settings: Settings) -> Self {
        Self {
            settings,
            change_email_address: OnChangeEmailAddress::new(repository.clone()),
            register_with_email: OnRegisterWithEmail::new(repository.clone()),
            register_with_facebook: OnRegisterWithFacebook::new(repository.clone()),
            register_with_google: OnRegisterWithGoogle::new(repository),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Interceptor admitting only callers holding the configured command role
    pub fn role_interceptor(&self) -> RoleInterceptor {
        RoleInterceptor::new(self.settings.command_role.clone())
    }

    /// ChangeEmailAddress - Replace the email address of a registered user
    pub async fn change_email_address(
        &self,
        request: Request<ChangeEmailAddress>,
    ) -> Result<Response<()>, Status> {
        execute(&self.change_email_address, request).await
    }

    /// RegisterWithEmail - Register a new user with an email address
    pub async fn register_with_email(
        &self,
        request: Request<RegisterWithEmail>,
    ) -> Result<Response<()>, Status> {
        execute(&self.register_with_email, request).await
    }

    /// RegisterWithFacebook - Register a new user through Facebook
    pub async fn register_with_facebook(
        &self,
        request: Request<RegisterWithFacebook>,
    ) -> Result<Response<()>, Status> {
        execute(&self.register_with_facebook, request).await
    }

    /// RegisterWithGoogle - Register a new user through Google
    pub async fn register_with_google(
        &self,
        request: Request<RegisterWithGoogle>,
    ) -> Result<Response<()>, Status> {
        execute(&self.register_with_google, request).await
    }
}

async fn execute<C, H>(handler: &H, request: Request<C>) -> Result<Response<()>, Status>
where
    C: Send + 'static,
    H: CommandHandler<C>,
{
    let identity = request.require_identity()?.clone();
    let actor = identity.id;
    let ctx = ExecutionContext::new().with_identity(identity);

    dispatch(handler, ctx, request.into_inner())
        .await
        .map_err(|e| {
            warn!(actor = %actor, "User command rejected: {}", e);
            e.to_status()
        })?;

    Ok(Response::new(()))
}
