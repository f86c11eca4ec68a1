//! Command handler seam
//!
//! Routing commands to handlers is the bus's job and lives elsewhere; this
//! module only fixes the handler contract: one command in, one reply out on a
//! oneshot channel.

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::{Result, UserError};
use crate::execution_context::ExecutionContext;

#[async_trait]
pub trait CommandHandler<C>: Send + Sync
where
    C: Send + 'static,
{
    /// Handle `command`, sending exactly one result on `out`
    async fn handle(&self, ctx: ExecutionContext, command: C, out: oneshot::Sender<Result<()>>);
}

/// Run a handler and wait for its reply
///
/// ## Errors
///
/// Returns the handler's error, or `UserError::HandlerDropped` if it finished
/// without replying.
pub async fn dispatch<C, H>(handler: &H, ctx: ExecutionContext, command: C) -> Result<()>
where
    C: Send + 'static,
    H: CommandHandler<C> + ?Sized,
{
    let (tx, rx) = oneshot::channel();
    handler.handle(ctx, command, tx).await;
    rx.await.map_err(|_| UserError::HandlerDropped)?
}
