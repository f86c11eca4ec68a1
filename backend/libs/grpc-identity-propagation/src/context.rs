//! Request Extension Trait for Identity Access
//!
//! The request's extension map is the per-call context: the client side reads
//! the identity to send from it, and the server side leaves the decoded
//! identity in it for handlers.

use tonic::{Request, Status};

use crate::error::IdentityError;
use crate::identity::Identity;

/// Extension trait for reading and attaching the caller identity
///
/// Implemented for `tonic::Request<T>` (interceptors and handlers) and
/// `http::Request<B>` (tower layers). tonic carries extensions across the
/// conversion between the two, so an identity attached at either level is
/// visible at the other.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_identity_propagation::IdentityExt;
/// use tonic::{Request, Response, Status};
///
/// async fn delete_user(request: Request<()>) -> Result<Response<()>, Status> {
///     let identity = request.require_identity()?;
///     println!("Deleted by {}", identity.email);
///     Ok(Response::new(()))
/// }
/// ```
pub trait IdentityExt: Sized {
    /// Identity attached to this request, if any
    fn identity(&self) -> Option<&Identity>;

    /// Attach an identity, replacing any previous one
    fn set_identity(&mut self, identity: Identity);

    /// Builder form of `set_identity`
    fn with_identity(mut self, identity: Identity) -> Self {
        self.set_identity(identity);
        self
    }

    /// Identity attached to this request
    ///
    /// ## Errors
    ///
    /// Returns the fixed `Status::permission_denied` when no identity is attached.
    fn require_identity(&self) -> Result<&Identity, Status> {
        self.identity()
            .ok_or_else(|| IdentityError::AccessDenied.to_status())
    }
}

impl<T> IdentityExt for Request<T> {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get::<Identity>()
    }

    fn set_identity(&mut self, identity: Identity) {
        self.extensions_mut().insert(identity);
    }
}

impl<B> IdentityExt for http::Request<B> {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get::<Identity>()
    }

    fn set_identity(&mut self, identity: Identity) {
        self.extensions_mut().insert(identity);
    }
}
