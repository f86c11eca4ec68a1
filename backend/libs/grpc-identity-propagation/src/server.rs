//! Server-side Access Control
//!
//! Extracts the caller identity from incoming gRPC requests, rejects callers
//! lacking the configured role, and stores the identity in request extensions
//! for handler access.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tonic::body::BoxBody;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tower::{Layer, Service};

use crate::access::AccessPolicy;

/// Server-side interceptor that admits only callers holding one role
///
/// This interceptor:
/// 1. Reads the `identity` entry from gRPC metadata
/// 2. Decodes it as an identity document
/// 3. Rejects the call unless the identity holds the configured role
/// 4. Stores the identity in request extensions for handler access
///
/// tonic runs server interceptors before unary and streaming handlers alike,
/// so streaming handlers see the identity too.
///
/// ## Errors
///
/// - `Status::permission_denied("Invalid role")` for a missing identity or role
/// - `Status::invalid_argument` for identity metadata that does not decode
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_identity_propagation::RoleInterceptor;
///
/// // let admin_only = UserServiceServer::with_interceptor(MyService, RoleInterceptor::new("admin"));
/// // let billing_only = BillingServiceServer::with_interceptor(Billing, RoleInterceptor::new("billing"));
/// ```
#[derive(Clone, Debug)]
pub struct RoleInterceptor {
    policy: AccessPolicy,
}

impl RoleInterceptor {
    pub fn new(required_role: impl Into<String>) -> Self {
        Self::from_policy(AccessPolicy::new(required_role))
    }

    pub fn from_policy(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

impl Interceptor for RoleInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        self.policy.authorize_request(&mut request)?;
        Ok(request)
    }
}

/// Tower layer applying a role requirement to every service on a server
///
/// ```rust,no_run
/// use grpc_identity_propagation::RequireRoleLayer;
/// use tonic::transport::Server;
///
/// let server = Server::builder().layer(RequireRoleLayer::new("admin"));
/// // server.add_service(AdminServiceServer::new(Admin)).serve(addr).await?;
/// ```
#[derive(Clone, Debug)]
pub struct RequireRoleLayer {
    policy: AccessPolicy,
}

impl RequireRoleLayer {
    pub fn new(required_role: impl Into<String>) -> Self {
        Self {
            policy: AccessPolicy::new(required_role),
        }
    }
}

impl<S> Layer<S> for RequireRoleLayer {
    type Service = RequireRoleService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RequireRoleService {
            inner: service,
            policy: self.policy.clone(),
        }
    }
}

/// Tower service answering unauthorized calls with a gRPC status
///
/// Rejected calls never reach the inner service, and the readiness reserved
/// for them is released on the spot.
#[derive(Clone, Debug)]
pub struct RequireRoleService<S> {
    inner: S,
    policy: AccessPolicy,
}

impl<S, B> Service<http::Request<B>> for RequireRoleService<S>
where
    S: Service<http::Request<B>, Response = http::Response<BoxBody>> + Clone,
    S::Future: Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        // The service polled ready is the one that must take this call
        let clone = self.inner.clone();
        let mut ready = std::mem::replace(&mut self.inner, clone);

        match self.policy.authorize_http(&mut req) {
            Ok(()) => Box::pin(ready.call(req)),
            Err(e) => {
                drop(ready);
                let response = e.to_status().into_http();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
