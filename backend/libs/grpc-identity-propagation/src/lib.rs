//! Caller Identity Propagation for gRPC Microservices
//!
//! This library carries the caller's identity across service boundaries as JSON
//! in request metadata, and gates handlers on role membership at the receiving end.
//!
//! ## Core Components
//!
//! - **Identity**: Caller attributes (id, email, roles) serialized on the wire
//! - **IdentityExt**: Read/attach the identity on a request's extensions
//! - **IdentityClientInterceptor** / **IdentityPropagationLayer**: Attach the identity to outgoing calls
//! - **RoleInterceptor** / **RequireRoleLayer**: Deny incoming calls lacking the required role
//! - **AccessPolicy**: The single decision function shared by every server-side adapter
//!
//! tonic runs interceptors for unary and streaming calls alike, so each
//! interceptor covers both call shapes. The tower layers are the channel-wide
//! and server-wide registration points.
//!
//! ## Usage Example
//!
//! ### Client Side
//!
//! ```rust,no_run
//! use grpc_identity_propagation::{Identity, IdentityClientInterceptor, IdentityExt};
//! use tonic::Request;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = tonic::transport::Channel::from_static("http://[::1]:50051")
//!     .connect()
//!     .await?;
//!
//! // let mut client = UserServiceClient::with_interceptor(channel, IdentityClientInterceptor::new());
//!
//! // Identity set on the request travels in the `identity` metadata entry
//! let identity = Identity::new(Uuid::new_v4(), "alice@example.com", vec!["admin".into()]);
//! let request = Request::new(()).with_identity(identity);
//! // client.change_email_address(request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Server Side
//!
//! ```rust,no_run
//! use grpc_identity_propagation::{IdentityExt, RoleInterceptor};
//! use tonic::{Request, Response, Status};
//!
//! // let service = UserServiceServer::with_interceptor(MyService, RoleInterceptor::new("admin"));
//!
//! async fn change_email(request: Request<()>) -> Result<Response<()>, Status> {
//!     // Attached by the interceptor, no second decode
//!     let identity = request.require_identity()?;
//!     tracing::info!(user_id = %identity.id, "changing email");
//!     Ok(Response::new(()))
//! }
//! ```
//!
//! ## Failure Modes
//!
//! - No identity / role not held = `Status::permission_denied("Invalid role")`
//! - Undecodable identity metadata = `Status::invalid_argument`
//! - Identity that cannot be encoded = call aborted client-side with `Status::internal`

mod access;
mod client;
mod codec;
mod context;
mod error;
mod identity;
mod server;

pub use access::{AccessPolicy, Decision};
pub use client::{IdentityClientInterceptor, IdentityPropagationLayer, IdentityPropagationService};
pub use codec::{decode, encode, IDENTITY_METADATA_KEY};
pub use context::IdentityExt;
pub use error::IdentityError;
pub use identity::Identity;
pub use server::{RequireRoleLayer, RequireRoleService, RoleInterceptor};

// Re-export tonic Status for convenience
pub use tonic::Status;
