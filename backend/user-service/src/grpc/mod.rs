//! gRPC entry points for user commands
//!
//! The command methods expect the `RoleInterceptor` from
//! [`UserCommandService::role_interceptor`] to have run first, so every
//! request reaching them carries a verified identity.

pub mod server;

pub use server::UserCommandService;
