//! User Service command side
//!
//! CQRS commands for the user aggregate, dispatched from gRPC handlers that
//! sit behind the identity-propagation interceptors.

pub mod command_bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod execution_context;
pub mod grpc;

pub use command_bus::{dispatch, CommandHandler};
pub use config::Settings;
pub use error::{Result, UserError};
pub use execution_context::{ExecutionContext, Flag};
pub use grpc::UserCommandService;
