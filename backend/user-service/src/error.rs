use thiserror::Error;
use tonic::{Code, Status};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, UserError>;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User already registered: {0}")]
    AlreadyRegistered(Uuid),

    #[error("User not registered")]
    NotRegistered,

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Command handler dropped without replying")]
    HandlerDropped,
}

impl UserError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            UserError::Validation(msg) => Status::new(Code::InvalidArgument, msg.clone()),
            UserError::NotFound(_) => Status::new(Code::NotFound, "User not found"),
            UserError::AlreadyRegistered(_) => {
                Status::new(Code::AlreadyExists, "User already registered")
            }
            UserError::NotRegistered => {
                Status::new(Code::FailedPrecondition, "User not registered")
            }
            UserError::Repository(_) | UserError::HandlerDropped => {
                Status::new(Code::Internal, "Internal server error")
            }
        }
    }
}

impl From<validator::ValidationErrors> for UserError {
    fn from(errors: validator::ValidationErrors) -> Self {
        UserError::Validation(errors.to_string())
    }
}

impl From<UserError> for Status {
    fn from(err: UserError) -> Self {
        err.to_status()
    }
}
