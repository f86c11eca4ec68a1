use thiserror::Error;
use tonic::metadata::errors::InvalidMetadataValue;
use tonic::Status;

/// Fixed message returned on every access denial.
///
/// Which check failed is never reported to the caller.
pub(crate) const ACCESS_DENIED_MESSAGE: &str = "Invalid role";

#[derive(Debug, Error)]
pub enum IdentityError {
    /// No identity, empty identity metadata, or required role not held
    #[error("Invalid role")]
    AccessDenied,

    /// Identity metadata present but not a valid identity document
    #[error("Malformed identity metadata: {0}")]
    MalformedIdentity(#[source] serde_json::Error),

    /// Outgoing identity could not be serialized
    #[error("Failed to encode identity: {0}")]
    Encode(#[source] serde_json::Error),

    /// Serialized identity is not a legal metadata value
    #[error("Invalid identity metadata value: {0}")]
    InvalidMetadata(#[from] InvalidMetadataValue),
}

impl IdentityError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            IdentityError::AccessDenied => Status::permission_denied(ACCESS_DENIED_MESSAGE),
            IdentityError::MalformedIdentity(_) => Status::invalid_argument(self.to_string()),
            IdentityError::Encode(_) | IdentityError::InvalidMetadata(_) => {
                Status::internal(self.to_string())
            }
        }
    }
}

impl From<IdentityError> for Status {
    fn from(err: IdentityError) -> Self {
        err.to_status()
    }
}
