//! Role-based Access Decision
//!
//! One decision function backs every server-side adapter. Each call is
//! decided exactly once:
//!
//! 1. Read the first `identity` metadata value
//! 2. Absent or empty: deny without decoding
//! 3. Decode failure: error, distinct from a denial
//! 4. Required role among the caller's roles: allow
//! 5. Otherwise: deny

use tonic::Request;
use tracing::{debug, warn};

use crate::codec::{self, IDENTITY_METADATA_KEY};
use crate::context::IdentityExt;
use crate::error::IdentityError;
use crate::identity::Identity;

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Caller holds the required role; carries the decoded identity
    Allow(Identity),

    /// No identity, or required role not held
    Deny,
}

/// Access policy requiring one role, fixed at construction
///
/// Independent policies coexist freely; nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    required_role: String,
}

impl AccessPolicy {
    pub fn new(required_role: impl Into<String>) -> Self {
        Self {
            required_role: required_role.into(),
        }
    }

    pub fn required_role(&self) -> &str {
        &self.required_role
    }

    /// Decide access from the raw identity metadata value
    ///
    /// ## Errors
    ///
    /// Returns `IdentityError::MalformedIdentity` if the value is present but
    /// does not decode. A denial is `Ok(Decision::Deny)`, not an error.
    pub fn decide(&self, value: Option<&[u8]>) -> Result<Decision, IdentityError> {
        // An empty value is treated like a missing one rather than handed to
        // the decoder, where it would fail as malformed JSON
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                debug!("No identity metadata on request");
                return Ok(Decision::Deny);
            }
        };

        let identity = codec::decode(value).map_err(|e| {
            warn!("Failed to decode identity metadata: {}", e);
            e
        })?;

        if identity.has_role(&self.required_role) {
            debug!(
                user_id = %identity.id,
                role = %self.required_role,
                "Access granted"
            );
            return Ok(Decision::Allow(identity));
        }

        warn!(
            user_id = %identity.id,
            required_role = %self.required_role,
            "Access denied: required role not granted"
        );
        Ok(Decision::Deny)
    }

    /// Authorize a tonic request, attaching the identity on success
    ///
    /// ## Errors
    ///
    /// - `IdentityError::AccessDenied` on denial
    /// - `IdentityError::MalformedIdentity` if the metadata does not decode
    pub fn authorize_request<T>(&self, request: &mut Request<T>) -> Result<(), IdentityError> {
        let decision = self.decide(
            request
                .metadata()
                .get(IDENTITY_METADATA_KEY)
                .map(|value| value.as_encoded_bytes()),
        )?;

        Self::attach(decision, request)
    }

    /// Authorize an HTTP-level request, attaching the identity on success
    ///
    /// Same contract as `authorize_request`.
    pub fn authorize_http<B>(&self, request: &mut http::Request<B>) -> Result<(), IdentityError> {
        let decision = self.decide(
            request
                .headers()
                .get(IDENTITY_METADATA_KEY)
                .map(|value| value.as_bytes()),
        )?;

        Self::attach(decision, request)
    }

    fn attach<R: IdentityExt>(decision: Decision, request: &mut R) -> Result<(), IdentityError> {
        match decision {
            Decision::Allow(identity) => {
                request.set_identity(identity);
                Ok(())
            }
            Decision::Deny => Err(IdentityError::AccessDenied),
        }
    }
}
