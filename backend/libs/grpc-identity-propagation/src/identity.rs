//! Caller Identity Structure
//!
//! The identity is built by an upstream auth layer and is read-only here.
//! Only `roles` carries meaning for access control; the other attributes ride
//! along for downstream handlers.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Authenticated caller attributes carried across request boundaries
///
/// Every field defaults when absent on the wire, and unknown fields are
/// ignored, so producers may send a richer document than this layer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// User ID
    pub id: Uuid,

    /// Upstream credential the identity was derived from (opaque)
    pub token: String,

    /// Email address
    pub email: String,

    /// Role labels granted to the caller
    #[serde(deserialize_with = "null_as_empty")]
    pub roles: Vec<String>,
}

/// Producers that marshal an empty role list as `null` mean "no roles"
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id,
            token: String::new(),
            email: email.into(),
            roles,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Check role membership
    ///
    /// Exact, case-sensitive match against each granted role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|granted| granted == role)
    }

    /// Structural equality that ignores the order of `roles`
    pub fn same_as(&self, other: &Identity) -> bool {
        if self.id != other.id || self.token != other.token || self.email != other.email {
            return false;
        }

        let mut ours: Vec<&str> = self.roles.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other.roles.iter().map(String::as_str).collect();
        ours.sort_unstable();
        theirs.sort_unstable();
        ours == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_with_roles(roles: &[&str]) -> Identity {
        Identity::new(
            Uuid::new_v4(),
            "test@example.com",
            roles.iter().map(|r| r.to_string()).collect(),
        )
    }

    #[test]
    fn test_has_role_exact_match() {
        let identity = identity_with_roles(&["user", "admin"]);

        assert!(identity.has_role("admin"));
        assert!(identity.has_role("user"));
        assert!(!identity.has_role("owner"));
    }

    #[test]
    fn test_has_role_is_case_sensitive() {
        let identity = identity_with_roles(&["Admin"]);

        assert!(!identity.has_role("admin"));
        assert!(!identity.has_role("ADMIN"));
        assert!(!identity.has_role("Admin "));
    }

    #[test]
    fn test_has_role_empty_roles() {
        let identity = identity_with_roles(&[]);
        assert!(!identity.has_role("admin"));
        assert!(!identity.has_role(""));
    }

    #[test]
    fn test_same_as_ignores_role_order() {
        let a = identity_with_roles(&["user", "admin"]);
        let mut b = a.clone();
        b.roles = vec!["admin".to_string(), "user".to_string()];

        assert!(a.same_as(&b));
        assert_ne!(a, b);

        b.roles.push("owner".to_string());
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_deserialize_partial_document() {
        let identity: Identity =
            serde_json::from_str(r#"{"roles":["admin"],"nickname":"ignored"}"#).expect("decodes");

        assert_eq!(identity.id, Uuid::nil());
        assert!(identity.email.is_empty());
        assert_eq!(identity.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_deserialize_null_roles() {
        let identity: Identity =
            serde_json::from_str(r#"{"email":"a@example.com","roles":null}"#).expect("decodes");

        assert!(identity.roles.is_empty());
        assert!(!identity.has_role("admin"));
    }

    #[test]
    fn test_serialized_field_names() {
        let identity = identity_with_roles(&["admin"]).with_token("opaque");
        let value = serde_json::to_value(&identity).expect("serializes");

        assert_eq!(value["email"], "test@example.com");
        assert_eq!(value["token"], "opaque");
        assert_eq!(value["roles"][0], "admin");
        assert_eq!(value["id"], identity.id.to_string());
    }
}
