use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events of the user aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum UserEvent {
    WasRegisteredWithEmail {
        id: Uuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },

    WasRegisteredWithFacebook {
        id: Uuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },

    WasRegisteredWithGoogle {
        id: Uuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },

    EmailAddressWasChanged {
        id: Uuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },
}

impl UserEvent {
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            UserEvent::WasRegisteredWithEmail { id, .. }
            | UserEvent::WasRegisteredWithFacebook { id, .. }
            | UserEvent::WasRegisteredWithGoogle { id, .. }
            | UserEvent::EmailAddressWasChanged { id, .. } => *id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::WasRegisteredWithEmail { .. } => "WasRegisteredWithEmail",
            UserEvent::WasRegisteredWithFacebook { .. } => "WasRegisteredWithFacebook",
            UserEvent::WasRegisteredWithGoogle { .. } => "WasRegisteredWithGoogle",
            UserEvent::EmailAddressWasChanged { .. } => "EmailAddressWasChanged",
        }
    }
}
