//! Configuration for the user command service
//!
//! Loaded from `USER_SERVICE_*` environment variables (and a `.env` file in
//! development). Every setting has a default.

use serde::Deserialize;

const ENV_PREFIX: &str = "USER_SERVICE_";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Role required to issue user commands (`USER_SERVICE_COMMAND_ROLE`)
    #[serde(default = "default_command_role")]
    pub command_role: String,

    /// Capacity of the live event channel (`USER_SERVICE_EVENT_BUFFER`)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_command_role() -> String {
    "admin".to_string()
}

fn default_event_buffer() -> usize {
    64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_role: default_command_role(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        let settings: Settings = envy::prefixed(ENV_PREFIX).from_env()?;
        if settings.command_role.trim().is_empty() {
            return Err(envy::Error::Custom(format!(
                "{}COMMAND_ROLE must not be empty",
                ENV_PREFIX
            )));
        }

        tracing::info!(
            command_role = %settings.command_role,
            event_buffer = settings.event_buffer,
            "Loaded user service settings"
        );
        Ok(settings)
    }
}
