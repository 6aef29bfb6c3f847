//! Environment variable names used by [`ClientConfig::from_env`].
//!
//! These are purely helpers; records and sinks never read the
//! environment themselves.
//!
//! [`ClientConfig::from_env`]: crate::config::ClientConfig::from_env

/// Full DSN, e.g. `https://public@errors.example.com/42`.
pub const RAVEN_DSN_ENV: &str = "RAVEN_DSN";

/// Project identifier. Falls back to the DSN's project.
pub const RAVEN_PROJECT_ENV: &str = "RAVEN_PROJECT";

/// Logger name for records built by the client.
pub const RAVEN_LOGGER_ENV: &str = "RAVEN_LOGGER";

/// Overrides the host name reported as `server_name`.
pub const RAVEN_SERVER_NAME_ENV: &str = "RAVEN_SERVER_NAME";

/// Read an environment variable, treating an empty value as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
