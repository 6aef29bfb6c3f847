use crate::dsn::{parse_dsn, Dsn, DsnError};
use crate::env::{env_opt, RAVEN_DSN_ENV, RAVEN_LOGGER_ENV, RAVEN_PROJECT_ENV, RAVEN_SERVER_NAME_ENV};
use crate::record::DEFAULT_LOGGER;

/// Project used when neither the caller nor the DSN names one.
pub const DEFAULT_PROJECT: &str = "default";

/// Settings applied to every record a [`RavenClient`] builds.
///
/// **Fields**
/// - `project`: target project identifier.
/// - `logger`: logger name; records default to `"root"`.
/// - `server_name`: replaces the detected host name when set.
/// - `dsn`: parsed endpoint used to pick a transport.
///
/// [`RavenClient`]: crate::client::RavenClient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub project: String,
    pub logger: String,
    pub server_name: Option<String>,
    pub dsn: Option<Dsn>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            logger: DEFAULT_LOGGER.to_string(),
            server_name: None,
            dsn: None,
        }
    }
}

impl ClientConfig {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    /// Build a config from a DSN, taking the project from it.
    pub fn from_dsn(dsn: Dsn) -> Self {
        Self {
            project: dsn.project().to_string(),
            dsn: Some(dsn),
            ..Self::default()
        }
    }

    /// Load settings from the `RAVEN_*` environment variables.
    ///
    /// **Returns**
    /// - `Err(..)` only when `RAVEN_DSN` is set but malformed.
    pub fn from_env() -> Result<Self, DsnError> {
        Self::from_lookup(env_opt)
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, DsnError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dsn = lookup(RAVEN_DSN_ENV).map(|raw| parse_dsn(&raw)).transpose()?;

        let project = lookup(RAVEN_PROJECT_ENV)
            .or_else(|| dsn.as_ref().map(|dsn| dsn.project().to_string()))
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string());

        Ok(Self {
            project,
            logger: lookup(RAVEN_LOGGER_ENV).unwrap_or_else(|| DEFAULT_LOGGER.to_string()),
            server_name: lookup(RAVEN_SERVER_NAME_ENV),
            dsn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.project, "default");
        assert_eq!(config.logger, "root");
    }

    #[test]
    fn project_falls_back_to_dsn() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            RAVEN_DSN_ENV,
            "https://pub@errors.example.com/42",
        )]))
        .unwrap();
        assert_eq!(config.project, "42");
        assert!(config.dsn.is_some());
    }

    #[test]
    fn explicit_project_wins_over_dsn() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (RAVEN_DSN_ENV, "https://pub@errors.example.com/42"),
            (RAVEN_PROJECT_ENV, "billing"),
            (RAVEN_LOGGER_ENV, "billing.worker"),
            (RAVEN_SERVER_NAME_ENV, "worker-3"),
        ]))
        .unwrap();
        assert_eq!(config.project, "billing");
        assert_eq!(config.logger, "billing.worker");
        assert_eq!(config.server_name.as_deref(), Some("worker-3"));
    }

    #[test]
    fn malformed_dsn_is_an_error() {
        let result = ClientConfig::from_lookup(lookup_from(&[(RAVEN_DSN_ENV, "ftp://x@y/1")]));
        assert!(matches!(result, Err(DsnError::UnknownScheme)));
    }
}
