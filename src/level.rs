use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Severity of an [`EventRecord`](crate::record::EventRecord).
///
/// Serialized as its lowercase wire token (`"error"`, `"warning"`, ...),
/// never as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ErrorLevel {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
    Fatal,
}

impl ErrorLevel {
    /// Every level, lowest severity first.
    pub const ALL: [ErrorLevel; 5] = [
        ErrorLevel::Debug,
        ErrorLevel::Info,
        ErrorLevel::Warning,
        ErrorLevel::Error,
        ErrorLevel::Fatal,
    ];

    /// Wire token for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLevel::Debug => "debug",
            ErrorLevel::Info => "info",
            ErrorLevel::Warning => "warning",
            ErrorLevel::Error => "error",
            ErrorLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the five level tokens.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown error level `{0}`")]
pub struct ParseLevelError(pub String);

impl FromStr for ErrorLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(ErrorLevel::Debug),
            "info" => Ok(ErrorLevel::Info),
            "warning" => Ok(ErrorLevel::Warning),
            "error" => Ok(ErrorLevel::Error),
            "fatal" => Ok(ErrorLevel::Fatal),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

impl From<tracing::Level> for ErrorLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => ErrorLevel::Error,
            tracing::Level::WARN => ErrorLevel::Warning,
            tracing::Level::INFO => ErrorLevel::Info,
            // trace has no wire token of its own
            _ => ErrorLevel::Debug,
        }
    }
}

impl Serialize for ErrorLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct LevelVisitor;

impl<'de> Visitor<'de> for LevelVisitor {
    type Value = ErrorLevel;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of `debug`, `info`, `warning`, `error`, `fatal`")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ErrorLevel, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ErrorLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(LevelVisitor)
    }
}
