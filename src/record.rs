use crate::context::{AmbientContext, RequestContext, UserContext};
use crate::error::PacketError;
use crate::exception::{chain, CapturedException, Exception, Origin};
use crate::host;
use crate::level::ErrorLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use uuid::Uuid;

/// Platform tag sent with every record.
pub const PLATFORM: &str = "rust";

/// Logger name used when the caller does not set one.
pub const DEFAULT_LOGGER: &str = "root";

/// Loaded library name and version. Part of the wire schema but never
/// populated by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub version: String,
}

/// One exception of a cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ExceptionFrame {
    pub fn from_exception(exception: &dyn Exception) -> Self {
        ExceptionFrame {
            module: exception.source_module().map(str::to_string),
            kind: exception.kind().to_string(),
            value: exception.message(),
        }
    }
}

/// Frames for `exception` and each of its causes, outermost first.
pub fn exception_frames(exception: &dyn Exception) -> Vec<ExceptionFrame> {
    chain(exception).map(ExceptionFrame::from_exception).collect()
}

/// A single error or log occurrence in the error-ingestion wire format.
///
/// Built with [`EventRecord::new`] (log event) or
/// [`EventRecord::from_exception`] (caught error), optionally annotated,
/// then serialized with [`EventRecord::to_json`]. Unset optional fields
/// are left out of the output entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    event_id: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culprit: Option<String>,
    pub level: ErrorLevel,
    pub timestamp: DateTime<Utc>,
    pub logger: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<Module>>,
    #[serde(rename = "exception", skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<ExceptionFrame>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,
    #[serde(skip_serializing_if = "is_absent")]
    pub extra: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

fn is_absent(value: &Option<serde_json::Value>) -> bool {
    matches!(value, None | Some(serde_json::Value::Null))
}

fn new_event_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl EventRecord {
    /// Defaults shared by both construction paths.
    fn blank(project: String) -> Self {
        EventRecord {
            event_id: new_event_id(),
            project,
            culprit: None,
            level: ErrorLevel::Error,
            timestamp: Utc::now(),
            logger: DEFAULT_LOGGER.to_string(),
            platform: PLATFORM.to_string(),
            message: None,
            server_name: host::server_name(),
            modules: None,
            exceptions: None,
            request: None,
            user: None,
            extra: None,
            tags: None,
        }
    }

    /// Build a log-event record for `project`.
    ///
    /// When `ambient` reports an active request it is attached, together
    /// with that request's user if it has one.
    pub fn new(project: impl Into<String>, ambient: Option<&dyn AmbientContext>) -> Self {
        let mut record = Self::blank(project.into());
        if let Some(request) = ambient.and_then(|ctx| ctx.current_request()) {
            record.user = ambient.and_then(|ctx| ctx.user_for(&request));
            record.request = Some(request);
        }
        record
    }

    /// Build a record describing `exception` and its whole cause chain.
    ///
    /// Request and user context are not attached on this path.
    pub fn from_exception(project: impl Into<String>, exception: &dyn Exception) -> Self {
        let mut record = Self::blank(project.into());
        record.message = Some(exception.message());
        record.culprit = exception.origin().map(Origin::culprit);
        record.exceptions = Some(exception_frames(exception));
        record
    }

    /// Shorthand for [`from_exception`](Self::from_exception) over a
    /// [`CapturedException::from_error`] snapshot.
    pub fn from_error<E: Error + 'static>(project: impl Into<String>, err: &E) -> Self {
        Self::from_exception(project, &CapturedException::from_error(err))
    }

    /// Hex identifier generated when the record was built.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn with_level(mut self, level: ErrorLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = logger.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Set one key of `extra`, turning it into an object if it held
    /// anything else.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let extra = self
            .extra
            .get_or_insert_with(|| serde_json::Value::Object(Default::default()));
        if !extra.is_object() {
            *extra = serde_json::Value::Object(Default::default());
        }
        if let serde_json::Value::Object(map) = extra {
            map.insert(key.into(), value);
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn to_json(&self) -> Result<String, PacketError> {
        serde_json::to_string(self).map_err(PacketError::Encode)
    }

    pub fn from_json(json: &str) -> Result<Self, PacketError> {
        serde_json::from_str(json).map_err(PacketError::Decode)
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
