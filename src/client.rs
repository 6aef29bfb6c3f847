use crate::config::ClientConfig;
use crate::context::AmbientContext;
use crate::dsn::make_sink_from_dsn;
use crate::error::{ClientError, SetupError};
use crate::exception::{CapturedException, Exception};
use crate::level::ErrorLevel;
use crate::noop_sink::NoopSink;
use crate::record::EventRecord;
use crate::sink::{EventSink, Packet};
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds [`EventRecord`]s from a [`ClientConfig`] and hands them to an
/// [`EventSink`].
///
/// Records are built synchronously; only delivery is awaited, so the
/// exception or error passed in never has to outlive the call.
#[derive(Clone)]
pub struct RavenClient {
    config: ClientConfig,
    sink: Arc<dyn EventSink>,
    ambient: Option<Arc<dyn AmbientContext>>,
}

impl RavenClient {
    pub fn new(config: ClientConfig, sink: Arc<dyn EventSink>) -> Self {
        RavenClient {
            config,
            sink,
            ambient: None,
        }
    }

    /// Client configured from `RAVEN_*` variables.
    ///
    /// Without a DSN events are built but dropped by a [`NoopSink`].
    pub fn from_env() -> Result<Self, SetupError> {
        let config = ClientConfig::from_env()?;
        let sink = match &config.dsn {
            Some(dsn) => make_sink_from_dsn(dsn)?,
            None => Arc::new(NoopSink) as Arc<dyn EventSink>,
        };
        Ok(Self::new(config, sink))
    }

    /// Attach request/user lookups to log events built by this client.
    pub fn with_ambient(mut self, ambient: Arc<dyn AmbientContext>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Log-event record with ambient request/user context attached.
    pub fn event(&self) -> EventRecord {
        self.configure(EventRecord::new(
            self.config.project.clone(),
            self.ambient.as_deref(),
        ))
    }

    /// Record describing `exception` and its causes.
    pub fn exception_event(&self, exception: &dyn Exception) -> EventRecord {
        self.configure(EventRecord::from_exception(
            self.config.project.clone(),
            exception,
        ))
    }

    fn configure(&self, record: EventRecord) -> EventRecord {
        let mut record = record.with_logger(self.config.logger.clone());
        if let Some(name) = &self.config.server_name {
            record.server_name = Some(name.clone());
        }
        record
    }

    /// Serialize `record` and pass it to the sink.
    ///
    /// **Returns**
    /// - `Ok(event_id)` once the sink accepted the packet.
    /// - `Err(ClientError::Packet)` if the record could not be encoded.
    /// - `Err(ClientError::Transport)` if the sink failed.
    pub async fn capture(&self, record: &EventRecord) -> Result<String, ClientError> {
        let packet = Packet::from_record(record)?;
        debug!(event_id = %packet.event_id, project = %packet.project, "sending event");

        if let Err(source) = self.sink.send(&packet).await {
            warn!(event_id = %packet.event_id, error = %source, "event sink rejected packet");
            return Err(ClientError::Transport {
                event_id: packet.event_id,
                source,
            });
        }
        Ok(packet.event_id)
    }

    pub fn capture_message(
        &self,
        message: impl Into<String>,
        level: ErrorLevel,
    ) -> impl Future<Output = Result<String, ClientError>> + Send + '_ {
        let record = self.event().with_message(message).with_level(level);
        async move { self.capture(&record).await }
    }

    pub fn capture_exception(
        &self,
        exception: &dyn Exception,
    ) -> impl Future<Output = Result<String, ClientError>> + Send + '_ {
        let record = self.exception_event(exception);
        async move { self.capture(&record).await }
    }

    pub fn capture_error<E: Error + 'static>(
        &self,
        err: &E,
    ) -> impl Future<Output = Result<String, ClientError>> + Send + '_ {
        self.capture_exception(&CapturedException::from_error(err))
    }

    /// Flush the underlying sink.
    pub async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sink.flush().await
    }
}
