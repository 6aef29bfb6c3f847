use crate::config::ClientConfig;
use crate::context::AmbientContext;
use crate::exception::{CapturedException, Exception};
use crate::level::ErrorLevel;
use crate::record::{exception_frames, EventRecord};
use crate::sink::{EventSink, Packet};
use std::error::Error;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`EventRecord`]s and
/// forwards them to an [`EventSink`] via a bounded channel and a
/// background task.
///
/// Only events at `min_level` or more severe are captured. Events from
/// this crate's own targets are ignored so that client diagnostics never
/// loop back into the sink. Each record is sent once; a full channel
/// drops the record.
pub struct EventLayer {
    sender: mpsc::Sender<EventRecord>,
    config: ClientConfig,
    min_level: Level,
    ambient: Option<Arc<dyn AmbientContext>>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl EventLayer {
    /// Create a new layer and spawn a background task that pulls records
    /// from a bounded channel, serializes them and sends them to `sink`.
    ///
    /// Must be called inside a Tokio runtime. The task ends once the layer
    /// is dropped and the channel is drained.
    pub fn new(
        sink: Arc<dyn EventSink>,
        config: ClientConfig,
        buffer: usize,
        min_level: Level,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let (tx, mut rx) = mpsc::channel::<EventRecord>(buffer);

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                let packet = match Packet::from_record(&record) {
                    Ok(packet) => packet,
                    Err(e) => {
                        eprintln!("dropping event {}: {}", record.event_id(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(&packet).await {
                    eprintln!("event sink send failed for {}: {}", packet.event_id, e);
                }
            }
        });

        (
            Self {
                sender: tx,
                config,
                min_level,
                ambient: None,
                total_events: Arc::new(AtomicU64::new(0)),
                enqueued_events: Arc::new(AtomicU64::new(0)),
                dropped_events: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }

    /// Attach request/user lookups to captured events.
    pub fn with_ambient(mut self, ambient: Arc<dyn AmbientContext>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    fn build_record(&self, event: &Event<'_>) -> EventRecord {
        let meta = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = EventRecord::new(self.config.project.clone(), self.ambient.as_deref())
            .with_level(ErrorLevel::from(*meta.level()))
            .with_logger(meta.target());
        if let Some(name) = &self.config.server_name {
            record.server_name = Some(name.clone());
        }

        record.message = visitor
            .message
            .or_else(|| visitor.error.as_ref().map(|e| e.message()));
        if let Some(error) = &visitor.error {
            record.exceptions = Some(exception_frames(error));
        }

        for (key, value) in visitor.fields {
            record.insert_extra(key, value);
        }
        if let Some(module_path) = meta.module_path() {
            record.insert_extra("module_path", module_path.into());
        }
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record.insert_extra("location", format!("{}:{}", file, line).into());
        }

        record
    }
}

impl<S> Layer<S> for EventLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || is_own_target(meta.target()) {
            return;
        }

        let record = self.build_record(event);
        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("event channel full, dropping event record");
            }
        }
    }
}

/// Whether `target` belongs to this crate's own modules.
fn is_own_target(target: &str) -> bool {
    target == env!("CARGO_CRATE_NAME")
        || target.starts_with(concat!(env!("CARGO_CRATE_NAME"), "::"))
}

/// Collects the fields of one event.
#[derive(Default)]
struct FieldVisitor {
    fields: Vec<(String, serde_json::Value)>,
    message: Option<String>,
    /// First error-valued field, kept with its cause chain.
    error: Option<CapturedException>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: serde_json::Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, value.into());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.error.is_none() {
            self.error = Some(CapturedException::from_dyn_error(value));
        }
        self.insert(field, value.to_string().into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.insert(field, format!("{:?}", value).into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_own_target;

    #[test]
    fn own_targets_match_whole_crate_name() {
        assert!(is_own_target("raven_packet"));
        assert!(is_own_target("raven_packet::client"));
        assert!(!is_own_target("raven_packet_ext"));
        assert!(!is_own_target("raven_packet_ext::sync"));
        assert!(!is_own_target("checkout"));
    }
}
