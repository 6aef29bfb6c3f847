use crate::error::PacketError;
use crate::record::EventRecord;
use async_trait::async_trait;
use std::error::Error;

/// A serialized [`EventRecord`] ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Project the record targets.
    pub project: String,
    pub event_id: String,
    /// JSON body in wire format.
    pub body: String,
}

impl Packet {
    pub fn from_record(record: &EventRecord) -> Result<Self, PacketError> {
        Ok(Packet {
            project: record.project.clone(),
            event_id: record.event_id().to_string(),
            body: record.to_json()?,
        })
    }
}

/// Asynchronous destination for serialized [`Packet`]s.
///
/// Implementations are responsible for transporting packets to a concrete
/// endpoint (the HTTP store API, a file, a test buffer, etc). Delivery
/// policy such as retries or batching belongs to the implementation.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a single packet.
    ///
    /// **Parameters**
    /// - `packet`: serialized record plus the project it targets.
    ///
    /// **Returns**
    /// - `Ok(())` if the endpoint accepted the packet.
    /// - `Err(..)` if delivery failed (network error, HTTP status, etc.).
    async fn send(&self, packet: &Packet) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered packets, if the sink implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
