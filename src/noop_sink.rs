use crate::sink::{EventSink, Packet};
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all packets.
///
/// Used when no DSN is configured, and for measuring the overhead of
/// record construction without any external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn send(&self, _packet: &Packet) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
