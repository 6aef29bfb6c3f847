use std::sync::Arc;

use async_trait::async_trait;
use raven_packet::{
    origin, CapturedException, ClientConfig, ErrorLevel, EventSink, Packet, RavenClient,
};

/// Example of integrating a completely custom transport by implementing
/// the `EventSink` trait directly. Imagine this writes to a local spool
/// directory that another process uploads.
struct StdoutSink;

#[async_trait]
impl EventSink for StdoutSink {
    async fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("[{}] {}", packet.project, packet.body);
        Ok(())
    }
}

fn reserve_stock() -> CapturedException {
    CapturedException::new("StockUnavailable", "item 1137 is out of stock")
        .with_module("inventory")
        .with_origin(origin!())
        .caused_by(CapturedException::new("Timeout", "warehouse api timed out"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = RavenClient::new(ClientConfig::new("inventory"), Arc::new(StdoutSink));

    client.capture_message("custom backend example started", ErrorLevel::Info).await?;
    client.capture_exception(&reserve_stock()).await?;

    let err = "12a".parse::<u32>().unwrap_err();
    client.capture_error(&err).await?;
    Ok(())
}
