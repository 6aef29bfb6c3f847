use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use raven_packet::init::{init_tracing_with_config, LayerConfig};
use raven_packet::noop_sink::NoopSink;
use raven_packet::ClientConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(NoopSink);

    let layer_config = LayerConfig {
        channel_buffer: 50_000,
        enable_stdout: false,
        ..LayerConfig::default()
    };
    init_tracing_with_config(ClientConfig::new("load-test"), sink, layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!("built {} event records in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
    Ok(())
}
