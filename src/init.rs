use crate::config::ClientConfig;
use crate::error::InitError;
use crate::layer::EventLayer;
use crate::sink::EventSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the event layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of records queued before new ones
///   are dropped.
/// - `min_level`: least severe tracing level that becomes an event.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`EventLayer`] and events are printed to the
///   console as well.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            min_level: Level::ERROR,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that reports events through
/// `sink`.
///
/// **Parameters**
/// - `client`: project, logger and server name applied to every record.
/// - `sink`: transport receiving serialized packets.
/// - `config`: [`LayerConfig`] controlling buffering and the level
///   threshold.
///
/// **Returns**
/// - The handle of the background forwarding task.
/// - `Err(InitError::AlreadyInstalled)` if a global subscriber exists.
///
/// Must be called inside a Tokio runtime.
pub fn init_tracing_with_config(
    client: ClientConfig,
    sink: Arc<dyn EventSink>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, InitError> {
    let (layer, handle) = EventLayer::new(sink, client, config.channel_buffer, config.min_level);

    // two branches because the subscriber types differ
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]: only `ERROR` events are reported and the
/// console output stays on.
pub fn init_tracing(
    client: ClientConfig,
    sink: Arc<dyn EventSink>,
) -> Result<JoinHandle<()>, InitError> {
    init_tracing_with_config(client, sink, LayerConfig::default())
}
