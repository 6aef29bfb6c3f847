use std::error::Error;

/// Failure turning an [`EventRecord`](crate::record::EventRecord) into wire
/// format or back.
#[derive(thiserror::Error, Debug)]
pub enum PacketError {
    #[error("failed to encode event record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode event record: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Error returned by [`RavenClient`](crate::client::RavenClient) captures.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error("transport failed to deliver event {event_id}: {source}")]
    Transport {
        event_id: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Error returned when installing the global tracing subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Error returned when building a client from the environment.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Dsn(#[from] crate::dsn::DsnError),

    #[error(transparent)]
    Sink(#[from] crate::dsn::SinkBuildError),
}
