use raven_packet::RavenClient;
use std::fs;

/// Reports a failed config read to the endpoint in `RAVEN_DSN`, e.g.
/// `RAVEN_DSN=https://public@errors.example.com/42`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = RavenClient::from_env()?;

    if let Err(err) = fs::read_to_string("/does/not/exist.toml") {
        let event_id = client.capture_error(&err).await?;
        println!("reported event {} to project {}", event_id, client.config().project);
    }
    Ok(())
}
