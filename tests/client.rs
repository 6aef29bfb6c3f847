use std::error::Error;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use raven_packet::error::ClientError;
use raven_packet::{
    ClientConfig, ErrorLevel, EventSink, Packet, RavenClient, RequestContext, StaticContext,
    UserContext,
};

#[derive(Default)]
struct RecordingSink {
    packets: Mutex<Vec<Packet>>,
}

impl RecordingSink {
    fn bodies(&self) -> Vec<Value> {
        self.packets
            .lock()
            .unwrap()
            .iter()
            .map(|p| serde_json::from_str(&p.body).unwrap())
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn send(&self, packet: &Packet) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.packets.lock().unwrap().push(packet.clone());
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn send(&self, _packet: &Packet) -> Result<(), Box<dyn Error + Send + Sync>> {
        Err("connection refused".into())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("checkout failed")]
struct CheckoutFailed {
    #[source]
    source: PaymentDeclined,
}

#[derive(Debug, thiserror::Error)]
#[error("card declined")]
struct PaymentDeclined;

fn client(sink: Arc<RecordingSink>) -> RavenClient {
    let config = ClientConfig {
        logger: "shop.checkout".to_string(),
        server_name: Some("web-1".to_string()),
        ..ClientConfig::new("shop")
    };
    RavenClient::new(config, sink)
}

#[tokio::test]
async fn captured_error_carries_cause_chain() {
    let sink = Arc::new(RecordingSink::default());
    let client = client(sink.clone());

    let err = CheckoutFailed { source: PaymentDeclined };
    let event_id = client.capture_error(&err).await.unwrap();

    let bodies = sink.bodies();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];

    assert_eq!(body["event_id"], json!(event_id));
    assert_eq!(body["project"], json!("shop"));
    assert_eq!(body["level"], json!("error"));
    assert_eq!(body["logger"], json!("shop.checkout"));
    assert_eq!(body["server_name"], json!("web-1"));
    assert_eq!(body["message"], json!("checkout failed"));
    assert!(body.get("culprit").is_none());

    let frames = body["exception"].as_array().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["type"], json!("CheckoutFailed"));
    assert_eq!(frames[0]["value"], json!("checkout failed"));
    assert_eq!(frames[0]["module"], json!("client"));
    assert_eq!(frames[1]["type"], json!("PaymentDeclined"));
    assert_eq!(frames[1]["value"], json!("card declined"));
}

#[tokio::test]
async fn message_event_uses_requested_level() {
    let sink = Arc::new(RecordingSink::default());
    let client = client(sink.clone());

    client
        .capture_message("cache nearly full", ErrorLevel::Warning)
        .await
        .unwrap();

    let body = &sink.bodies()[0];
    assert_eq!(body["level"], json!("warning"));
    assert_eq!(body["message"], json!("cache nearly full"));
    assert!(body.get("exception").is_none());
    assert!(body.get("modules").is_none());
}

#[tokio::test]
async fn ambient_context_only_on_log_events() {
    let sink = Arc::new(RecordingSink::default());
    let ambient = StaticContext::new(RequestContext {
        url: Some("https://shop.example/pay".to_string()),
        ..Default::default()
    })
    .with_user(UserContext {
        username: Some("ada".to_string()),
        ..Default::default()
    });
    let client = client(sink.clone()).with_ambient(Arc::new(ambient));

    client.capture_message("hello", ErrorLevel::Info).await.unwrap();
    client.capture_error(&PaymentDeclined).await.unwrap();

    let bodies = sink.bodies();
    assert_eq!(bodies[0]["request"], json!({ "url": "https://shop.example/pay" }));
    assert_eq!(bodies[0]["user"], json!({ "username": "ada" }));
    assert!(bodies[1].get("request").is_none());
    assert!(bodies[1].get("user").is_none());
}

#[tokio::test]
async fn annotated_record_is_sent_as_built() {
    let sink = Arc::new(RecordingSink::default());
    let client = client(sink.clone());

    let record = client
        .event()
        .with_message("quota exceeded")
        .with_extra(json!({ "used": 1200, "limit": 1000 }))
        .with_tag("plan", "free");
    let event_id = client.capture(&record).await.unwrap();

    assert_eq!(event_id, record.event_id());
    let packets = sink.packets.lock().unwrap();
    assert_eq!(packets[0].project, "shop");
    assert_eq!(packets[0].body, record.to_json().unwrap());
}

#[tokio::test]
async fn transport_failure_reports_event_id() {
    let client = RavenClient::new(ClientConfig::new("shop"), Arc::new(FailingSink));

    let err = client
        .capture_message("lost", ErrorLevel::Error)
        .await
        .unwrap_err();

    match err {
        ClientError::Transport { event_id, source } => {
            assert_eq!(event_id.len(), 32);
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
}
