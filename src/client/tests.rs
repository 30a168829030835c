use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use super::{Client, SCHEDULED_DELIVERY_TIME_MS_HEADER};
use crate::config::ClientSettings;
use crate::message::{Message, PayloadType};
use crate::transport::{LoopbackTransport, Transport};
use crate::utils::error::{ClientError, TransportError};

type Sent = (String, String, HashMap<String, String>);

// Records every call; `fail` makes send return an error.
#[derive(Default)]
struct RecordingTransport {
    opened: Mutex<Vec<String>>,
    closed: Mutex<Vec<String>>,
    sent: Mutex<Vec<Sent>>,
    fail: bool,
    fail_open: Option<&'static str>,
}

impl Transport for RecordingTransport {
    fn open(&self, destination: &str) -> Result<(), TransportError> {
        if self.fail_open == Some(destination) {
            return Err(TransportError::UnknownDestination(destination.to_string()));
        }
        self.opened.lock().unwrap().push(destination.to_string());
        Ok(())
    }

    fn close(&self, destination: &str) {
        self.closed.lock().unwrap().push(destination.to_string());
    }

    fn send(
        &self,
        destination: &str,
        message: &Message,
        headers: HashMap<String, String>,
    ) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::UnknownDestination(destination.to_string()));
        }
        self.sent.lock().unwrap().push((
            destination.to_string(),
            message.message_id().to_string(),
            headers,
        ));
        Ok(())
    }
}

fn settings(destinations: &[&str]) -> ClientSettings {
    ClientSettings {
        log_level: "info".to_string(),
        enable_auto_init_connections: true,
        host: "127.0.0.1".to_string(),
        destinations: destinations.iter().map(|d| d.to_string()).collect(),
    }
}

#[test]
fn test_start_and_stop_open_and_close_destinations() {
    let transport = Arc::new(RecordingTransport::default());
    let mut client = Client::new(settings(&["orders", "invoices"]), transport.clone());

    client.start().unwrap();
    assert!(client.is_started());
    assert_eq!(*transport.opened.lock().unwrap(), vec!["orders", "invoices"]);

    client.stop();
    assert!(!client.is_started());
    assert_eq!(*transport.closed.lock().unwrap(), vec!["orders", "invoices"]);
}

#[test]
fn test_publish_sends_without_delay_header() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    let msg = Message::create_string_message_with_id("m1", "hello");
    let headers = HashMap::from([("priority".to_string(), "high".to_string())]);
    assert!(client.publish("orders", msg, 0, headers).unwrap());

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (destination, message_id, headers) = &sent[0];
    assert_eq!(destination, "orders");
    assert_eq!(message_id, "m1");
    assert_eq!(headers.get("priority").map(String::as_str), Some("high"));
    assert!(!headers.contains_key(SCHEDULED_DELIVERY_TIME_MS_HEADER));
}

#[test]
fn test_delayed_publish_carries_schedule_header() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    let before = Utc::now().timestamp_millis();
    let msg = Message::create_string_message("later");
    assert!(client.publish("orders", msg, 5_000, HashMap::new()).unwrap());
    let after = Utc::now().timestamp_millis();

    let sent = transport.sent.lock().unwrap();
    let scheduled: i64 = sent[0].2[SCHEDULED_DELIVERY_TIME_MS_HEADER].parse().unwrap();
    assert!(scheduled >= before + 5_000);
    assert!(scheduled <= after + 5_000);
}

#[test]
fn test_caller_headers_override_schedule_header() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    let headers = HashMap::from([(SCHEDULED_DELIVERY_TIME_MS_HEADER.to_string(), "1".to_string())]);
    let msg = Message::create_string_message("later");
    client.publish("orders", msg, 5_000, headers).unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].2[SCHEDULED_DELIVERY_TIME_MS_HEADER], "1");
}

#[test]
fn test_publish_skipped_when_auto_init_disabled() {
    let transport = Arc::new(RecordingTransport::default());
    let mut cfg = settings(&["orders"]);
    cfg.enable_auto_init_connections = false;
    let mut client = Client::new(cfg, transport.clone());

    client.start().unwrap();
    assert!(!client.is_started());
    assert!(transport.opened.lock().unwrap().is_empty());

    let msg = Message::create_string_message("hello");
    assert!(!client.publish("orders", msg, 0, HashMap::new()).unwrap());
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[test]
fn test_publish_to_unconfigured_destination_fails() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    let msg = Message::create_string_message("hello");
    let err = client.publish("refunds", msg, 0, HashMap::new()).unwrap_err();
    assert!(matches!(err, ClientError::InvalidDestination(d) if d == "refunds"));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[test]
fn test_transport_failure_is_propagated() {
    let transport = Arc::new(RecordingTransport {
        fail: true,
        ..Default::default()
    });
    let client = Client::new(settings(&["orders"]), transport);

    let msg = Message::create_string_message("hello");
    let err = client.publish("orders", msg, 0, HashMap::new()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn test_publish_object_serialization_failure() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    let bad: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
    let err = client
        .publish_object("orders", &bad, 0, HashMap::new())
        .unwrap_err();
    assert!(matches!(err, ClientError::Message(_)));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[test]
fn test_reload_respects_interval_and_opens_new_destinations() {
    let transport = Arc::new(RecordingTransport::default());
    let mut client = Client::new(settings(&["orders"]), transport.clone());
    client.start().unwrap();

    let applied = client
        .reload_settings(settings(&["orders", "refunds"]), Duration::from_secs(300))
        .unwrap();
    assert!(!applied);
    assert_eq!(client.settings().destinations, vec!["orders"]);

    let applied = client
        .reload_settings(settings(&["orders", "refunds"]), Duration::ZERO)
        .unwrap();
    assert!(applied);
    assert_eq!(client.settings().destinations, vec!["orders", "refunds"]);
    assert_eq!(*transport.opened.lock().unwrap(), vec!["orders", "refunds"]);
}

#[test]
fn test_huge_delays_saturate_instead_of_wrapping() {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(settings(&["orders"]), transport.clone());

    for delay in [u64::MAX, i64::MAX as u64] {
        let msg = Message::create_string_message("far future");
        assert!(client.publish("orders", msg, delay, HashMap::new()).unwrap());
    }

    let sent = transport.sent.lock().unwrap();
    for (_, _, headers) in sent.iter() {
        let scheduled: i64 = headers[SCHEDULED_DELIVERY_TIME_MS_HEADER].parse().unwrap();
        assert_eq!(scheduled, i64::MAX);
    }
}

#[test]
fn test_reload_closes_dropped_destinations() {
    let transport = Arc::new(LoopbackTransport::default());
    let mut client = Client::new(settings(&["orders", "refunds"]), transport.clone());
    client.start().unwrap();
    assert!(transport.is_open("refunds"));

    assert!(
        client
            .reload_settings(settings(&["orders"]), Duration::ZERO)
            .unwrap()
    );
    assert!(transport.is_open("orders"));
    assert!(!transport.is_open("refunds"));

    client.stop();
    assert!(!transport.is_open("orders"));
    assert!(!transport.is_open("refunds"));
}

#[test]
fn test_reload_rolls_back_when_an_open_fails() {
    let transport = Arc::new(RecordingTransport {
        fail_open: Some("audit"),
        ..Default::default()
    });
    let mut client = Client::new(settings(&["orders"]), transport.clone());
    client.start().unwrap();

    let err = client
        .reload_settings(settings(&["refunds", "audit"]), Duration::ZERO)
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));

    assert_eq!(client.settings().destinations, vec!["orders"]);
    assert_eq!(*transport.opened.lock().unwrap(), vec!["orders", "refunds"]);
    // refunds is closed again; orders stays open because nothing was swapped
    assert_eq!(*transport.closed.lock().unwrap(), vec!["refunds"]);
}

#[tokio::test]
async fn test_publish_over_loopback() {
    let transport = Arc::new(LoopbackTransport::new("10.0.0.7"));
    let mut consumer = transport.subscribe("orders");
    let mut client = Client::new(settings(&["orders"]), transport.clone());
    client.start().unwrap();

    assert!(
        client
            .publish_object("orders", &json!({"order_id": 1}), 0, HashMap::new())
            .unwrap()
    );
    assert!(
        client
            .publish_binary("orders", vec![0xde, 0xad], 0, HashMap::new())
            .unwrap()
    );

    let json_delivery = consumer.receive().await.unwrap().unwrap();
    assert_eq!(json_delivery.message.payload_type(), PayloadType::Json);
    let value: serde_json::Value =
        serde_json::from_str(json_delivery.message.json_string_payload().unwrap()).unwrap();
    assert_eq!(value, json!({"order_id": 1}));

    let binary_delivery = consumer.receive().await.unwrap().unwrap();
    assert_eq!(
        binary_delivery.message.binary_payload().unwrap().as_ref(),
        &[0xde_u8, 0xad][..]
    );
    assert!(
        binary_delivery
            .message
            .ack_id()
            .unwrap()
            .starts_with("10.0.0.7:")
    );
}
