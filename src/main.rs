use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use messagebus::client::Client;
use messagebus::config::load_config;
use messagebus::message::{Message, Payload, json_date};
use messagebus::transport::LoopbackTransport;
use messagebus::utils::logging;

const DEMO_DESTINATION: &str = "demo";

#[derive(Serialize)]
struct Heartbeat {
    node: String,
    #[serde(with = "json_date")]
    sent_at: DateTime<Utc>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let mut config = load_config().expect("Failed to load configuration");
    logging::init(&config.client.log_level);

    if !config.client.destinations.iter().any(|d| d == DEMO_DESTINATION) {
        config.client.destinations.push(DEMO_DESTINATION.to_string());
    }

    let transport = Arc::new(LoopbackTransport::new(config.client.host.clone()));
    let mut consumer = transport.subscribe(DEMO_DESTINATION);
    let mut client = Client::new(config.client, transport.clone());
    client.start().expect("Failed to start client");

    let heartbeat = Heartbeat {
        node: transport.host().to_string(),
        sent_at: Utc::now(),
    };

    let outcomes = [
        client.publish(
            DEMO_DESTINATION,
            Message::create_string_message("hello"),
            0,
            HashMap::new(),
        ),
        client.publish_binary(DEMO_DESTINATION, vec![0xca, 0xfe], 0, HashMap::new()),
        client.publish_object(DEMO_DESTINATION, &heartbeat, 0, HashMap::new()),
    ];

    let published = outcomes
        .into_iter()
        .filter(|outcome| match outcome {
            Ok(sent) => *sent,
            Err(e) => {
                error!(error = %e, "publish failed");
                false
            }
        })
        .count();

    for _ in 0..published {
        match consumer.receive().await {
            Some(Ok(delivery)) => {
                let message = delivery.message;
                let content = match message.payload() {
                    Payload::String(text) | Payload::Json(text) => text.clone(),
                    Payload::Binary(bytes) => format!("{} bytes", bytes.len()),
                };
                info!(
                    message_id = message.message_id(),
                    payload_type = %message.payload_type(),
                    ack_id = message.ack_id().unwrap_or_default(),
                    content = %content,
                    "consumed"
                );
            }
            Some(Err(e)) => error!(error = %e, "failed to decode delivery"),
            None => break,
        }
    }

    client.stop();
}
