use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::ClientSettings;
use crate::message::Message;
use crate::transport::Transport;
use crate::utils::error::ClientError;

/// Frame header carrying the earliest delivery time, in epoch milliseconds.
pub const SCHEDULED_DELIVERY_TIME_MS_HEADER: &str = "scheduled_delivery_time_ms";

/// Publishing side of the bus.
///
/// A client only publishes to destinations named in its settings. When
/// `enable_auto_init_connections` is off, `start` opens nothing and every
/// publish is skipped with a warning.
pub struct Client {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
    started: bool,
    last_reload: Instant,
}

impl Client {
    pub fn new(settings: ClientSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            started: false,
            last_reload: Instant::now(),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Opens every configured destination on the transport.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if !self.settings.enable_auto_init_connections {
            info!("auto init connections disabled, not opening any destinations");
            return Ok(());
        }

        for destination in &self.settings.destinations {
            self.transport.open(destination)?;
        }
        self.started = true;
        info!(
            destinations = self.settings.destinations.len(),
            "client started"
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        for destination in &self.settings.destinations {
            self.transport.close(destination);
        }
        self.started = false;
        info!("client stopped");
    }

    /// Publishes `message` to `destination`.
    ///
    /// Returns `Ok(false)` without sending when auto init is disabled. A
    /// non-zero `delay_ms` adds the scheduled delivery header; entries in
    /// `headers` win over it.
    pub fn publish(
        &self,
        destination: &str,
        message: Message,
        delay_ms: u64,
        headers: HashMap<String, String>,
    ) -> Result<bool, ClientError> {
        if !self.settings.enable_auto_init_connections {
            warn!(
                destination,
                message_id = message.message_id(),
                "auto init connections disabled, not publishing"
            );
            return Ok(false);
        }

        if !self.settings.destinations.iter().any(|d| d == destination) {
            error!(
                destination,
                message_id = message.message_id(),
                "not publishing to unconfigured destination"
            );
            return Err(ClientError::InvalidDestination(destination.to_string()));
        }

        let mut frame_headers = delay_headers(delay_ms);
        frame_headers.extend(headers);

        let started = Instant::now();
        let result = self.transport.send(destination, &message, frame_headers);
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    destination,
                    message_id = message.message_id(),
                    payload_type = %message.payload_type(),
                    duration_ms,
                    "message published"
                );
                Ok(true)
            }
            Err(e) => {
                error!(
                    destination,
                    message_id = message.message_id(),
                    duration_ms,
                    error = %e,
                    "failed to publish message"
                );
                Err(e.into())
            }
        }
    }

    /// Serializes `object` into a JSON message with a generated id and
    /// publishes it.
    pub fn publish_object<T>(
        &self,
        destination: &str,
        object: &T,
        delay_ms: u64,
        headers: HashMap<String, String>,
    ) -> Result<bool, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let message = Message::create_json_message(object)?;
        self.publish(destination, message, delay_ms, headers)
    }

    pub fn publish_binary(
        &self,
        destination: &str,
        payload: impl Into<Bytes>,
        delay_ms: u64,
        headers: HashMap<String, String>,
    ) -> Result<bool, ClientError> {
        let message = Message::create_binary_message(payload);
        self.publish(destination, message, delay_ms, headers)
    }

    /// Swaps in `settings` if at least `min_interval` has passed since the
    /// last reload. Returns whether the settings were applied.
    ///
    /// A started client opens newly listed destinations and closes the ones
    /// that were dropped. If an open fails, destinations opened by this call
    /// are closed again and the old settings stay in place.
    pub fn reload_settings(
        &mut self,
        settings: ClientSettings,
        min_interval: Duration,
    ) -> Result<bool, ClientError> {
        if self.last_reload.elapsed() < min_interval {
            return Ok(false);
        }

        info!(interval_secs = min_interval.as_secs(), "reloading client settings");
        if self.started {
            let mut opened: Vec<&str> = Vec::new();
            for destination in &settings.destinations {
                if self.settings.destinations.contains(destination) {
                    continue;
                }
                if let Err(e) = self.transport.open(destination) {
                    error!(
                        destination = %destination,
                        error = %e,
                        "failed to open destination on reload"
                    );
                    for name in opened {
                        self.transport.close(name);
                    }
                    return Err(e.into());
                }
                opened.push(destination);
            }

            for destination in &self.settings.destinations {
                if !settings.destinations.contains(destination) {
                    self.transport.close(destination);
                }
            }
        }

        self.settings = settings;
        self.last_reload = Instant::now();
        Ok(true)
    }
}

fn delay_headers(delay_ms: u64) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if delay_ms > 0 {
        // delays past the i64 range pin to the far future
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        let deliver_at = Utc::now().timestamp_millis().saturating_add(delay);
        headers.insert(
            SCHEDULED_DELIVERY_TIME_MS_HEADER.to_string(),
            deliver_at.to_string(),
        );
    }
    headers
}
