//! In-process transport.
//!
//! Destinations fan every frame out to all of their subscribers over
//! unbounded channels. The public API is synchronous apart from
//! [`Consumer::receive`]; the destination table sits behind a `Mutex` that is
//! never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::message::Message;
use crate::transport::Transport;
use crate::transport::wire::Frame;
use crate::utils::error::TransportError;

pub type SubscriberId = String;

/// A message handed to a consumer, together with the frame headers it
/// arrived with.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub destination: String,
    pub headers: HashMap<String, String>,
    pub message: Message,
}

#[derive(Debug, Default)]
struct Destination {
    subscribers: HashMap<SubscriberId, UnboundedSender<String>>,
}

#[derive(Debug)]
pub struct LoopbackTransport {
    host: String,
    destinations: Mutex<HashMap<String, Destination>>,
}

impl LoopbackTransport {
    /// `host` is the address embedded in the ack tokens this transport mints.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            destinations: Mutex::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn destinations(&self) -> MutexGuard<'_, HashMap<String, Destination>> {
        self.destinations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self, destination: &str) -> bool {
        self.destinations().contains_key(destination)
    }

    pub fn subscriber_count(&self, destination: &str) -> usize {
        self.destinations()
            .get(destination)
            .map_or(0, |d| d.subscribers.len())
    }

    /// Subscribes a new consumer to `destination`, opening it if needed.
    pub fn subscribe(&self, destination: &str) -> Consumer {
        let id = format!("consumer-{}", Uuid::new_v4());
        let (tx, rx) = mpsc::unbounded_channel();

        self.destinations()
            .entry(destination.to_string())
            .or_default()
            .subscribers
            .insert(id.clone(), tx);

        info!(destination, consumer = %id, "consumer subscribed");

        Consumer {
            id,
            host: self.host.clone(),
            destination: destination.to_string(),
            receiver: rx,
        }
    }

    pub fn unsubscribe(&self, destination: &str, consumer_id: &str) {
        if let Some(d) = self.destinations().get_mut(destination) {
            d.subscribers.remove(consumer_id);
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}

impl Transport for LoopbackTransport {
    fn open(&self, destination: &str) -> Result<(), TransportError> {
        self.destinations()
            .entry(destination.to_string())
            .or_default();
        debug!(destination, "destination opened");
        Ok(())
    }

    fn close(&self, destination: &str) {
        if self.destinations().remove(destination).is_some() {
            debug!(destination, "destination closed");
        }
    }

    fn send(
        &self,
        destination: &str,
        message: &Message,
        headers: HashMap<String, String>,
    ) -> Result<(), TransportError> {
        let text = Frame::new(destination, message, headers).encode()?;

        let mut destinations = self.destinations();
        let target = destinations
            .get_mut(destination)
            .ok_or_else(|| TransportError::UnknownDestination(destination.to_string()))?;

        if target.subscribers.is_empty() {
            debug!(destination, message_id = message.message_id(), "no subscribers");
        }

        // consumers whose receiver was dropped are pruned
        target.subscribers.retain(|sub_id, sender| {
            match sender.send(text.clone()) {
                Ok(()) => true,
                Err(_) => {
                    warn!(destination, consumer = %sub_id, "dropping disconnected consumer");
                    false
                }
            }
        });

        Ok(())
    }
}

/// The receiving end of a subscription.
#[derive(Debug)]
pub struct Consumer {
    id: SubscriberId,
    host: String,
    destination: String,
    receiver: UnboundedReceiver<String>,
}

impl Consumer {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Waits for the next delivery. Returns `None` once the destination is
    /// closed and every queued frame has been drained.
    pub async fn receive(&mut self) -> Option<Result<Delivery, TransportError>> {
        let text = self.receiver.recv().await?;
        Some(self.accept(&text))
    }

    /// Returns the next queued delivery without waiting.
    pub fn try_receive(&mut self) -> Result<Option<Delivery>, TransportError> {
        match self.receiver.try_recv() {
            Ok(text) => self.accept(&text).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected(self.id.clone())),
        }
    }

    fn accept(&self, text: &str) -> Result<Delivery, TransportError> {
        let frame = Frame::decode(text)?;
        let mut message = Message::try_from(frame.message)?;
        message.set_ack_id(ack_token(&self.host, &self.id, message.message_id()));

        debug!(
            destination = %frame.destination,
            message_id = message.message_id(),
            "message received"
        );

        Ok(Delivery {
            destination: frame.destination,
            headers: frame.headers,
            message,
        })
    }
}

fn ack_token(host: &str, consumer_id: &str, message_id: &str) -> String {
    format!("{host}:{consumer_id}:{message_id}")
}
