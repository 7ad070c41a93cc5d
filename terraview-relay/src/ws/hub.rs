//! Fan-out of readings to connected viewers

use std::sync::Arc;

use dashmap::DashMap;
use terraview_core::error::{Error, Result};
use terraview_core::models::Reading;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Handle for a viewer connection subscription
pub type ConnectionId = String;

/// Subscriber information
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub connection_id: ConnectionId,
    pub sender: mpsc::UnboundedSender<Arc<str>>,
}

/// In-memory hub tracking all open viewer connections.
///
/// Each subscriber owns an unbounded channel feeding its WebSocket writer
/// task, so messages published while a connection is registered reach it in
/// publish order. A failed send is treated as that connection closing: the
/// subscriber is deregistered and delivery to the others continues.
pub struct ReadingHub {
    connections: DashMap<ConnectionId, Subscriber>,
}

impl ReadingHub {
    /// Create a new hub with no registered connections
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection and return the receiving end of its channel.
    ///
    /// Registering an identity that is already present replaces the previous
    /// entry, closing its channel.
    pub fn register(&self, connection_id: ConnectionId) -> mpsc::UnboundedReceiver<Arc<str>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscriber = Subscriber {
            connection_id: connection_id.clone(),
            sender: tx,
        };

        if self.connections.insert(connection_id.clone(), subscriber).is_some() {
            warn!(
                connection_id = %connection_id,
                "Replaced existing subscriber with the same connection id"
            );
        }

        info!(
            connection_id = %connection_id,
            total_connections = self.connections.len(),
            "Connection registered"
        );

        rx
    }

    /// Deregister a connection. Safe to call when not registered (no-op).
    pub fn deregister(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            info!(
                connection_id = %connection_id,
                total_connections = self.connections.len(),
                "Connection deregistered"
            );
        } else {
            debug!(
                connection_id = %connection_id,
                "Deregister for unknown connection, ignoring"
            );
        }
    }

    /// Serialize a reading once and deliver it to every registered connection.
    ///
    /// Returns the number of successful deliveries. Connections whose channel
    /// has closed are deregistered after the delivery pass.
    pub fn publish(&self, reading: &Reading) -> usize {
        let payload: Arc<str> = match serde_json::to_string(reading) {
            Ok(json) => json.into(),
            Err(e) => {
                warn!(
                    terrarium_id = %reading.terrarium_id,
                    error = %e,
                    "Failed to serialize reading, dropping publish"
                );
                return 0;
            }
        };

        let mut sent_count = 0;
        let mut failed_connections = Vec::new();

        for entry in self.connections.iter() {
            let subscriber = entry.value();
            if subscriber.sender.send(Arc::clone(&payload)).is_ok() {
                sent_count += 1;
            } else {
                warn!(
                    connection_id = %subscriber.connection_id,
                    terrarium_id = %reading.terrarium_id,
                    "Failed to deliver reading, marking connection for cleanup"
                );
                failed_connections.push(subscriber.connection_id.clone());
            }
        }

        for connection_id in failed_connections {
            self.deregister(&connection_id);
        }

        debug!(
            terrarium_id = %reading.terrarium_id,
            sent_count,
            "Reading broadcast complete"
        );

        sent_count
    }

    /// Deliver a reading to a single connection (used for the initial
    /// snapshot, which is never broadcast).
    ///
    /// A failed send deregisters the connection, same as during a broadcast.
    pub fn send_to(&self, connection_id: &str, reading: &Reading) -> Result<()> {
        let payload: Arc<str> = serde_json::to_string(reading)?.into();

        let delivered = self
            .connections
            .get(connection_id)
            .is_some_and(|subscriber| subscriber.sender.send(payload).is_ok());

        if delivered {
            Ok(())
        } else {
            self.deregister(connection_id);
            Err(Error::DeliveryFailure(format!(
                "connection {connection_id} is gone"
            )))
        }
    }

    /// Number of currently registered connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for ReadingHub {
    fn default() -> Self {
        Self::new()
    }
}
