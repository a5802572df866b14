use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use arcade_types::{CustomerRef, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    /// Set once the client has sent its hello.
    pub customer: Option<CustomerRef>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            customer: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    customer_to_connection: RwLock<HashMap<String, ConnectionId>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            customer_to_connection: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    /// Remove the connection, returning the customer it belonged to so the
    /// caller can tidy up invites and presence.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<CustomerRef> {
        let customer = {
            let mut connections = self.connections.write().await;
            connections.remove(&id).and_then(|conn| conn.customer)
        };

        if let Some(ref customer) = customer {
            let mut customer_to_connection = self.customer_to_connection.write().await;
            customer_to_connection.remove(&customer.id);
        }

        customer
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    /// Bind a hello'd customer to the connection. One live connection per
    /// customer; a second device gets rejected until the first drops.
    pub async fn identify_connection(
        &self,
        id: ConnectionId,
        customer: CustomerRef,
    ) -> Result<(), String> {
        {
            let customer_to_connection = self.customer_to_connection.read().await;
            if let Some(existing) = customer_to_connection.get(&customer.id) {
                if *existing != id {
                    return Err("Customer already connected".to_string());
                }
            }
        }

        {
            let mut connections = self.connections.write().await;
            let connection = connections
                .get_mut(&id)
                .ok_or_else(|| "Connection not found".to_string())?;
            connection.customer = Some(customer.clone());
        }

        let mut customer_to_connection = self.customer_to_connection.write().await;
        customer_to_connection.insert(customer.id, id);
        Ok(())
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_customer(
        &self,
        customer_id: &str,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connection_id = {
            let customer_to_connection = self.customer_to_connection.read().await;
            customer_to_connection.get(customer_id).copied()
        };

        if let Some(connection_id) = connection_id {
            self.send_to_connection(connection_id, message).await
        } else {
            Err("Customer not connected".to_string())
        }
    }

    pub async fn is_customer_online(&self, customer_id: &str) -> bool {
        let customer_to_connection = self.customer_to_connection.read().await;
        customer_to_connection.contains_key(customer_id)
    }

    /// Every identified customer currently connected.
    pub async fn online_customers(&self) -> Vec<CustomerRef> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter_map(|conn| conn.customer.clone())
            .collect()
    }

    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<CustomerRef> {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        let mut dropped = Vec::new();
        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            if let Some(customer) = self.remove_connection(connection_id).await {
                dropped.push(customer);
            }
        }
        dropped
    }

    // Test helper methods
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn customer_connection_count(&self) -> usize {
        let customer_connections = self.customer_to_connection.read().await;
        customer_connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
