//! Connection registry
//!
//! Tracks every accepted connection for the lifetime of the process:
//! identity, activity, and the shared writer used to reach the socket.
//! All state sits behind one lock; socket I/O always happens after the
//! lock is released.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::http::response::Response;
use crate::http::writer::{ResponseWriter, serialize_response};

pub type ClientId = u64;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot of one connection's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    #[serde(rename = "client_id")]
    pub id: ClientId,

    pub name: String,

    /// Remote "host:port"
    pub address: String,

    /// Flips to false exactly once
    pub connected: bool,

    pub request_count: u64,

    /// Serialized as Unix seconds
    #[serde(serialize_with = "unix_seconds")]
    pub last_activity: SystemTime,
}

/// Aggregate view of the registry taken under a single lock acquisition.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_clients: usize,
    pub connected_clients: usize,
    pub disconnected_clients: usize,
    pub total_requests: u64,
    pub clients_info: Vec<ClientRecord>,
}

struct Entry {
    record: ClientRecord,
    writer: Arc<ResponseWriter>,
}

#[derive(Default)]
struct Clients {
    last_id: ClientId,
    entries: BTreeMap<ClientId, Entry>,
}

/// Process-wide table of client connections.
///
/// Records are never removed: a disconnected client stays listed, with its
/// closed writer, so stats keep counting it for the life of the process.
pub struct ClientRegistry {
    clients: Mutex<Clients>,
    write_timeout: Duration,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::with_write_timeout(DEFAULT_WRITE_TIMEOUT)
    }
}

fn unix_seconds<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    serializer.serialize_u64(secs)
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose broadcasts give up on a client after `write_timeout`.
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            clients: Mutex::new(Clients::default()),
            write_timeout,
        }
    }

    /// Register a freshly accepted connection.
    ///
    /// Ids start at 1 and are never reused.
    pub async fn add(&self, writer: Arc<ResponseWriter>, address: SocketAddr) -> (ClientId, String) {
        let mut clients = self.clients.lock().await;
        clients.last_id += 1;
        let id = clients.last_id;
        let name = format!("client-{}", id);

        let record = ClientRecord {
            id,
            name: name.clone(),
            address: address.to_string(),
            connected: true,
            request_count: 0,
            last_activity: SystemTime::now(),
        };
        clients.entries.insert(id, Entry { record, writer });

        tracing::info!(client_id = id, peer = %address, "Client registered");
        (id, name)
    }

    /// Count one framed request. Unknown ids are ignored.
    pub async fn touch(&self, id: ClientId) {
        let mut clients = self.clients.lock().await;
        if let Some(entry) = clients.entries.get_mut(&id) {
            entry.record.request_count += 1;
            entry.record.last_activity = SystemTime::now();
        }
    }

    /// Copy of one client's record.
    pub async fn get(&self, id: ClientId) -> Option<ClientRecord> {
        let clients = self.clients.lock().await;
        clients.entries.get(&id).map(|e| e.record.clone())
    }

    /// Mark a client disconnected and close its socket.
    ///
    /// Returns true only for the caller that observed `connected == true`;
    /// every other call (including a second call for the same id) is a no-op.
    pub async fn disconnect(&self, id: ClientId) -> bool {
        let writer = {
            let mut clients = self.clients.lock().await;
            match clients.entries.get_mut(&id) {
                Some(entry) if entry.record.connected => {
                    entry.record.connected = false;
                    Arc::clone(&entry.writer)
                }
                _ => return false,
            }
        };

        writer.close().await;
        tracing::info!(client_id = id, "Client disconnected");
        true
    }

    /// Disconnect every connected client.
    pub async fn disconnect_all(&self) -> usize {
        self.disconnect_all_except(None).await
    }

    /// Disconnect every connected client other than `keep`.
    pub async fn disconnect_all_except(&self, keep: Option<ClientId>) -> usize {
        let ids = self.connected_ids(keep).await;

        let mut count = 0;
        for id in ids {
            if self.disconnect(id).await {
                count += 1;
            }
        }

        tracing::info!(count, "Disconnected clients");
        count
    }

    /// Send `message` as a 200 text response to every connected client.
    pub async fn broadcast(&self, message: &str) -> usize {
        self.broadcast_except(message, None).await
    }

    /// Broadcast to every connected client other than `skip`.
    ///
    /// A client whose write fails or stalls past the write timeout is
    /// disconnected and not retried. Returns the number of successful sends.
    pub async fn broadcast_except(&self, message: &str, skip: Option<ClientId>) -> usize {
        let targets: Vec<(ClientId, Arc<ResponseWriter>)> = {
            let clients = self.clients.lock().await;
            clients
                .entries
                .iter()
                .filter(|(id, e)| e.record.connected && Some(**id) != skip)
                .map(|(id, e)| (*id, Arc::clone(&e.writer)))
                .collect()
        };

        let bytes = serialize_response(&Response::text(message));

        let mut sent = 0;
        for (id, writer) in targets {
            match timeout(self.write_timeout, writer.write_all(&bytes)).await {
                Ok(Ok(())) => sent += 1,
                Ok(Err(e)) => {
                    tracing::warn!(client_id = id, error = %e, "Broadcast write failed");
                    self.disconnect(id).await;
                }
                Err(_elapsed) => {
                    tracing::warn!(client_id = id, "Broadcast write timed out");
                    self.disconnect(id).await;
                }
            }
        }

        tracing::info!(sent, "Broadcast delivered");
        sent
    }

    /// Consistent snapshot of every record.
    pub async fn stats(&self) -> RegistryStats {
        let clients = self.clients.lock().await;

        let clients_info: Vec<ClientRecord> =
            clients.entries.values().map(|e| e.record.clone()).collect();
        let connected_clients = clients_info.iter().filter(|r| r.connected).count();
        let total_requests = clients_info.iter().map(|r| r.request_count).sum();

        RegistryStats {
            total_clients: clients_info.len(),
            connected_clients,
            disconnected_clients: clients_info.len() - connected_clients,
            total_requests,
            clients_info,
        }
    }

    async fn connected_ids(&self, skip: Option<ClientId>) -> Vec<ClientId> {
        let clients = self.clients.lock().await;
        clients
            .entries
            .iter()
            .filter(|(id, e)| e.record.connected && Some(**id) != skip)
            .map(|(id, _)| *id)
            .collect()
    }
}
