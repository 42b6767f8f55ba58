use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::files::FileStore;
use crate::http::connection::{Connection, ConnectionSettings};
use crate::http::writer::ResponseWriter;
use crate::router::Router;

/// Bind `addr` and serve until the listener fails.
pub async fn run<S: FileStore>(
    addr: &str,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, router, settings).await
}

/// Accept connections forever, one task per client.
pub async fn serve<S: FileStore>(
    listener: TcpListener,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        let settings = settings.clone();
        tokio::spawn(async move {
            handle_socket(socket, peer, router, settings).await;
        });
    }
}

async fn handle_socket<S: FileStore>(
    socket: TcpStream,
    peer: std::net::SocketAddr,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
) {
    let (read_half, write_half) = socket.into_split();
    let writer = Arc::new(ResponseWriter::new(write_half));

    let registry = Arc::clone(router.registry());
    let (id, name) = registry.add(Arc::clone(&writer), peer).await;

    let mut conn = Connection::new(id, read_half, writer, router, settings);
    if let Err(e) = conn.run().await {
        tracing::warn!(client_id = id, client = %name, peer = %peer, error = %e, "Connection ended with error");
    }

    registry.disconnect(id).await;
    info!(client_id = id, client = %name, "Connection handler finished");
}
