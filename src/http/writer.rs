use std::io;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, watch};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

type Sink = Pin<Box<dyn AsyncWrite + Send>>;

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection closed")
}

/// Serialize a response in a fixed header order:
/// status line, Content-Type, Content-Length, Connection, blank line, body.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let head = format!(
        "{} {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase(),
        resp.content_type,
        resp.content_length(),
        resp.connection.as_str(),
    );

    let mut buf = Vec::with_capacity(head.len() + resp.body.len());
    buf.extend_from_slice(head.as_bytes());
    buf.extend_from_slice(&resp.body);
    buf
}

/// The write side of one client socket.
///
/// Shared between the connection task and the registry. Every write takes
/// the sink lock for the whole response, so responses from different tasks
/// never interleave on the wire. Closing raises a signal that the owning
/// connection's reader observes as end of stream.
pub struct ResponseWriter {
    sink: Mutex<Option<Sink>>,
    closed: watch::Sender<bool>,
}

impl ResponseWriter {
    pub fn new<W>(sink: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        let (closed, _) = watch::channel(false);
        let sink: Sink = Box::pin(sink);
        Self {
            sink: Mutex::new(Some(sink)),
            closed,
        }
    }

    /// Serialize and write one response.
    pub async fn send(&self, response: &Response) -> io::Result<()> {
        self.write_all(&serialize_response(response)).await
    }

    /// Write pre-serialized bytes as a single unit.
    ///
    /// A write still in flight when [`close`](Self::close) is called is
    /// abandoned and fails with `NotConnected`, releasing the sink lock.
    pub async fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let write = async {
            let mut sink = self.sink.lock().await;
            let stream = sink.as_mut().ok_or_else(not_connected)?;

            stream.write_all(bytes).await?;
            stream.flush().await
        };

        tokio::select! {
            biased;
            _ = self.closed() => Err(not_connected()),
            res = write => res,
        }
    }

    /// Signal the reader and shut the socket's write side down.
    ///
    /// Later writes fail with `NotConnected`. Calling it again is harmless.
    /// Never waits behind a stalled write: the signal cancels it first.
    pub async fn close(&self) {
        self.closed.send_replace(true);

        let mut sink = self.sink.lock().await;
        if let Some(mut stream) = sink.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "Shutdown after close failed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // Sender is owned by `self`; wait_for cannot observe a dropped channel.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
