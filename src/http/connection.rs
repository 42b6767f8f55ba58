use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::config::ServerConfig;
use crate::files::FileStore;
use crate::http::parser::{Frame, ParseError, find_headers_end, parse_http_request_with_limit};
use crate::http::response::{ConnectionMode, Response};
use crate::http::writer::ResponseWriter;
use crate::registry::ClientId;
use crate::router::Router;

const READ_CHUNK: usize = 4096;

/// Per-connection tuning taken from the server config.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub idle_timeout: Duration,
    pub max_idle_timeouts: u32,
    pub keep_alive: bool,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub write_timeout: Duration,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            idle_timeout: cfg.idle_timeout(),
            max_idle_timeouts: cfg.max_idle_timeouts,
            keep_alive: cfg.keep_alive,
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
            write_timeout: cfg.write_timeout(),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

enum ConnectionState {
    Reading,
    Processing(Frame),
    Writing(Response),
    Closed,
}

/// Outcome of waiting for the next request.
enum ReadEvent {
    Frame(Frame),
    /// Bytes arrived that can never form a request
    Rejected(Response),
    /// Peer closed, registry closed us, or too many idle ticks
    Closed,
}

/// Drives one client socket: frame a request, route it, write the
/// response, repeat until a close condition.
pub struct Connection<R, S> {
    id: ClientId,
    reader: R,
    writer: Arc<ResponseWriter>,
    router: Arc<Router<S>>,
    settings: ConnectionSettings,
    buffer: BytesMut,
    state: ConnectionState,
}

impl<R, S> Connection<R, S>
where
    R: AsyncRead + Unpin,
    S: FileStore,
{
    pub fn new(
        id: ClientId,
        reader: R,
        writer: Arc<ResponseWriter>,
        router: Arc<Router<S>>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            id,
            reader,
            writer,
            router,
            settings,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadEvent::Frame(frame) => ConnectionState::Processing(frame),
                        ReadEvent::Rejected(response) => ConnectionState::Writing(response),
                        ReadEvent::Closed => ConnectionState::Closed,
                    };
                }

                ConnectionState::Processing(frame) => {
                    self.router.registry().touch(self.id).await;
                    let mut response = self.router.dispatch(self.id, frame).await;

                    if !self.settings.keep_alive {
                        response = response.with_connection(ConnectionMode::Close);
                    }
                    self.state = ConnectionState::Writing(response);
                }

                ConnectionState::Writing(response) => {
                    if self.write_response(&response).await? && response.keep_alive() {
                        self.state = ConnectionState::Reading;
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Returns false when the socket is gone and the connection should end.
    async fn write_response(&self, response: &Response) -> anyhow::Result<bool> {
        match timeout(self.settings.write_timeout, self.writer.send(response)).await {
            Ok(Ok(())) => Ok(true),
            Ok(Err(_)) if self.writer.is_closed() => {
                tracing::debug!(client_id = self.id, "Write abandoned, connection closed by registry");
                Ok(false)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => {
                tracing::warn!(client_id = self.id, "Response write timed out");
                Ok(false)
            }
        }
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadEvent> {
        let mut idle_ticks = 0u32;

        loop {
            // Try parsing whatever we already have
            match parse_http_request_with_limit(&self.buffer, self.settings.max_body_bytes) {
                Ok((frame, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(ReadEvent::Frame(frame));
                }

                Err(ParseError::Incomplete) => {
                    if find_headers_end(&self.buffer).is_none()
                        && self.buffer.len() > self.settings.max_header_bytes
                    {
                        tracing::warn!(client_id = self.id, bytes = self.buffer.len(), "Request head too large");
                        return Ok(ReadEvent::Rejected(Response::bad_request("Request head too large")));
                    }
                }

                Err(ParseError::InvalidContentLength) => {
                    tracing::warn!(client_id = self.id, "Invalid Content-Length");
                    return Ok(ReadEvent::Rejected(Response::bad_request("Invalid Content-Length")));
                }

                Err(ParseError::BodyTooLarge(declared)) => {
                    tracing::warn!(client_id = self.id, declared, limit = self.settings.max_body_bytes, "Request body too large");
                    return Ok(ReadEvent::Rejected(Response::bad_request("Request body too large")));
                }
            }

            self.buffer.reserve(READ_CHUNK);

            let read = tokio::select! {
                res = timeout(self.settings.idle_timeout, self.reader.read_buf(&mut self.buffer)) => res,
                _ = self.writer.closed() => {
                    tracing::debug!(client_id = self.id, "Connection closed by registry");
                    return Ok(ReadEvent::Closed);
                }
            };

            match read {
                Err(_elapsed) => {
                    idle_ticks += 1;
                    tracing::debug!(client_id = self.id, idle_ticks, "Read timed out, still waiting");

                    if idle_ticks >= self.settings.max_idle_timeouts {
                        tracing::info!(client_id = self.id, idle_ticks, "Closing idle connection");
                        return Ok(ReadEvent::Closed);
                    }
                }
                Ok(Ok(0)) => {
                    // Client closed connection
                    return Ok(ReadEvent::Closed);
                }
                Ok(Ok(_)) => idle_ticks = 0,
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }
}
