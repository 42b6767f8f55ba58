use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP status codes the server emits.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request or admin payload
/// - `NotFound` (404): Resource or client not found
/// - `InternalServerError` (500): Failure while handling the request
/// - `NotImplemented` (501): Method other than GET on a resource
/// - `HttpVersionNotSupported` (505): Version other than HTTP/1.0 or HTTP/1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use filehost::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::HttpVersionNotSupported.as_u16(), 505);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

/// Value of the `Connection` header, and what happens to the socket after
/// the response is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    KeepAlive,
    Close,
}

impl ConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::KeepAlive => "keep-alive",
            ConnectionMode::Close => "close",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Content-Length is not stored; the writer always derives it from `body`.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: String,
    pub connection: ConnectionMode,
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use filehost::http::response::{ResponseBuilder, StatusCode, ConnectionMode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("application/json")
///     .connection(ConnectionMode::KeepAlive)
///     .body(b"{}".to_vec())
///     .build();
/// assert_eq!(response.content_length(), 2);
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    content_type: String,
    connection: ConnectionMode,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Starts a response. Errors default to `Connection: close`.
    pub fn new(status: StatusCode) -> Self {
        let connection = if status == StatusCode::Ok {
            ConnectionMode::KeepAlive
        } else {
            ConnectionMode::Close
        };

        Self {
            status,
            content_type: TEXT_PLAIN.to_string(),
            connection,
            body: Vec::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn connection(mut self, connection: ConnectionMode) -> Self {
        self.connection = connection;
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            content_type: self.content_type,
            connection: self.connection,
            body: self.body,
        }
    }
}

impl Response {
    /// 200 with the given payload, keeping the connection open.
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .content_type(content_type)
            .body(body)
            .build()
    }

    /// 200 plain-text response.
    pub fn text(message: impl Into<String>) -> Self {
        Self::ok(TEXT_PLAIN, message.into())
    }

    /// JSON response with the given status, keeping the connection open.
    ///
    /// Serialization failures turn into a 500.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => ResponseBuilder::new(status)
                .content_type(APPLICATION_JSON)
                .connection(ConnectionMode::KeepAlive)
                .body(body)
                .build(),
            Err(e) => Self::internal_error(&e.to_string()),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: &str) -> Self {
        Self::error(StatusCode::BadRequest, message)
    }

    /// 404 Not Found naming the missing resource.
    pub fn not_found(resource: &str) -> Self {
        Self::error(
            StatusCode::NotFound,
            &format!("Resource not found: {}", resource),
        )
    }

    /// 500 Internal Server Error carrying the failure description.
    pub fn internal_error(description: &str) -> Self {
        Self::error(
            StatusCode::InternalServerError,
            &format!("Internal server error: {}", description),
        )
    }

    /// 501 Not Implemented for a method other than GET.
    pub fn not_implemented(method: &str) -> Self {
        Self::error(
            StatusCode::NotImplemented,
            &format!("Method not implemented: {}", method),
        )
    }

    /// 505 HTTP Version Not Supported.
    pub fn version_not_supported(version: &str) -> Self {
        Self::error(
            StatusCode::HttpVersionNotSupported,
            &format!("HTTP version not supported: {}", version),
        )
    }

    /// Plain-text error; the connection is closed after it.
    pub fn error(status: StatusCode, message: &str) -> Self {
        ResponseBuilder::new(status)
            .connection(ConnectionMode::Close)
            .body(message.as_bytes().to_vec())
            .build()
    }

    /// Same response with a different `Connection` value.
    pub fn with_connection(mut self, connection: ConnectionMode) -> Self {
        self.connection = connection;
        self
    }

    pub fn keep_alive(&self) -> bool {
        self.connection == ConnectionMode::KeepAlive
    }

    /// Exact byte length of the body.
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
