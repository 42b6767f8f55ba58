use crate::http::request::{Method, Request};
use std::collections::HashMap;

/// One complete unit taken off the wire.
///
/// A start line with fewer than three tokens still completes framing so the
/// router can answer it with a 400.
#[derive(Debug, Clone)]
pub enum Frame {
    Request(Request),
    Malformed { start_line: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Header terminator or declared body not buffered yet
    Incomplete,
    /// Content-Length present but not a non-negative integer
    InvalidContentLength,
    /// Content-Length above the accepted body limit
    BodyTooLarge(usize),
}

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Try to frame one request from the front of `buf`.
///
/// On success returns the frame and the number of bytes it occupied,
/// including any body announced by Content-Length.
pub fn parse_http_request(buf: &[u8]) -> Result<(Frame, usize), ParseError> {
    parse_http_request_with_limit(buf, usize::MAX)
}

/// Like [`parse_http_request`], but a declared body over `max_body` bytes
/// fails as soon as the head is buffered, before any body is waited for.
pub fn parse_http_request_with_limit(buf: &[u8], max_body: usize) -> Result<(Frame, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let head = String::from_utf8_lossy(&buf[..headers_end]);

    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    // Body
    let content_length = headers
        .get("Content-Length")
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)
        })
        .transpose()?
        .unwrap_or(0);

    if content_length > max_body {
        return Err(ParseError::BodyTooLarge(content_length));
    }

    let body_start = headers_end + HEADER_TERMINATOR.len();
    let total_consumed = body_start
        .checked_add(content_length)
        .ok_or(ParseError::InvalidContentLength)?;

    if buf.len() < total_consumed {
        return Err(ParseError::Incomplete);
    }

    if parts.len() < 3 {
        let frame = Frame::Malformed {
            start_line: request_line.to_string(),
        };
        return Ok((frame, total_consumed));
    }

    let request = Request {
        method: Method::parse(parts[0]),
        path: parts[1].to_string(),
        version: parts[2].to_string(),
        headers,
        body: buf[body_start..total_consumed].to_vec(),
    };

    Ok((Frame::Request(request), total_consumed))
}

/// Offset of the first CRLF CRLF, if any.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
