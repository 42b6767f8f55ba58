//! HTTP protocol implementation.
//!
//! A small HTTP/1.x server with persistent connections.
//!
//! # Architecture
//!
//! - **`connection`**: per-socket loop that frames requests and writes responses
//! - **`parser`**: frames one request (head plus Content-Length body) from a byte buffer
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: serializes responses and owns the per-socket write lock
//! - **`mime`**: Content-Type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for a complete request (idle ticks counted)
//!        └──────┬──────┘
//!               │ Frame received (registry touched)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Router builds the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send through the shared writer
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Connection: keep-alive → Reading (same connection)
//!               └─ Connection: close → Closed
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
