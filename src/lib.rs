//! filehost - persistent-connection HTTP/1.x file server
//!
//! Static files over kept-alive connections, plus a small admin control
//! plane (stats, broadcast, forced disconnect) over the live client registry.

pub mod config;
pub mod files;
pub mod http;
pub mod registry;
pub mod router;
pub mod server;
