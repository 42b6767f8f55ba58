//! Administrative routes
//!
//! JSON control plane over the client registry, plus the static admin page.
//! Responses keep the connection open, except the admin page and a body-less
//! POST whose body boundary cannot be trusted.

use std::fmt;

use serde::Deserialize;
use serde_json::json;

use crate::files::FileStore;
use crate::http::mime::content_type_for;
use crate::http::request::{Method, Request};
use crate::http::response::{ConnectionMode, Response, StatusCode};
use crate::registry::ClientId;
use crate::router::Router;

/// An administrative operation decoded from method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOp {
    Page,
    Stats,
    DisconnectAll,
    DisconnectClient(ClientId),
    Broadcast,
    ClientDetails(ClientId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Path under `/admin` with no matching operation
    UnknownRoute(String),
    /// Client id segment is not a number
    InvalidClientId(String),
    /// Operation needs a body but no Content-Length was sent
    MissingBody,
    /// Body is not the expected JSON shape
    InvalidBody(String),
    /// No connected client with that id
    ClientNotFound(ClientId),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::UnknownRoute(path) => write!(f, "unknown admin route: {}", path),
            AdminError::InvalidClientId(raw) => write!(f, "invalid client id: {}", raw),
            AdminError::MissingBody => write!(f, "request body required (Content-Length missing or zero)"),
            AdminError::InvalidBody(reason) => write!(f, "invalid JSON body: {}", reason),
            AdminError::ClientNotFound(id) => write!(f, "client not found: {}", id),
        }
    }
}

impl std::error::Error for AdminError {}

impl AdminError {
    fn into_response(self) -> Response {
        let (status, connection) = match &self {
            AdminError::UnknownRoute(_) | AdminError::ClientNotFound(_) => {
                (StatusCode::NotFound, ConnectionMode::KeepAlive)
            }
            AdminError::InvalidClientId(_) | AdminError::InvalidBody(_) => {
                (StatusCode::BadRequest, ConnectionMode::KeepAlive)
            }
            AdminError::MissingBody => (StatusCode::BadRequest, ConnectionMode::Close),
        };

        Response::json(status, &json!({ "error": self.to_string() })).with_connection(connection)
    }
}

#[derive(Debug, Deserialize)]
struct BroadcastBody {
    message: String,
}

/// Decode the operation for `method` and `path`.
pub fn parse_op(method: &Method, path: &str) -> Result<AdminOp, AdminError> {
    match (method, path) {
        (Method::GET, "/admin") => Ok(AdminOp::Page),
        (Method::GET, "/admin-stats") => Ok(AdminOp::Stats),
        (Method::POST, "/admin-disconnect-all") => Ok(AdminOp::DisconnectAll),
        (Method::POST, "/admin-broadcast") => Ok(AdminOp::Broadcast),
        (Method::POST, p) if p.starts_with("/admin-disconnect-client/") => {
            parse_id(&p["/admin-disconnect-client/".len()..]).map(AdminOp::DisconnectClient)
        }
        (Method::GET, p) if p.starts_with("/admin-client-details/") => {
            parse_id(&p["/admin-client-details/".len()..]).map(AdminOp::ClientDetails)
        }
        _ => Err(AdminError::UnknownRoute(path.to_string())),
    }
}

fn parse_id(raw: &str) -> Result<ClientId, AdminError> {
    raw.parse()
        .map_err(|_| AdminError::InvalidClientId(raw.to_string()))
}

/// Handle an admin request arriving on `client`'s connection.
pub async fn handle<S: FileStore>(router: &Router<S>, client: ClientId, request: &Request) -> Response {
    let result = match parse_op(&request.method, request.route_path()) {
        Ok(op) => execute(router, client, op, request).await,
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(client_id = client, path = %request.path, error = %e, "Admin request rejected");
        e.into_response()
    })
}

async fn execute<S: FileStore>(
    router: &Router<S>,
    client: ClientId,
    op: AdminOp,
    request: &Request,
) -> Result<Response, AdminError> {
    let registry = &router.registry;

    match op {
        AdminOp::Page => Ok(admin_page(router).await),

        AdminOp::Stats => Ok(Response::json(StatusCode::Ok, &registry.stats().await)),

        AdminOp::DisconnectAll => {
            let count = registry.disconnect_all_except(Some(client)).await;
            Ok(Response::json(StatusCode::Ok, &json!({ "disconnected": count })))
        }

        AdminOp::DisconnectClient(id) => {
            if registry.disconnect(id).await {
                Ok(Response::json(
                    StatusCode::Ok,
                    &json!({ "client_id": id, "disconnected": true }),
                ))
            } else {
                Err(AdminError::ClientNotFound(id))
            }
        }

        AdminOp::Broadcast => {
            let body = parse_broadcast_body(request)?;
            let sent = registry.broadcast_except(&body.message, Some(client)).await;
            Ok(Response::json(StatusCode::Ok, &json!({ "sent": sent })))
        }

        AdminOp::ClientDetails(id) => registry
            .get(id)
            .await
            .map(|record| Response::json(StatusCode::Ok, &record))
            .ok_or(AdminError::ClientNotFound(id)),
    }
}

fn parse_broadcast_body(request: &Request) -> Result<BroadcastBody, AdminError> {
    match request.content_length() {
        Some(len) if len > 0 => {}
        _ => return Err(AdminError::MissingBody),
    }

    serde_json::from_slice(&request.body).map_err(|e| AdminError::InvalidBody(e.to_string()))
}

async fn admin_page<S: FileStore>(router: &Router<S>) -> Response {
    let page = &router.admin_page;

    if !router.store.exists(page).await {
        return Response::not_found(page);
    }

    match router.store.read(page).await {
        Ok(body) => Response::ok(content_type_for(page), body).with_connection(ConnectionMode::Close),
        Err(e) => {
            tracing::error!(file = %page, error = %e, "Failed to read admin page");
            Response::internal_error(&e.to_string())
        }
    }
}
