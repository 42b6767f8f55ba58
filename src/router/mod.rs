//! Request routing
//!
//! Every framed request lands here. Targets under `/admin` go to the admin
//! handler; everything else is a static resource lookup.

pub mod admin;
pub mod resource;

use std::sync::Arc;

use crate::config::StaticFilesConfig;
use crate::files::FileStore;
use crate::http::parser::Frame;
use crate::http::request::{Method, Request};
use crate::http::response::{ConnectionMode, Response};
use crate::registry::{ClientId, ClientRegistry};

pub const SUPPORTED_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Admin,
    Resource,
}

/// Classify a request target.
///
/// `/admin` itself and anything starting with `/admin-` is administrative.
pub fn classify(path: &str) -> Route {
    if path == "/admin" || path.starts_with("/admin-") {
        Route::Admin
    } else {
        Route::Resource
    }
}

/// Turns framed requests into responses.
pub struct Router<S> {
    registry: Arc<ClientRegistry>,
    store: Arc<S>,
    index_file: String,
    admin_page: String,
}

impl<S: FileStore> Router<S> {
    pub fn new(registry: Arc<ClientRegistry>, store: Arc<S>, files: &StaticFilesConfig) -> Self {
        Self {
            registry,
            store,
            index_file: files.index.clone(),
            admin_page: files.admin_page.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Build the response for one frame received on `client`'s connection.
    pub async fn dispatch(&self, client: ClientId, frame: Frame) -> Response {
        let request = match frame {
            Frame::Request(request) => request,
            Frame::Malformed { start_line } => {
                tracing::warn!(client_id = client, start_line = %start_line, "Malformed request line");
                return Response::bad_request("Malformed request");
            }
        };

        let route = classify(request.route_path());
        let response = match check_protocol(route, &request) {
            Some(rejected) => rejected,
            None => match route {
                Route::Admin => admin::handle(self, client, &request).await,
                Route::Resource => resource::handle(self, &request).await,
            },
        };

        tracing::info!(
            client_id = client,
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            "Request handled"
        );

        honour_client_close(&request, response)
    }
}

/// Method first, then version. Files are GET only; admin takes GET and POST.
fn check_protocol(route: Route, request: &Request) -> Option<Response> {
    let method_served = match route {
        Route::Admin => matches!(request.method, Method::GET | Method::POST),
        Route::Resource => request.method == Method::GET,
    };

    if !method_served {
        return Some(Response::not_implemented(request.method.as_str()));
    }

    if !SUPPORTED_VERSIONS.contains(&request.version.as_str()) {
        return Some(Response::version_not_supported(&request.version));
    }

    None
}

/// A client that asked for `Connection: close` gets it.
fn honour_client_close(request: &Request, response: Response) -> Response {
    if request.keep_alive() {
        response
    } else {
        response.with_connection(ConnectionMode::Close)
    }
}
