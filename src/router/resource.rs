//! Static resource requests.

use std::path::{Component, Path};

use crate::files::FileStore;
use crate::http::mime::content_type_for;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::router::Router;

/// Serve a file for a GET the router has already accepted.
pub async fn handle<S: FileStore>(router: &Router<S>, request: &Request) -> Response {
    let Some(filename) = resolve_filename(request.route_path(), &router.index_file) else {
        tracing::warn!(path = %request.path, "Rejected path outside served root");
        return Response::not_found(request.route_path().trim_start_matches('/'));
    };

    if !router.store.exists(&filename).await {
        return Response::not_found(&filename);
    }

    match router.store.read(&filename).await {
        Ok(body) => Response::ok(content_type_for(&filename), body),
        Err(e) => {
            tracing::error!(file = %filename, error = %e, "Failed to read file");
            Response::internal_error(&e.to_string())
        }
    }
}

/// Map a request path to a filename relative to the served root.
///
/// `/` maps to `index`. Returns `None` for anything that could leave the
/// root: `..` segments, absolute paths, drive prefixes, or an empty name.
pub fn resolve_filename(path: &str, index: &str) -> Option<String> {
    if path == "/" {
        return Some(index.to_string());
    }

    let relative = path.strip_prefix('/').unwrap_or(path);
    if relative.is_empty() || relative.contains('\\') {
        return None;
    }

    let escapes = Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }

    Some(relative.to_string())
}
