//! Tests for request routing (resource and admin paths)

use filehost::config::StaticFilesConfig;
use filehost::files::{FileStore, MemoryStore};
use filehost::http::parser::Frame;
use filehost::http::request::{Method, Request, RequestBuilder};
use filehost::http::response::{ConnectionMode, Response, StatusCode};
use filehost::http::writer::ResponseWriter;
use filehost::registry::{ClientId, ClientRegistry};
use filehost::router::admin::{AdminError, AdminOp, parse_op};
use filehost::router::{Route, Router, classify};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::DuplexStream;

struct Harness {
    router: Router<MemoryStore>,
    registry: Arc<ClientRegistry>,
    peers: Vec<DuplexStream>,
}

impl Harness {
    fn new(store: MemoryStore) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let router = Router::new(
            Arc::clone(&registry),
            Arc::new(store),
            &StaticFilesConfig::default(),
        );
        Self {
            router,
            registry,
            peers: Vec::new(),
        }
    }

    async fn client(&mut self) -> ClientId {
        let (peer, server) = tokio::io::duplex(64 * 1024);
        self.peers.push(peer);
        let addr = SocketAddr::from(([127, 0, 0, 1], 4000 + self.peers.len() as u16));
        let (id, _) = self
            .registry
            .add(Arc::new(ResponseWriter::new(server)), addr)
            .await;
        id
    }

    async fn send(&self, client: ClientId, request: Request) -> Response {
        self.router.dispatch(client, Frame::Request(request)).await
    }
}

fn get(path: &str) -> Request {
    RequestBuilder::new().method(Method::GET).path(path).build().unwrap()
}

fn post(path: &str, body: &[u8]) -> Request {
    let builder = RequestBuilder::new().method(Method::POST).path(path);
    let builder = if body.is_empty() {
        builder
    } else {
        builder.body(body.to_vec())
    };
    builder.build().unwrap()
}

fn body_json(response: &Response) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
}

fn site() -> MemoryStore {
    MemoryStore::new()
        .with_file("index.html", "Hi!!!")
        .with_file("prueba.txt", "plain text")
        .with_file("img/logo.png", vec![0x89, b'P', b'N', b'G'])
        .with_file("data.bin", vec![1, 2, 3])
        .with_file("admin.html", "<h1>admin</h1>")
}

#[test]
fn test_classify() {
    assert_eq!(classify("/admin"), Route::Admin);
    assert_eq!(classify("/admin-stats"), Route::Admin);
    assert_eq!(classify("/admin-anything"), Route::Admin);
    assert_eq!(classify("/administrator.html"), Route::Resource);
    assert_eq!(classify("/index.html"), Route::Resource);
    assert_eq!(classify("/"), Route::Resource);
}

#[test]
fn test_parse_admin_ops() {
    assert_eq!(parse_op(&Method::GET, "/admin"), Ok(AdminOp::Page));
    assert_eq!(parse_op(&Method::GET, "/admin-stats"), Ok(AdminOp::Stats));
    assert_eq!(
        parse_op(&Method::POST, "/admin-disconnect-all"),
        Ok(AdminOp::DisconnectAll)
    );
    assert_eq!(
        parse_op(&Method::POST, "/admin-disconnect-client/12"),
        Ok(AdminOp::DisconnectClient(12))
    );
    assert_eq!(
        parse_op(&Method::GET, "/admin-client-details/3"),
        Ok(AdminOp::ClientDetails(3))
    );
    assert_eq!(parse_op(&Method::POST, "/admin-broadcast"), Ok(AdminOp::Broadcast));
}

#[test]
fn test_parse_admin_op_errors() {
    assert_eq!(
        parse_op(&Method::POST, "/admin-disconnect-client/abc"),
        Err(AdminError::InvalidClientId("abc".to_string()))
    );
    assert_eq!(
        parse_op(&Method::GET, "/admin-client-details/"),
        Err(AdminError::InvalidClientId(String::new()))
    );
    assert!(matches!(
        parse_op(&Method::GET, "/admin-nope"),
        Err(AdminError::UnknownRoute(_))
    ));
    assert!(matches!(
        parse_op(&Method::GET, "/admin-broadcast"),
        Err(AdminError::UnknownRoute(_))
    ));
}

#[tokio::test]
async fn test_get_index_file() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let response = h.send(client, get("/index.html")).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert_eq!(response.body, b"Hi!!!".to_vec());
    assert_eq!(response.connection, ConnectionMode::KeepAlive);
}

#[tokio::test]
async fn test_root_serves_index() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let response = h.send(client, get("/")).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Hi!!!".to_vec());
}

#[tokio::test]
async fn test_content_types_by_extension() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let txt = h.send(client, get("/prueba.txt")).await;
    let png = h.send(client, get("/img/logo.png")).await;
    let bin = h.send(client, get("/data.bin")).await;

    assert_eq!(txt.content_type, "text/plain; charset=utf-8");
    assert_eq!(png.content_type, "image/png");
    assert_eq!(png.content_length(), 4);
    assert_eq!(bin.content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_query_string_ignored_for_lookup() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let response = h.send(client, get("/prueba.txt?download=1")).await;

    assert_eq!(response.status, StatusCode::Ok);
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let response = h.send(client, get("/missing.html")).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.connection, ConnectionMode::Close);
    assert!(String::from_utf8_lossy(&response.body).contains("missing.html"));
}

#[tokio::test]
async fn test_path_traversal_is_404() {
    let store = site().with_file("../secret.txt", "nope");
    let mut h = Harness::new(store);
    let client = h.client().await;

    let response = h.send(client, get("/../secret.txt")).await;

    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_non_get_is_501() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    for method in [Method::POST, Method::PUT, Method::DELETE, Method::Other("BREW".into())] {
        let request = RequestBuilder::new()
            .method(method)
            .path("/index.html")
            .version("HTTP/9.9")
            .build()
            .unwrap();

        let response = h.send(client, request).await;

        assert_eq!(response.status, StatusCode::NotImplemented);
        assert_eq!(response.connection, ConnectionMode::Close);
    }
}

#[tokio::test]
async fn test_unsupported_version_is_505() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/index.html")
        .version("HTTP/2.0")
        .build()
        .unwrap();
    let response = h.send(client, request).await;

    assert_eq!(response.status, StatusCode::HttpVersionNotSupported);
    assert_eq!(response.connection, ConnectionMode::Close);
}

#[tokio::test]
async fn test_http10_is_supported() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/index.html")
        .version("HTTP/1.0")
        .build()
        .unwrap();

    assert_eq!(h.send(client, request).await.status, StatusCode::Ok);
}

#[tokio::test]
async fn test_malformed_frame_is_400() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let frame = Frame::Malformed {
        start_line: "GET".to_string(),
    };
    let response = h.router.dispatch(client, frame).await;

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.connection, ConnectionMode::Close);
}

#[tokio::test]
async fn test_client_connection_close_is_honoured() {
    let mut h = Harness::new(site());
    let client = h.client().await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/index.html")
        .header("Connection", "close")
        .build()
        .unwrap();
    let response = h.send(client, request).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.connection, ConnectionMode::Close);
}

#[tokio::test]
async fn test_admin_stats_counts_clients() {
    let mut h = Harness::new(site());
    let first = h.client().await;
    h.client().await;

    let response = h.send(first, get("/admin-stats")).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(response.connection, ConnectionMode::KeepAlive);
    let json = body_json(&response);
    assert_eq!(json["total_clients"], 2);
    assert_eq!(json["connected_clients"], 2);
}

#[tokio::test]
async fn test_admin_disconnect_all_spares_requester() {
    let mut h = Harness::new(site());
    let admin = h.client().await;
    h.client().await;
    h.client().await;

    let response = h.send(admin, post("/admin-disconnect-all", b"")).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(body_json(&response)["disconnected"], 2);
    assert!(h.registry.get(admin).await.unwrap().connected);
}

#[tokio::test]
async fn test_admin_disconnect_client() {
    let mut h = Harness::new(site());
    let admin = h.client().await;
    let target = h.client().await;

    let first = h
        .send(admin, post(&format!("/admin-disconnect-client/{}", target), b""))
        .await;
    let second = h
        .send(admin, post(&format!("/admin-disconnect-client/{}", target), b""))
        .await;

    assert_eq!(first.status, StatusCode::Ok);
    assert_eq!(body_json(&first)["client_id"], target);
    assert_eq!(second.status, StatusCode::NotFound);
    assert_eq!(second.connection, ConnectionMode::KeepAlive);
    assert!(!h.registry.get(target).await.unwrap().connected);
}

#[tokio::test]
async fn test_admin_bad_client_id_is_400() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let response = h.send(admin, post("/admin-disconnect-client/xyz", b"")).await;

    assert_eq!(response.status, StatusCode::BadRequest);
}

#[tokio::test]
async fn test_admin_client_details() {
    let mut h = Harness::new(site());
    let admin = h.client().await;
    let other = h.client().await;

    let found = h
        .send(admin, get(&format!("/admin-client-details/{}", other)))
        .await;
    let missing = h.send(admin, get("/admin-client-details/999")).await;

    assert_eq!(found.status, StatusCode::Ok);
    let json = body_json(&found);
    assert_eq!(json["client_id"], other);
    assert_eq!(json["name"], format!("client-{}", other));
    assert_eq!(missing.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_admin_broadcast() {
    let mut h = Harness::new(site());
    let admin = h.client().await;
    h.client().await;
    h.client().await;

    let response = h
        .send(admin, post("/admin-broadcast", br#"{"message": "hello all"}"#))
        .await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(body_json(&response)["sent"], 2);
}

#[tokio::test]
async fn test_admin_broadcast_without_body_is_400_close() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let response = h.send(admin, post("/admin-broadcast", b"")).await;

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.connection, ConnectionMode::Close);
}

#[tokio::test]
async fn test_admin_broadcast_bad_json_is_400() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let bad_json = h.send(admin, post("/admin-broadcast", b"{not json")).await;
    let wrong_shape = h.send(admin, post("/admin-broadcast", br#"{"msg": "x"}"#)).await;

    assert_eq!(bad_json.status, StatusCode::BadRequest);
    assert_eq!(wrong_shape.status, StatusCode::BadRequest);
}

#[tokio::test]
async fn test_admin_unknown_route_is_404_keep_alive() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let response = h.send(admin, get("/admin-unknown")).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.connection, ConnectionMode::KeepAlive);
}

#[tokio::test]
async fn test_admin_page_closes_connection() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let response = h.send(admin, get("/admin")).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert_eq!(response.connection, ConnectionMode::Close);
}

#[tokio::test]
async fn test_admin_page_missing_is_404() {
    let mut h = Harness::new(MemoryStore::new());
    let admin = h.client().await;

    let response = h.send(admin, get("/admin")).await;

    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_admin_unsupported_method_is_501() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    for (method, path) in [(Method::PUT, "/admin-stats"), (Method::DELETE, "/admin")] {
        let request = RequestBuilder::new().method(method).path(path).build().unwrap();

        let response = h.send(admin, request).await;

        assert_eq!(response.status, StatusCode::NotImplemented);
        assert_eq!(response.connection, ConnectionMode::Close);
    }
}

#[tokio::test]
async fn test_admin_unsupported_version_is_505() {
    let mut h = Harness::new(site());
    let admin = h.client().await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/admin-stats")
        .version("HTTP/2.0")
        .build()
        .unwrap();
    let response = h.send(admin, request).await;

    assert_eq!(response.status, StatusCode::HttpVersionNotSupported);
    assert_eq!(response.connection, ConnectionMode::Close);
}

/// Every file exists but none can be read.
struct UnreadableStore;

impl FileStore for UnreadableStore {
    async fn exists(&self, _path: &str) -> bool {
        true
    }

    async fn read(&self, _path: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk unreadable"))
    }
}

fn unreadable_router() -> Router<UnreadableStore> {
    Router::new(
        Arc::new(ClientRegistry::new()),
        Arc::new(UnreadableStore),
        &StaticFilesConfig::default(),
    )
}

#[tokio::test]
async fn test_read_failure_is_500_with_description() {
    let router = unreadable_router();

    let response = router.dispatch(1, Frame::Request(get("/index.html"))).await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.connection, ConnectionMode::Close);
    assert_eq!(
        String::from_utf8(response.body).unwrap(),
        "Internal server error: disk unreadable"
    );
}

#[tokio::test]
async fn test_admin_page_read_failure_is_500() {
    let router = unreadable_router();

    let response = router.dispatch(1, Frame::Request(get("/admin"))).await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.connection, ConnectionMode::Close);
    assert!(String::from_utf8_lossy(&response.body).contains("disk unreadable"));
}
