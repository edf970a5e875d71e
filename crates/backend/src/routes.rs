use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::handlers::storage::{self, AppState};
use crate::shared::config::{resolve_path, ServerConfig};
use crate::system::middleware::request_logger::request_logger;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // OBJECT STORAGE
        // ========================================
        .route(
            "/api/upload",
            post(storage::upload).layer(DefaultBodyLimit::max(server.max_upload_bytes)),
        )
        .route("/api/get", get(storage::get_url))
        .route("/api/delete", delete(storage::delete_object));

    // Раздача локального хранилища по подписанным ссылкам
    if state.local.is_some() {
        router = router.route("/api/files/*key", get(storage::serve_file));
    }

    router
        .with_state(state)
        .fallback_service(ServeDir::new(resolve_path(&server.static_dir)))
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::object_storage::{LocalStore, ObjectStore, StorageError};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "cropmind-test-boundary";
    const TTL: Duration = Duration::from_secs(3600);

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn put(&self, _: &str, _: Vec<u8>, _: Option<&str>) -> Result<(), StorageError> {
            Err(StorageError::Request("connection refused".to_string()))
        }

        async fn presign_get(&self, _: &str, _: Duration) -> Result<String, StorageError> {
            Err(StorageError::Signing("no credentials".to_string()))
        }

        async fn delete(&self, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Request("connection refused".to_string()))
        }
    }

    fn server_config() -> ServerConfig {
        ServerConfig {
            max_upload_bytes: 1024,
            static_dir: "does-not-exist".to_string(),
            ..ServerConfig::default()
        }
    }

    fn local_app(dir: &tempfile::TempDir) -> Router {
        let local = Arc::new(LocalStore::new(dir.path(), "http://localhost", "secret").unwrap());
        configure_routes(AppState::with_local(local, TTL), &server_config())
    }

    fn failing_app() -> Router {
        configure_routes(AppState::new(Arc::new(FailingStore), TTL), &server_config())
    }

    fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, file_name, data)))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn upload_key(app: &Router, data: &[u8]) -> String {
        let response = app
            .clone()
            .oneshot(upload_request("file", "leaf photo.png", data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json(response).await["key"].as_str().unwrap().to_string()
    }

    async fn signed_url(app: &Router, key: &str) -> String {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/get?key={}", urlencoding::encode(key))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json(response).await["url"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = failing_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"ok");
    }

    #[tokio::test]
    async fn test_upload_resolve_and_serve() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);

        let key = upload_key(&app, b"png-bytes").await;
        assert!(key.starts_with("leafphoto.png-"));

        let url = signed_url(&app, &key).await;
        let path = url.strip_prefix("http://localhost").unwrap();

        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert_eq!(body_bytes(response).await, b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_with_very_long_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let local = Arc::new(LocalStore::new(dir.path(), "http://localhost", "secret").unwrap());
        let server = ServerConfig {
            max_upload_bytes: 16 * 1024,
            ..server_config()
        };
        let app = configure_routes(AppState::with_local(local, TTL), &server);

        let file_name = format!("{}.png", "leaf".repeat(400));
        let response = app
            .clone()
            .oneshot(upload_request("file", &file_name, b"png-bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let key = json(response).await["key"].as_str().unwrap().to_string();
        assert!(key.len() < 255);
        signed_url(&app, &key).await;
    }

    #[tokio::test]
    async fn test_uploads_of_same_file_get_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);

        let first = upload_key(&app, b"same").await;
        let second = upload_key(&app, b"same").await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_signed_url_expires_after_configured_window() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);
        let key = upload_key(&app, b"png").await;

        let before = chrono::Utc::now().timestamp();
        let url = signed_url(&app, &key).await;
        let expires: i64 = reqwest::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "expires")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap();

        let window = expires - before;
        assert!((3600..=3601).contains(&window), "window was {window}");
    }

    #[tokio::test]
    async fn test_tampered_signature_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);
        let key = upload_key(&app, b"png").await;

        let response = app
            .clone()
            .oneshot(get(&format!(
                "/api/files/{}?expires=9999999999&signature=00",
                key
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(get(&format!("/api/files/{}", key)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_then_serve_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);
        let key = upload_key(&app, b"png").await;
        let url = signed_url(&app, &key).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/delete?key={}", key))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["deleted"], true);

        let path = url.strip_prefix("http://localhost").unwrap();
        let response = app.oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_keys() {
        let app = failing_app();

        let response = app.clone().oneshot(get("/api/get")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Missing key");

        for bad in ["", "%2Fetc%2Fpasswd", "a%2F..%2Fb", "leaf%00.png"] {
            let response = app
                .clone()
                .oneshot(get(&format!("/api/get?key={}", bad)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "key {bad:?}");
            assert_eq!(json(response).await["error"], "Invalid key");
        }
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);

        let response = app
            .oneshot(upload_request("image", "leaf.png", b"png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = local_app(&dir);

        let response = app
            .oneshot(upload_request("file", "big.png", &[0u8; 4096]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_storage_failures_are_generic_500s() {
        let app = failing_app();

        let response = app
            .clone()
            .oneshot(upload_request("file", "leaf.png", b"png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["error"], "Upload failed");

        let response = app.oneshot(get("/api/get?key=leaf.png")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["error"], "Failed to get URL");
    }

    #[tokio::test]
    async fn test_files_route_without_local_store() {
        let response = failing_app()
            .oneshot(get("/api/files/leaf.png?expires=1&signature=00"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
