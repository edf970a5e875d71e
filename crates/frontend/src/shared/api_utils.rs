//! Адрес backend'а для запросов фронтенда

/// Base URL of the backend
///
/// Same host as the page, port 3000 (where the axum server listens).
/// Empty string if window is not available.
pub fn api_base() -> String {
    let Some(window) = web_sys::window() else {
        return String::new();
    };
    let location = window.location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let hostname = location
        .hostname()
        .unwrap_or_else(|_| "127.0.0.1".to_string());
    format!("{}//{}:3000", protocol, hostname)
}

/// Full backend URL for a path like `/api/upload`
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}
