use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Local};
use std::time::Duration;

use crate::shared::format::format_number;

const CYAN: &str = "36";
const BROWN: &str = "33";

/// Одна строка лога запроса:
/// `время | длительность | размер ответа | статус метод путь`.
/// `size = None` означает, что тело ответа не удалось прочитать.
fn format_line(
    time: DateTime<Local>,
    duration: Duration,
    size: Option<usize>,
    status: StatusCode,
    method: &Method,
    path: &str,
) -> String {
    // голубой для 2xx, коричневый для остального
    let color = if status.is_success() && size.is_some() {
        CYAN
    } else {
        BROWN
    };
    let size = size.map(format_number).unwrap_or_else(|| "error".to_string());

    format!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        color,
        time.format("%H:%M:%S"),
        duration.as_millis(),
        size,
        status.as_u16(),
        method.as_str(),
        path
    )
}

/// Middleware для логирования HTTP запросов
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let (body, size) = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            let size = bytes.len();
            (Body::from(bytes), Some(size))
        }
        Err(e) => {
            tracing::warn!("Failed to buffer response body for {}: {}", path, e);
            (Body::default(), None)
        }
    };

    println!(
        "{}",
        format_line(
            Local::now(),
            start.elapsed(),
            size,
            parts.status,
            &method,
            &path
        )
    );

    Response::from_parts(parts, body)
}
