use serde::{Deserialize, Serialize};

/// Ответ `POST /api/upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub key: String,
}

/// Ответ `GET /api/get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUrlResponse {
    pub url: String,
}

/// Ответ `DELETE /api/delete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Тело ответа с ошибкой (4xx/5xx)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Параметры запроса по ключу объекта (`?key=...`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}
