use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use contracts::system::storage::{DeleteResponse, KeyQuery, SignedUrlResponse, UploadResponse};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use crate::shared::format::format_size;
use crate::shared::object_storage::{
    generate_key, validate_key, LocalStore, ObjectStore, StorageError,
};

/// Разделяемое неизменяемое состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub url_ttl: Duration,
    /// Заполнено, если объекты хранятся локально и раздаются через `/api/files`
    pub local: Option<Arc<LocalStore>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, url_ttl: Duration) -> Self {
        Self {
            store,
            url_ttl,
            local: None,
        }
    }

    pub fn with_local(local: Arc<LocalStore>, url_ttl: Duration) -> Self {
        Self {
            store: local.clone(),
            url_ttl,
            local: Some(local),
        }
    }
}

fn require_key(query: &KeyQuery) -> Result<&str, ApiError> {
    let key = query.key.as_deref().ok_or(ApiError::MissingKey)?;
    validate_key(key).map_err(|e| {
        tracing::warn!("Rejected storage key {:?}: {}", key, e);
        ApiError::InvalidKey
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Upload rejected: {}", e.body_text());
        ApiError::TooLarge
    } else {
        tracing::error!("Failed to read multipart body: {}", e.body_text());
        ApiError::UploadFailed
    }
}

/// POST /api/upload
///
/// Сохраняет поле `file` под новым уникальным ключом и возвращает ключ.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        let size = data.len();

        let key = generate_key(&file_name);
        state
            .store
            .put(&key, data.to_vec(), content_type.as_deref())
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to upload {} to {} storage: {}",
                    key,
                    state.store.backend_name(),
                    e
                );
                ApiError::UploadFailed
            })?;

        tracing::info!(
            "Uploaded {} ({}, {})",
            key,
            content_type.as_deref().unwrap_or("unknown type"),
            format_size(size)
        );
        return Ok(Json(UploadResponse { key }));
    }

    Err(ApiError::NoFile)
}

/// GET /api/get?key=...
///
/// Подписанная ссылка на чтение объекта, действительная `url_ttl`.
pub async fn get_url(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let key = require_key(&query)?;

    let url = state
        .store
        .presign_get(key, state.url_ttl)
        .await
        .map_err(|e| {
            tracing::error!("Failed to sign URL for {}: {}", key, e);
            ApiError::SignFailed
        })?;

    Ok(Json(SignedUrlResponse { url }))
}

/// DELETE /api/delete?key=...
pub async fn delete_object(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let key = require_key(&query)?;

    state.store.delete(key).await.map_err(|e| {
        tracing::error!("Failed to delete {}: {}", key, e);
        ApiError::DeleteFailed
    })?;

    tracing::info!("Deleted {}", key);
    Ok(Json(DeleteResponse { deleted: true }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignedFileQuery {
    pub expires: Option<String>,
    pub signature: Option<String>,
}

/// GET /api/files/*key?expires=...&signature=...
///
/// Раздача объектов локального хранилища по подписанной ссылке.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<Response, ApiError> {
    let local = state.local.as_ref().ok_or(ApiError::NotFound)?;
    let key = validate_key(&key).map_err(|_| ApiError::InvalidKey)?;

    let expires = query
        .expires
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(ApiError::Forbidden)?;
    let signature = query.signature.as_deref().ok_or(ApiError::Forbidden)?;

    local
        .verify(key, expires, signature, Utc::now())
        .map_err(|_| ApiError::Forbidden)?;

    match local.read(key).await {
        Ok((data, content_type)) => {
            let content_type =
                content_type.unwrap_or_else(|| "application/octet-stream".to_string());
            Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
        }
        Err(StorageError::NotFound(_)) => Err(ApiError::NotFound),
        Err(e) => {
            tracing::error!("Failed to read {}: {}", key, e);
            Err(ApiError::ReadFailed)
        }
    }
}
