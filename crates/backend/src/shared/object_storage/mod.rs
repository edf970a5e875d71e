pub mod key;
pub mod local;
pub mod s3;
pub mod sigv4;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use key::{generate_key, validate_key};
pub use local::LocalStore;
pub use s3::S3Store;

/// Ошибки хранилища объектов
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid or expired signature")]
    InvalidSignature,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Request(err.to_string())
    }
}

/// Хранилище загруженных изображений
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Название бэкенда для логов
    fn backend_name(&self) -> &'static str;

    /// Сохранить объект под ключом с типом содержимого клиента
    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Подписанная ссылка на чтение, действительная `ttl`
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Удалить объект; отсутствие объекта не является ошибкой
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
