use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{validate_key, ObjectStore, StorageError};

type HmacSha256 = Hmac<Sha256>;

/// Маршрут, по которому backend раздаёт объекты локального хранилища
pub const FILES_ROUTE: &str = "/api/files";

/// Метаданные объекта (sidecar JSON рядом с файлом)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMeta {
    pub content_type: Option<String>,
    pub size: usize,
    pub created_at: DateTime<Utc>,
}

/// Файловое хранилище: `<root>/objects/<key>` и `<root>/meta/<key>.json`.
/// Ссылки подписываются HMAC-SHA256 от `"{key}\n{expires}"`.
pub struct LocalStore {
    root: PathBuf,
    public_base_url: String,
    secret: Vec<u8>,
}

impl LocalStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: &str,
        secret: impl AsRef<[u8]>,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(root.join("objects"))?;
        std::fs::create_dir_all(root.join("meta"))?;

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            secret: secret.as_ref().to_vec(),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join("objects").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.json", key))
    }

    fn mac(&self, key: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(format!("{}\n{}", key, expires).as_bytes());
        Ok(mac)
    }

    /// Подпись ссылки на объект, действительной до `expires` (unix seconds)
    pub fn sign(&self, key: &str, expires: i64) -> Result<String, StorageError> {
        Ok(hex::encode(self.mac(key, expires)?.finalize().into_bytes()))
    }

    /// Проверка подписи и срока действия ссылки
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if expires < now.timestamp() {
            return Err(StorageError::InvalidSignature);
        }
        let expected = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
        self.mac(key, expires)?
            .verify_slice(&expected)
            .map_err(|_| StorageError::InvalidSignature)
    }

    pub fn signed_url(&self, key: &str, expires: i64) -> Result<String, StorageError> {
        Ok(format!(
            "{}{}/{}?expires={}&signature={}",
            self.public_base_url,
            FILES_ROUTE,
            urlencoding::encode(key),
            expires,
            self.sign(key, expires)?
        ))
    }

    /// Содержимое объекта и его тип
    pub async fn read(&self, key: &str) -> Result<(Vec<u8>, Option<String>), StorageError> {
        let key = validate_key(key)?;

        let data = match tokio::fs::read(self.object_path(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => match serde_json::from_slice::<StoredMeta>(&raw) {
                Ok(meta) => meta.content_type,
                Err(e) => {
                    tracing::warn!("Corrupt metadata for {}: {}", key, e);
                    None
                }
            },
            Err(_) => None,
        };

        Ok((data, content_type))
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let key = validate_key(key)?;

        let meta = StoredMeta {
            content_type: content_type.map(str::to_string),
            size: body.len(),
            created_at: Utc::now(),
        };
        let meta_json =
            serde_json::to_vec(&meta).map_err(|e| StorageError::Request(e.to_string()))?;

        write_file(&self.object_path(key), &body).await?;
        write_file(&self.meta_path(key), &meta_json).await?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let key = validate_key(key)?;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        self.signed_url(key, expires)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = validate_key(key)?;
        remove_if_exists(&self.object_path(key)).await?;
        remove_if_exists(&self.meta_path(key)).await?;
        Ok(())
    }
}
