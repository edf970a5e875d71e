use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Срок жизни подписанной ссылки
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Адрес S3-совместимого хранилища (MinIO и т.п.); по умолчанию AWS
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalConfig {
    #[serde(default = "default_local_root")]
    pub root: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    pub signing_secret: Option<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root: default_local_root(),
            public_base_url: default_public_base_url(),
            signing_secret: None,
        }
    }
}

/// Ключи доступа к S3; читаются только из окружения
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

pub const DEFAULT_REGION: &str = "ap-southeast-2";

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_url_ttl_secs() -> u64 {
    3600
}

fn default_local_root() -> String {
    "target/storage".to_string()
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000
static_dir = "dist"
max_upload_bytes = 10485760

[storage]
backend = "s3"
url_ttl_secs = 3600

[storage.s3]
region = "ap-southeast-2"
path_style = false

[storage.local]
root = "target/storage"
public_base_url = "http://127.0.0.1:3000"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// После чтения файла применяются переменные окружения `S3_REGION` и `BUCKET`.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return Ok(toml::from_str(&contents)?);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    Ok(toml::from_str(DEFAULT_CONFIG)?)
}

impl Config {
    /// Переопределения из окружения (как в исходном развёртывании)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("S3_REGION") {
            self.storage.s3.region = Some(region);
        }
        if let Some(bucket) = non_empty("BUCKET") {
            self.storage.s3.bucket = Some(bucket);
        }
    }

    pub fn s3_region(&self) -> String {
        self.storage
            .s3
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn url_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.storage.url_ttl_secs)
    }
}

/// Ключи S3 из переменных `S3_ACCESS_KEY` / `S3_SECRET_KEY`
pub fn s3_credentials_from<F>(lookup: F) -> anyhow::Result<S3Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let access_key = lookup("S3_ACCESS_KEY")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("S3_ACCESS_KEY is not set"))?;
    let secret_key = lookup("S3_SECRET_KEY")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("S3_SECRET_KEY is not set"))?;

    Ok(S3Credentials {
        access_key,
        secret_key,
    })
}

/// Resolve a configured path relative to the executable directory
pub fn resolve_path(path_str: &str) -> PathBuf {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }

    PathBuf::from(path_str)
}
