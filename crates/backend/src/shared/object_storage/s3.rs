use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use std::time::{Duration, SystemTime};

use super::sigv4::{SignedParts, Signer};
use super::{validate_key, ObjectStore, StorageError};
use crate::shared::config::S3Credentials;

/// Максимальный срок действия presigned URL в S3 (7 дней)
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 3600;

/// Адрес объекта в бакете
#[derive(Debug, Clone, PartialEq, Eq)]
struct ObjectLocation {
    scheme: String,
    host: String,
    path: String,
}

impl ObjectLocation {
    fn url(&self, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("{}://{}{}?{}", self.scheme, self.host, self.path, q),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }
}

/// Кодирование ключа для пути URL; `/` остаётся разделителем
fn encode_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn with_signed_headers(mut request: RequestBuilder, signed: &SignedParts) -> RequestBuilder {
    for (name, value) in &signed.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

/// Клиент S3 (или S3-совместимого хранилища) поверх reqwest
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    signer: Signer,
    endpoint: Option<Url>,
    path_style: bool,
}

impl S3Store {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: S3Credentials,
        endpoint: Option<&str>,
        path_style: bool,
    ) -> Result<Self, StorageError> {
        let endpoint = endpoint
            .map(|e| {
                Url::parse(e).map_err(|err| StorageError::Request(format!("bad endpoint {}: {}", e, err)))
            })
            .transpose()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(StorageError::from)?;

        let region = region.into();
        let signer = Signer::new(&credentials, region.clone());

        Ok(Self {
            client,
            bucket: bucket.into(),
            region,
            signer,
            endpoint,
            path_style,
        })
    }

    fn locate(&self, key: &str) -> Result<ObjectLocation, StorageError> {
        let key = encode_path(validate_key(key)?);

        let (scheme, base_host) = match &self.endpoint {
            Some(url) => {
                let host = url
                    .host_str()
                    .ok_or_else(|| StorageError::Request("endpoint has no host".to_string()))?;
                let host = match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                (url.scheme().to_string(), host)
            }
            None => (
                "https".to_string(),
                format!("s3.{}.amazonaws.com", self.region),
            ),
        };

        Ok(if self.path_style {
            ObjectLocation {
                scheme,
                host: base_host,
                path: format!("/{}/{}", urlencoding::encode(&self.bucket), key),
            }
        } else {
            ObjectLocation {
                scheme,
                host: format!("{}.{}", self.bucket, base_host),
                path: format!("/{}", key),
            }
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let url = self.locate(key)?.url(None);
        let content_type = content_type.unwrap_or("application/octet-stream");

        let signed = self.signer.sign_headers(
            "PUT",
            &url,
            &[("content-type", content_type)],
            &body,
            SystemTime::now(),
        )?;

        tracing::debug!("S3 PUT {} ({} bytes)", url, body.len());

        let request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .body(body);
        let response = with_signed_headers(request, &signed).send().await?;

        Self::check_status(response).await
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let location = self.locate(key)?;
        let expires = Duration::from_secs(ttl.as_secs().clamp(1, MAX_PRESIGN_SECS));

        let signed = self
            .signer
            .presign("GET", &location.url(None), expires, SystemTime::now())?;

        Ok(location.url(Some(&signed.query())))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let url = self.locate(key)?.url(None);

        let signed = self
            .signer
            .sign_headers("DELETE", &url, &[], b"", SystemTime::now())?;

        tracing::debug!("S3 DELETE {}", url);

        let response = with_signed_headers(self.client.delete(&url), &signed)
            .send()
            .await?;

        Self::check_status(response).await
    }
}
