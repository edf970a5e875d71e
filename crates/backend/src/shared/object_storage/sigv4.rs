//! Подпись запросов к S3 (AWS Signature Version 4) через `aws-sigv4`.
//!
//! Запросы отправляет reqwest; здесь только вычисляются заголовки
//! (PUT/DELETE) или query-параметры presigned URL (GET).

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest,
    SignatureLocation, SigningParams, SigningSettings, UriPathNormalizationMode,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use std::time::{Duration, SystemTime};

use super::StorageError;
use crate::shared::config::S3Credentials;

const SERVICE: &str = "s3";

/// Что нужно добавить к запросу после подписи
#[derive(Debug, Clone, Default)]
pub struct SignedParts {
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
}

impl SignedParts {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query-строка presigned URL
    pub fn query(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn signing_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Signing(err.to_string())
}

pub struct Signer {
    identity: Identity,
    region: String,
}

impl Signer {
    pub fn new(credentials: &S3Credentials, region: impl Into<String>) -> Self {
        let credentials = Credentials::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            None,
            None,
            "environment",
        );
        Self {
            identity: credentials.into(),
            region: region.into(),
        }
    }

    // S3 подписывает путь как есть: без повторного кодирования и нормализации
    fn s3_settings() -> SigningSettings {
        let mut settings = SigningSettings::default();
        settings.percent_encoding_mode = PercentEncodingMode::Single;
        settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;
        settings
    }

    fn sign(
        &self,
        request: SignableRequest<'_>,
        settings: SigningSettings,
        time: SystemTime,
    ) -> Result<SignedParts, StorageError> {
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&self.identity)
            .region(&self.region)
            .name(SERVICE)
            .time(time)
            .settings(settings)
            .build()
            .map_err(signing_error)?
            .into();

        let (instructions, _signature) = sign(request, &params)
            .map_err(signing_error)?
            .into_parts();

        Ok(SignedParts {
            headers: instructions
                .headers()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            params: instructions
                .params()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Presigned URL: подписан только `host`, тело не подписывается.
    /// `url` должен содержать уже закодированный путь.
    pub fn presign(
        &self,
        method: &str,
        url: &str,
        expires_in: Duration,
        time: SystemTime,
    ) -> Result<SignedParts, StorageError> {
        let mut settings = Self::s3_settings();
        settings.signature_location = SignatureLocation::QueryParams;
        settings.expires_in = Some(expires_in);

        let request = SignableRequest::new(
            method,
            url,
            std::iter::empty(),
            SignableBody::UnsignedPayload,
        )
        .map_err(signing_error)?;

        self.sign(request, settings, time)
    }

    /// Подпись заголовком `Authorization`; добавляются также
    /// `x-amz-date` и `x-amz-content-sha256`.
    pub fn sign_headers(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
        time: SystemTime,
    ) -> Result<SignedParts, StorageError> {
        let mut settings = Self::s3_settings();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let request = SignableRequest::new(
            method,
            url,
            headers.iter().copied(),
            SignableBody::Bytes(body),
        )
        .map_err(signing_error)?;

        self.sign(request, settings, time)
    }
}
