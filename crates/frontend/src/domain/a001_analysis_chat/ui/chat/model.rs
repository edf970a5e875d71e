//! Analysis Chat - Model (API functions)

use crate::shared::api_utils::api_url;
use contracts::domain::a001_analysis_chat::AnalyzeRequest;
use contracts::system::storage::{ErrorResponse, SignedUrlResponse, UploadResponse};
use gloo_net::http::{Request, Response};
use serde_json::Value;

/// Текст ошибки backend'а: `{"error": ...}` из тела, если есть
async fn backend_error(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ErrorResponse>().await {
        Ok(body) => format!("HTTP {}: {}", status, body.error),
        Err(_) => format!("HTTP {}", status),
    }
}

/// Загрузить изображение, вернуть ключ объекта
pub async fn upload_image(file: &web_sys::File) -> Result<String, String> {
    let form_data = web_sys::FormData::new().map_err(|e| format!("{e:?}"))?;
    form_data
        .append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| format!("{e:?}"))?;

    let resp = Request::post(&api_url("/api/upload"))
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.ok() {
        return Err(backend_error(resp).await);
    }

    let data: UploadResponse = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;
    Ok(data.key)
}

/// Подписанная ссылка на объект
pub async fn resolve_url(key: &str) -> Result<String, String> {
    let url = api_url(&format!("/api/get?key={}", urlencoding::encode(key)));

    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.ok() {
        return Err(backend_error(resp).await);
    }

    let data: SignedUrlResponse = resp
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;
    Ok(data.url)
}

/// Загрузка с последующим получением ссылки
pub async fn upload_and_resolve(file: web_sys::File) -> Result<String, String> {
    let key = upload_image(&file).await?;
    log::debug!("Uploaded {} as {}", file.name(), key);
    resolve_url(&key).await
}

/// Запрос к внешнему сервису анализа; тело ответа разбирает оркестратор
pub async fn analyze(endpoint: &str, body: &AnalyzeRequest) -> Result<Value, String> {
    let resp = Request::post(endpoint)
        .json(body)
        .map_err(|e| format!("Failed to serialize request: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !resp.ok() {
        return Err(format!("HTTP error! status: {}", resp.status()));
    }

    resp.json::<Value>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))
}
