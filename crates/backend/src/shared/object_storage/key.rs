use chrono::Utc;
use uuid::Uuid;

use super::StorageError;

/// Максимальная длина ключа объекта (ограничение S3)
pub const MAX_KEY_LEN: usize = 1024;

/// Сколько байт имени файла попадает в ключ; с суффиксом ключ остаётся
/// допустимым и для S3, и как имя файла локального хранилища (255 байт)
const MAX_NAME_LEN: usize = 128;

/// Новый уникальный ключ: `<имя без пробелов>-<unix millis>-<uuid v4>`
pub fn generate_key(file_name: &str) -> String {
    generate_key_at(file_name, Utc::now().timestamp_millis(), Uuid::new_v4())
}

pub fn generate_key_at(file_name: &str, millis: i64, id: Uuid) -> String {
    format!("{}-{}-{}", sanitize_file_name(file_name), millis, id)
}

/// Имя файла клиента без пробельных и управляющих символов.
/// Разделители пути заменяются на `_`, чтобы ключ оставался плоским;
/// длинные имена обрезаются до `MAX_NAME_LEN` байт по границе символа.
fn sanitize_file_name(file_name: &str) -> String {
    let mut name: String = file_name
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if name.len() > MAX_NAME_LEN {
        let cut = (0..=MAX_NAME_LEN)
            .rev()
            .find(|i| name.is_char_boundary(*i))
            .unwrap_or(0);
        name.truncate(cut);
    }

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        name
    }
}

/// Проверка ключа, пришедшего от клиента
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    let reason = if key.is_empty() {
        Some("empty key")
    } else if key.len() > MAX_KEY_LEN {
        Some("key is too long")
    } else if key.chars().any(char::is_control) {
        Some("control characters")
    } else if key.starts_with('/') || key.starts_with('\\') {
        Some("leading slash")
    } else if key.split(['/', '\\']).any(|segment| segment == "..") {
        Some("parent directory segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageError::InvalidKey(reason.to_string())),
        None => Ok(key),
    }
}
