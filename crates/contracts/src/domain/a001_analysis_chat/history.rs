//! История сообщений: append-only журнал поверх подключаемого хранилища.

use super::message::Message;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Ключ, под которым история хранится в браузере
pub const HISTORY_STORAGE_KEY: &str = "chatMessages";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("history storage is unavailable: {0}")]
    Unavailable(String),

    #[error("stored history is corrupt: {0}")]
    Corrupt(String),
}

/// Хранилище истории: всегда читает и пишет всю последовательность целиком
pub trait HistoryBackend {
    fn load(&self) -> Result<Vec<Message>, HistoryError>;
    fn save(&self, messages: &[Message]) -> Result<(), HistoryError>;
}

/// Сериализация истории в строку хранилища
pub fn encode_history(messages: &[Message]) -> Result<String, HistoryError> {
    serde_json::to_string(messages).map_err(|e| HistoryError::Corrupt(e.to_string()))
}

/// Разбор строки хранилища; пустая строка считается пустой историей
pub fn decode_history(raw: &str) -> Result<Vec<Message>, HistoryError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| HistoryError::Corrupt(e.to_string()))
}

/// Хранилище в памяти. Держит JSON-строку, как localStorage,
/// клоны разделяют одно содержимое.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    raw: Arc<Mutex<Option<String>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Хранилище с заранее записанной строкой
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }
}

impl HistoryBackend for InMemoryHistory {
    fn load(&self) -> Result<Vec<Message>, HistoryError> {
        let guard = self
            .raw
            .lock()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        match guard.as_deref() {
            Some(raw) => decode_history(raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, messages: &[Message]) -> Result<(), HistoryError> {
        let encoded = encode_history(messages)?;
        let mut guard = self
            .raw
            .lock()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }
}

/// Журнал сообщений, которым владеет оркестратор чата
#[derive(Debug, Clone)]
pub struct MessageLog<B: HistoryBackend> {
    backend: B,
    messages: Vec<Message>,
}

impl<B: HistoryBackend> MessageLog<B> {
    /// Пустой журнал; содержимое хранилища не читается до `load`
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            messages: Vec::new(),
        }
    }

    /// Загрузить историю из хранилища (один раз при старте сессии).
    /// При ошибке журнал остаётся пустым.
    pub fn load(&mut self) -> Result<&[Message], HistoryError> {
        self.messages = Vec::new();
        self.messages = self.backend.load()?;
        Ok(&self.messages)
    }

    /// Добавить сообщение и сохранить всю последовательность
    pub fn append(&mut self, message: Message) -> Result<(), HistoryError> {
        self.messages.push(message);
        self.backend.save(&self.messages)
    }

    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.messages.clear();
        self.backend.save(&self.messages)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
