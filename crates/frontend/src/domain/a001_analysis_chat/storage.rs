//! История чата в localStorage браузера (ключ `chatMessages`)

use contracts::domain::a001_analysis_chat::history::{decode_history, encode_history};
use contracts::domain::a001_analysis_chat::{
    HistoryBackend, HistoryError, Message, HISTORY_STORAGE_KEY,
};
use web_sys::window;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageHistory;

fn get_local_storage() -> Result<web_sys::Storage, HistoryError> {
    window()
        .ok_or_else(|| HistoryError::Unavailable("no window".to_string()))?
        .local_storage()
        .map_err(|e| HistoryError::Unavailable(format!("{e:?}")))?
        .ok_or_else(|| HistoryError::Unavailable("localStorage is disabled".to_string()))
}

impl HistoryBackend for LocalStorageHistory {
    fn load(&self) -> Result<Vec<Message>, HistoryError> {
        let raw = get_local_storage()?
            .get_item(HISTORY_STORAGE_KEY)
            .map_err(|e| HistoryError::Unavailable(format!("{e:?}")))?;

        match raw {
            Some(raw) => decode_history(&raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, messages: &[Message]) -> Result<(), HistoryError> {
        let encoded = encode_history(messages)?;
        get_local_storage()?
            .set_item(HISTORY_STORAGE_KEY, &encoded)
            .map_err(|e| HistoryError::Unavailable(format!("{e:?}")))
    }
}
