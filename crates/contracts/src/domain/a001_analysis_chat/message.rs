use super::mode::AnalysisMode;
use super::response::AnalysisResponse;
use serde::{Deserialize, Serialize};

/// Сообщение истории чата.
///
/// В JSON: `{"type": "user", "text": ...}` или `{"type": "assistant", "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    User {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
    },
    Assistant {
        content: AnalysisResponse,
        /// Режим запроса, на который пришёл ответ
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<AnalysisMode>,
    },
}

impl Message {
    /// Создать сообщение пользователя
    pub fn user(text: impl Into<String>, image_url: Option<String>) -> Self {
        Message::User {
            text: text.into(),
            image_url,
        }
    }

    /// Создать сообщение ассистента
    pub fn assistant(content: AnalysisResponse, mode: AnalysisMode) -> Self {
        Message::Assistant {
            content,
            mode: Some(mode),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }

    /// Режим, от имени которого отвечает ассистент: сохранённый режим
    /// запроса, для старой истории без него по форме ответа
    pub fn answer_mode(&self) -> Option<AnalysisMode> {
        match self {
            Message::User { .. } => None,
            Message::Assistant { mode, content } => Some(mode.unwrap_or(if content.is_market() {
                AnalysisMode::Market
            } else {
                AnalysisMode::DiseaseDetection
            })),
        }
    }

    /// Подпись автора для аватара
    pub fn author_label(&self) -> &'static str {
        match self.answer_mode() {
            None => "You",
            Some(mode) => mode.profile().assistant_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_analysis_chat::response::tests::{disease_json, market_json};
    use serde_json::json;

    #[test]
    fn test_user_message_wire_shape() {
        let msg = Message::user("price of potato?", None);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"type": "user", "text": "price of potato?"}));
    }

    #[test]
    fn test_assistant_message_wire_shape() {
        let content = AnalysisResponse::decode(&disease_json()).unwrap();
        let msg = Message::assistant(content, AnalysisMode::DiseaseDetection);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "assistant");
        assert_eq!(value["mode"], "disease_detection");
        assert_eq!(value["content"]["crop_detection"]["crop_name"], "Tomato");
    }

    #[test]
    fn test_assistant_without_mode_labels_by_content() {
        let value = json!({"type": "assistant", "content": market_json()});
        let msg: Message = serde_json::from_value(value).unwrap();
        assert_eq!(msg.author_label(), "Market AI");

        let value = json!({"type": "assistant", "content": disease_json()});
        let msg: Message = serde_json::from_value(value).unwrap();
        assert_eq!(msg.author_label(), "Disease AI");
    }

    #[test]
    fn test_answer_mode_follows_request_mode() {
        let content = AnalysisResponse::decode(&disease_json()).unwrap();
        let msg = Message::assistant(content, AnalysisMode::Market);
        assert_eq!(msg.answer_mode(), Some(AnalysisMode::Market));
        assert_eq!(msg.author_label(), "Market AI");

        assert_eq!(Message::user("hi", None).answer_mode(), None);
        assert_eq!(Message::user("hi", None).author_label(), "You");
    }

    #[test]
    fn test_assistant_with_broken_content_is_rejected() {
        let value = json!({"type": "assistant", "content": {"crop_detection": {}}});
        assert!(serde_json::from_value::<Message>(value).is_err());
    }
}
