//! Оркестратор чата: состояние ввода, загрузки изображения и запросов к
//! сервису анализа.
//!
//! Сетевые вызовы выполняет вызывающая сторона: `send` выдаёт
//! [`PendingRequest`], результат возвращается через `receive`. Каждый запрос
//! получает возрастающий номер; принимается только ответ на последний
//! отправленный запрос, остальные отбрасываются (last-sent-wins).

use super::history::{HistoryBackend, HistoryError, MessageLog};
use super::message::Message;
use super::mode::AnalysisMode;
use super::response::{AnalysisResponse, DecodeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Тело запроса к сервису анализа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub prompt: String,
    /// Пустая строка, если изображение не прикреплено
    pub image_url: String,
}

/// Запрос, который нужно выполнить вызывающей стороне
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub seq: u64,
    pub mode: AnalysisMode,
    pub endpoint: String,
    pub body: AnalyzeRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingUpload,
    AwaitingResponse,
}

/// Итог обработки ответа
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveOutcome {
    /// Ответ разобран и добавлен в историю
    Appended,
    /// Ответ на устаревший запрос, отброшен
    Superseded,
    /// Ошибка транспорта, история не изменилась
    Failed(String),
    /// Ответ не прошёл разбор, история не изменилась
    Rejected(DecodeError),
}

#[derive(Debug, Clone)]
pub struct ChatSession<B: HistoryBackend> {
    log: MessageLog<B>,
    input: String,
    mode: AnalysisMode,
    image_url: Option<String>,
    uploading: bool,
    last_seq: u64,
    in_flight: Option<(u64, AnalysisMode)>,
    stage: usize,
    history_error: Option<HistoryError>,
}

impl<B: HistoryBackend> ChatSession<B> {
    /// Новая сессия в режиме по умолчанию с историей из хранилища.
    /// Повреждённая история не мешает старту: сессия начинается пустой,
    /// ошибка возвращается для логирования.
    pub fn start(backend: B) -> (Self, Option<HistoryError>) {
        let mut log = MessageLog::new(backend);
        let load_error = log.load().err();
        let session = Self {
            log,
            input: String::new(),
            mode: AnalysisMode::default(),
            image_url: None,
            uploading: false,
            last_seq: 0,
            in_flight: None,
            stage: 0,
            history_error: None,
        };
        (session, load_error)
    }

    pub fn state(&self) -> ChatState {
        if self.in_flight.is_some() {
            ChatState::AwaitingResponse
        } else if self.uploading {
            ChatState::AwaitingUpload
        } else {
            ChatState::Idle
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Смена режима не трогает историю и запрос в полёте
    pub fn set_mode(&mut self, mode: AnalysisMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Выбран файл: прежнее изображение сбрасывается
    pub fn begin_upload(&mut self) {
        self.image_url = None;
        self.uploading = true;
    }

    /// Загрузка завершена; при ошибке изображения нет
    pub fn finish_upload(&mut self, result: Result<String, String>) {
        self.uploading = false;
        self.image_url = result.ok();
    }

    /// Отправить текущий ввод.
    ///
    /// Пустой ввод (или только пробелы) ничего не делает и не порождает запрос.
    /// Пока идёт загрузка изображения, отправка тоже не выполняется: ввод
    /// сохраняется до завершения загрузки.
    /// Ошибка сохранения истории не мешает отправке, см. `take_history_error`.
    pub fn send(&mut self) -> Option<PendingRequest> {
        if self.uploading || self.input.trim().is_empty() {
            return None;
        }

        let prompt = std::mem::take(&mut self.input);
        let image_url = self.image_url.take();

        self.last_seq += 1;
        let seq = self.last_seq;
        self.in_flight = Some((seq, self.mode));
        self.stage = 0;

        let request = PendingRequest {
            seq,
            mode: self.mode,
            endpoint: self.mode.endpoint(),
            body: AnalyzeRequest {
                prompt: prompt.clone(),
                image_url: image_url.clone().unwrap_or_default(),
            },
        };

        self.persist(Message::user(prompt, image_url));
        Some(request)
    }

    /// Обработать ответ на запрос `seq`
    pub fn receive(&mut self, seq: u64, result: Result<Value, String>) -> ReceiveOutcome {
        let mode = match self.in_flight {
            Some((current, mode)) if current == seq => mode,
            _ => return ReceiveOutcome::Superseded,
        };

        self.in_flight = None;
        self.stage = 0;

        let value = match result {
            Ok(value) => value,
            Err(e) => return ReceiveOutcome::Failed(e),
        };

        let content = match AnalysisResponse::decode(&value) {
            Ok(content) => content,
            Err(e) => return ReceiveOutcome::Rejected(e),
        };

        self.persist(Message::assistant(content, mode));
        ReceiveOutcome::Appended
    }

    fn persist(&mut self, message: Message) {
        if let Err(e) = self.log.append(message) {
            self.history_error = Some(e);
        }
    }

    /// Последняя ошибка сохранения истории (сообщение в памяти всё равно добавлено)
    pub fn take_history_error(&mut self) -> Option<HistoryError> {
        self.history_error.take()
    }

    /// Следующий этап индикатора загрузки; останавливается на последнем
    pub fn advance_stage(&mut self) {
        if let Some((_, mode)) = self.in_flight {
            let last = mode.profile().stage_messages.len().saturating_sub(1);
            self.stage = (self.stage + 1).min(last);
        }
    }

    /// Сообщения этапов, видимые сейчас
    pub fn visible_stages(&self) -> &'static [&'static str] {
        match self.in_flight {
            Some((_, mode)) => mode.stages_until(self.stage),
            None => &[],
        }
    }

    /// Режим запроса в полёте (для подписи индикатора)
    pub fn in_flight_mode(&self) -> Option<AnalysisMode> {
        self.in_flight.map(|(_, mode)| mode)
    }

    /// Номер запроса в полёте
    pub fn in_flight_seq(&self) -> Option<u64> {
        self.in_flight.map(|(seq, _)| seq)
    }

    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.log.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_analysis_chat::history::InMemoryHistory;
    use crate::domain::a001_analysis_chat::response::tests::{disease_json, market_json};
    use serde_json::json;

    fn new_session() -> ChatSession<InMemoryHistory> {
        let (session, err) = ChatSession::start(InMemoryHistory::new());
        assert!(err.is_none());
        session
    }

    #[test]
    fn test_blank_input_sends_nothing() {
        let mut session = new_session();
        for input in ["", "   ", "\n\t "] {
            session.set_input(input);
            assert_eq!(session.send(), None);
        }
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn test_send_appends_user_message_and_builds_request() {
        let mut session = new_session();
        session.begin_upload();
        assert_eq!(session.state(), ChatState::AwaitingUpload);
        session.finish_upload(Ok("https://bucket/leaf.jpg?sig".into()));
        assert_eq!(session.state(), ChatState::Idle);

        session.set_input("what is wrong with my tomato?");
        let request = session.send().expect("request");

        assert_eq!(request.seq, 1);
        assert_eq!(request.mode, AnalysisMode::Market);
        assert_eq!(request.endpoint, AnalysisMode::Market.endpoint());
        assert_eq!(
            request.body,
            AnalyzeRequest {
                prompt: "what is wrong with my tomato?".into(),
                image_url: "https://bucket/leaf.jpg?sig".into(),
            }
        );

        assert_eq!(session.input(), "");
        assert_eq!(session.image_url(), None);
        assert_eq!(session.messages().len(), 1);
        assert!(session.messages()[0].is_user());
        assert_eq!(session.state(), ChatState::AwaitingResponse);
    }

    #[test]
    fn test_send_without_image_posts_empty_url() {
        let mut session = new_session();
        session.set_input("potato prices");
        let request = session.send().unwrap();
        assert_eq!(request.body.image_url, "");

        let body = serde_json::to_value(&request.body).unwrap();
        assert_eq!(body, json!({"prompt": "potato prices", "image_url": ""}));
    }

    #[test]
    fn test_response_appended_and_idle() {
        let mut session = new_session();
        session.set_input("potato prices");
        let request = session.send().unwrap();

        let outcome = session.receive(request.seq, Ok(market_json()));
        assert_eq!(outcome, ReceiveOutcome::Appended);
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.messages().len(), 2);
        match &session.messages()[1] {
            Message::Assistant { content, mode } => {
                assert!(content.is_market());
                assert_eq!(*mode, Some(AnalysisMode::Market));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_failure_leaves_history_unchanged() {
        let mut session = new_session();
        session.set_input("hello");
        let request = session.send().unwrap();

        let outcome = session.receive(request.seq, Err("HTTP error! status: 502".into()));
        assert_eq!(outcome, ReceiveOutcome::Failed("HTTP error! status: 502".into()));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn test_undecodable_response_is_rejected() {
        let mut session = new_session();
        session.set_input("hello");
        let request = session.send().unwrap();

        let outcome = session.receive(request.seq, Ok(json!({"detail": "Internal error"})));
        assert!(matches!(outcome, ReceiveOutcome::Rejected(DecodeError::Disease(_))));
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_last_sent_wins() {
        let mut session = new_session();
        session.set_input("first");
        let first = session.send().unwrap();
        session.set_input("second");
        let second = session.send().unwrap();
        assert!(second.seq > first.seq);

        // второй ответ приходит раньше первого
        assert_eq!(
            session.receive(second.seq, Ok(disease_json())),
            ReceiveOutcome::Appended
        );
        assert_eq!(
            session.receive(first.seq, Ok(market_json())),
            ReceiveOutcome::Superseded
        );

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert!(matches!(
            &messages[2],
            Message::Assistant { content: AnalysisResponse::DiseaseDetection(_), .. }
        ));
    }

    #[test]
    fn test_stale_response_ignored_while_newer_in_flight() {
        let mut session = new_session();
        session.set_input("first");
        let first = session.send().unwrap();
        session.set_input("second");
        let second = session.send().unwrap();

        assert_eq!(
            session.receive(first.seq, Ok(market_json())),
            ReceiveOutcome::Superseded
        );
        assert_eq!(session.state(), ChatState::AwaitingResponse);
        assert_eq!(session.in_flight_seq(), Some(second.seq));
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_mode_toggle_only_affects_next_send() {
        let mut session = new_session();
        session.set_input("potato prices");
        let market = session.send().unwrap();
        let before = session.messages().to_vec();

        session.toggle_mode();
        assert_eq!(session.mode(), AnalysisMode::DiseaseDetection);
        assert_eq!(session.messages(), before.as_slice());

        // ответ на запрос, отправленный до переключения, помечен старым режимом
        session.receive(market.seq, Ok(market_json()));
        assert_eq!(session.messages()[1].author_label(), "Market AI");

        session.set_input("spots on leaves");
        let disease = session.send().unwrap();
        assert_eq!(disease.endpoint, AnalysisMode::DiseaseDetection.endpoint());
        assert_eq!(disease.mode, AnalysisMode::DiseaseDetection);
    }

    #[test]
    fn test_send_waits_for_pending_upload() {
        let mut session = new_session();
        session.begin_upload();
        session.set_input("what disease is this?");

        assert_eq!(session.send(), None);
        assert_eq!(session.input(), "what disease is this?");
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), ChatState::AwaitingUpload);

        session.finish_upload(Ok("https://bucket/leaf.jpg?sig".into()));
        let request = session.send().unwrap();
        assert_eq!(request.body.prompt, "what disease is this?");
        assert_eq!(request.body.image_url, "https://bucket/leaf.jpg?sig");
        assert_eq!(session.image_url(), None);
    }

    #[test]
    fn test_set_mode_selects_endpoint() {
        let mut session = new_session();
        session.set_mode(AnalysisMode::DiseaseDetection);
        session.set_mode(AnalysisMode::DiseaseDetection);
        assert_eq!(session.mode(), AnalysisMode::DiseaseDetection);

        session.set_input("spots on leaves");
        let request = session.send().unwrap();
        assert_eq!(request.endpoint, AnalysisMode::DiseaseDetection.endpoint());

        session.set_mode(AnalysisMode::Market);
        assert_eq!(session.in_flight_mode(), Some(AnalysisMode::DiseaseDetection));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_failed_upload_returns_to_idle() {
        let mut session = new_session();
        session.begin_upload();
        session.finish_upload(Err("Upload failed".into()));
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.image_url(), None);
    }

    #[test]
    fn test_new_upload_clears_previous_image() {
        let mut session = new_session();
        session.begin_upload();
        session.finish_upload(Ok("https://a".into()));
        session.begin_upload();
        assert_eq!(session.image_url(), None);
    }

    #[test]
    fn test_stage_ticker() {
        let mut session = new_session();
        assert!(session.visible_stages().is_empty());
        session.advance_stage();
        assert!(session.visible_stages().is_empty());

        session.set_input("potato prices");
        let request = session.send().unwrap();
        assert_eq!(session.visible_stages(), &["Analyzing..."]);
        for _ in 0..10 {
            session.advance_stage();
        }
        assert_eq!(session.visible_stages().len(), 5);

        session.receive(request.seq, Err("boom".into()));
        assert!(session.visible_stages().is_empty());
    }

    #[test]
    fn test_session_restores_history() {
        let backend = InMemoryHistory::new();
        {
            let (mut session, _) = ChatSession::start(backend.clone());
            session.set_input("one");
            let r = session.send().unwrap();
            session.receive(r.seq, Ok(disease_json()));
            session.set_input("two");
            session.send().unwrap();
        }

        let (restored, err) = ChatSession::start(backend);
        assert!(err.is_none());
        assert_eq!(restored.messages().len(), 3);
        assert_eq!(restored.messages()[0], Message::user("one", None));
        assert_eq!(restored.messages()[2], Message::user("two", None));
        assert_eq!(restored.mode(), AnalysisMode::Market);
        assert_eq!(restored.state(), ChatState::Idle);
    }

    #[test]
    fn test_corrupt_history_starts_empty() {
        let (session, err) = ChatSession::start(InMemoryHistory::with_raw("[{\"type\":"));
        assert!(matches!(err, Some(HistoryError::Corrupt(_))));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_clear_history() {
        let mut session = new_session();
        session.set_input("one");
        session.send().unwrap();
        session.clear_history().unwrap();
        assert!(session.messages().is_empty());
    }
}
