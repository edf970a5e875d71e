//! Analysis Chat - View Model

use super::model::{analyze, upload_and_resolve};
use crate::domain::a001_analysis_chat::storage::LocalStorageHistory;
use contracts::domain::a001_analysis_chat::{AnalysisMode, ChatSession, ReceiveOutcome};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Интервал смены сообщений индикатора загрузки
const STAGE_INTERVAL_MS: u32 = 2000;

#[derive(Clone, Copy)]
pub struct AnalysisChatVm {
    pub session: RwSignal<ChatSession<LocalStorageHistory>>,
    pub input: RwSignal<String>,
    pub error: RwSignal<Option<String>>,
}

impl AnalysisChatVm {
    pub fn new() -> Self {
        let (session, load_error) = ChatSession::start(LocalStorageHistory);
        if let Some(e) = load_error {
            log::error!("Failed to load chat history: {}", e);
        }

        Self {
            session: RwSignal::new(session),
            input: RwSignal::new(String::new()),
            error: RwSignal::new(None),
        }
    }

    fn report_history_error(&self) {
        let mut error = None;
        self.session.update(|s| error = s.take_history_error());
        if let Some(e) = error {
            log::error!("Failed to save chat history: {}", e);
        }
    }

    pub fn set_mode(&self, mode: AnalysisMode) {
        if self.session.with_untracked(|s| s.mode()) != mode {
            self.session.update(|s| s.set_mode(mode));
        }
    }

    pub fn clear_history(&self) {
        let mut result = Ok(());
        self.session.update(|s| result = s.clear_history());
        if let Err(e) = result {
            log::error!("Failed to clear chat history: {}", e);
        }
    }

    /// Выбран файл: загрузить и получить подписанную ссылку
    pub fn upload(&self, file: web_sys::File) {
        let vm = *self;
        self.session.update(|s| s.begin_upload());

        spawn_local(async move {
            let result = upload_and_resolve(file).await;
            if let Err(e) = &result {
                log::error!("Image upload failed: {}", e);
                vm.error.set(Some(format!("Upload failed: {}", e)));
            }
            vm.session.update(|s| s.finish_upload(result));
        });
    }

    /// Отправить ввод в сервис анализа текущего режима
    pub fn send(&self) {
        let vm = *self;
        let text = self.input.get_untracked();

        let mut pending = None;
        self.session.update(|s| {
            s.set_input(text);
            pending = s.send();
        });
        let Some(request) = pending else {
            return;
        };

        self.input.set(String::new());
        self.error.set(None);
        self.report_history_error();
        self.start_stage_ticker(request.seq);

        log::debug!(
            "Request #{} -> {} ({})",
            request.seq,
            request.endpoint,
            request.mode.as_str()
        );

        spawn_local(async move {
            let result = analyze(&request.endpoint, &request.body).await;

            let mut outcome = ReceiveOutcome::Superseded;
            vm.session.update(|s| outcome = s.receive(request.seq, result));

            match outcome {
                ReceiveOutcome::Appended => vm.report_history_error(),
                ReceiveOutcome::Superseded => {
                    log::warn!("Discarded response to superseded request #{}", request.seq)
                }
                ReceiveOutcome::Failed(e) => {
                    log::error!("Error: {}", e);
                    vm.error.set(Some(e));
                }
                ReceiveOutcome::Rejected(e) => {
                    log::error!("Unexpected analysis response: {}", e);
                    vm.error.set(Some(e.to_string()));
                }
            }
        });
    }

    /// Сообщения этапов сменяются, пока запрос `seq` остаётся в полёте
    fn start_stage_ticker(&self, seq: u64) {
        let session = self.session;
        spawn_local(async move {
            loop {
                TimeoutFuture::new(STAGE_INTERVAL_MS).await;
                let waiting = session
                    .try_with_untracked(|s| s.in_flight_seq() == Some(seq))
                    .unwrap_or(false);
                if !waiting {
                    break;
                }
                session.update(|s| s.advance_stage());
            }
        });
    }
}
