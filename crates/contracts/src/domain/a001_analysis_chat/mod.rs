//! Чат анализа урожая: сообщения, режимы, разбор ответов сервиса,
//! данные диаграммы, журнал истории и оркестратор.

pub mod chart;
pub mod history;
pub mod message;
pub mod mode;
pub mod response;
pub mod session;

pub use chart::{chart_points, chart_scale, format_amount, ChartPoint};
pub use history::{HistoryBackend, HistoryError, InMemoryHistory, MessageLog, HISTORY_STORAGE_KEY};
pub use message::Message;
pub use mode::{AnalysisMode, ModeProfile};
pub use response::{AnalysisResponse, DecodeError, DiseaseDetection, MarketAnalysis};
pub use session::{AnalyzeRequest, ChatSession, ChatState, PendingRequest, ReceiveOutcome};
