//! Analysis Chat UI Module (MVVM Standard)
//!
//! Structure:
//! - model.rs: API functions (upload, signed URL, analysis service)
//! - view_model.rs: AnalysisChatVm over the `ChatSession` orchestrator
//! - view.rs: Main component AnalysisChat

mod model;
mod view;
mod view_model;

pub use view::AnalysisChat;
