use crate::domain::a001_analysis_chat::ui::chat::AnalysisChat;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    view! { <AnalysisChat /> }
}
