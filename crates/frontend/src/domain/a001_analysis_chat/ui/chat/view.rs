//! Analysis Chat - View Component

use super::view_model::AnalysisChatVm;
use crate::domain::a001_analysis_chat::ui::response_card::ResponseCard;
use crate::shared::icons::icon;
use contracts::domain::a001_analysis_chat::{AnalysisMode, Message};
use leptos::prelude::*;
use thaw::*;

const USER_COLOR: &str = "#60a5fa";
const MARKET_COLOR: &str = "#4ade80";
const DISEASE_COLOR: &str = "#f87171";

fn mode_color(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Market => MARKET_COLOR,
        AnalysisMode::DiseaseDetection => DISEASE_COLOR,
    }
}

fn avatar(emoji: &'static str) -> impl IntoView {
    view! {
        <div style="width: 32px; height: 32px; border-radius: 50%; background: #2A2A2A; display: flex; align-items: center; justify-content: center; flex-shrink: 0; box-shadow: 0 0 0 2px #fff;">
            {emoji}
        </div>
    }
}

/// Одно сообщение истории
fn message_row(msg: Message) -> impl IntoView {
    let label = msg.author_label();
    let (emoji, color) = match msg.answer_mode() {
        None => ("🧑", USER_COLOR),
        Some(mode) => ("🤖", mode_color(mode)),
    };

    let body = match msg {
        Message::User { text, image_url } => view! {
            <div style="margin-top: 6px; font-size: 14px; line-height: 1.6; white-space: pre-line;">
                {text}
            </div>
            {image_url.map(|url| {
                view! {
                    <img src=url alt="attachment" style="margin-top: 8px; max-width: 200px; border-radius: 12px;" />
                }
            })}
        }
        .into_any(),
        Message::Assistant { content, .. } => view! {
            <div style="margin-top: 6px;">
                <ResponseCard response=content />
            </div>
        }
        .into_any(),
    };

    view! {
        <div style="display: flex; align-items: flex-start; gap: 8px; margin-bottom: 24px;">
            {avatar(emoji)}
            <div style="min-width: 0;">
                <div style=format!("font-weight: 600; color: {};", color)>{label}</div>
                {body}
            </div>
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn AnalysisChat() -> impl IntoView {
    let vm = AnalysisChatVm::new();
    let messages_container_ref = NodeRef::<leptos::html::Div>::new();
    let file_input_ref = NodeRef::<leptos::html::Input>::new();

    let mode = Memo::new(move |_| vm.session.with(|s| s.mode()));

    // Прокрутка вниз при новых сообщениях и этапах загрузки
    Effect::new(move |_| {
        let _ = vm
            .session
            .with(|s| (s.messages().len(), s.visible_stages().len()));
        if let Some(container) = messages_container_ref.get() {
            request_animation_frame(move || {
                container.set_scroll_top(container.scroll_height());
            });
        }
    });

    view! {
        <div style="height: 100vh; display: flex; flex-direction: column; align-items: center; background: #121212; color: #fff; font-family: system-ui, sans-serif;">
            // Header: переключатель режима
            <div style="width: 100%; max-width: 960px; padding: 16px 20px 0; display: flex; flex-direction: column; align-items: center; gap: 8px;">
                <Flex justify=FlexJustify::SpaceBetween align=FlexAlign::Center style="width: 100%;">
                    <h1 style="font-size: 20px; font-weight: bold;">"🌾 CropMind"</h1>
                    <Flex style="gap: 8px; background: #1E1E1E; padding: 4px; border-radius: 999px;">
                        {AnalysisMode::ALL
                            .into_iter()
                            .map(|m| {
                                let profile = m.profile();
                                view! {
                                    <Button
                                        appearance=Signal::derive(move || {
                                            if mode.get() == m {
                                                ButtonAppearance::Primary
                                            } else {
                                                ButtonAppearance::Subtle
                                            }
                                        })
                                        on_click=move |_| vm.set_mode(m)
                                    >
                                        {format!("{} {}", profile.icon, profile.title)}
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </Flex>
                    <Button
                        appearance=ButtonAppearance::Secondary
                        disabled=Signal::derive(move || vm.session.with(|s| s.messages().is_empty()))
                        on_click=move |_| vm.clear_history()
                    >
                        {icon("trash")}
                        " Clear"
                    </Button>
                </Flex>
                <p style="font-size: 12px; color: #9ca3af; text-align: center; max-width: 480px;">
                    {move || mode.get().profile().description}
                </p>
            </div>

            // Error display
            {move || {
                vm.error
                    .get()
                    .map(|e| {
                        view! {
                            <div style="width: 100%; max-width: 960px; margin-top: 12px; padding: 10px 14px; background: rgba(248, 113, 113, 0.12); border: 1px solid #f87171; border-radius: 8px; display: flex; justify-content: space-between; align-items: center;">
                                <span style="color: #f87171; font-size: 13px;">{e}</span>
                                <button
                                    style="background: none; border: none; cursor: pointer; color: #f87171;"
                                    on:click=move |_| vm.error.set(None)
                                >
                                    {icon("close")}
                                </button>
                            </div>
                        }
                    })
            }}

            // Messages area
            <div
                node_ref=messages_container_ref
                style="flex: 1; width: 100%; max-width: 960px; overflow-y: auto; padding: 20px; margin-top: 12px;"
            >
                <For
                    each=move || {
                        vm.session
                            .with(|s| s.messages().iter().cloned().enumerate().collect::<Vec<_>>())
                    }
                    key=|(idx, _)| *idx
                    children=move |(_, msg)| message_row(msg)
                />

                // Индикатор загрузки с этапами
                {move || {
                    let (stages, in_flight) = vm
                        .session
                        .with(|s| (s.visible_stages(), s.in_flight_mode()));
                    in_flight
                        .map(|m| {
                            view! {
                                <div style="display: flex; align-items: flex-start; gap: 8px; margin-bottom: 24px;">
                                    {avatar("🤖")}
                                    <div style=format!("font-weight: 600; color: {};", mode_color(m))>
                                        <div>{m.profile().assistant_label}</div>
                                        {stages
                                            .iter()
                                            .map(|stage| view! { <p style="margin-top: 4px;">{*stage}</p> })
                                            .collect_view()}
                                    </div>
                                </div>
                            }
                        })
                }}
            </div>

            // Загрузка изображения / превью
            {move || {
                let (uploading, image) = vm
                    .session
                    .with(|s| (s.is_uploading(), s.image_url().map(str::to_string)));
                if uploading {
                    Some(
                        view! {
                            <div style="width: 100%; max-width: 760px; margin: 8px 0; display: flex; align-items: center; gap: 8px;">
                                <Spinner />
                                <span>"Uploading image..."</span>
                            </div>
                        }
                        .into_any(),
                    )
                } else {
                    image.map(|url| {
                        view! {
                            <div style="width: 100%; max-width: 760px; margin: 8px 0;">
                                <img src=url alt="image" width="200" style="border-radius: 12px;" />
                            </div>
                        }
                        .into_any()
                    })
                }
            }}

            // Input area
            <div style="width: 100%; max-width: 760px; margin-bottom: 20px; display: flex; align-items: flex-end; gap: 8px; background: #2A2A2A; border-radius: 16px; padding: 8px 12px;">
                <input
                    type="file"
                    accept="image/*"
                    style="display: none;"
                    node_ref=file_input_ref
                    on:change=move |ev| {
                        let input: web_sys::HtmlInputElement = event_target(&ev);
                        if let Some(file) = input.files().and_then(|files| files.get(0)) {
                            vm.upload(file);
                        }
                        // Clear input
                        input.set_value("");
                    }
                />

                <div style="flex: 1;">
                    <Textarea
                        value=vm.input
                        placeholder=Signal::derive(move || Some(mode.get().profile().placeholder.to_string()))
                        attr:style="width: 100%; min-height: 44px; max-height: 160px; resize: none;"
                        on:keydown=move |ev: web_sys::KeyboardEvent| {
                            if ev.key() == "Enter" && !ev.shift_key() {
                                ev.prevent_default();
                                vm.send();
                            }
                        }
                    />
                </div>

                <Button
                    appearance=ButtonAppearance::Secondary
                    disabled=Signal::derive(move || vm.session.with(|s| s.is_uploading()))
                    on_click=move |_| {
                        if let Some(input) = file_input_ref.get() {
                            input.click();
                        }
                    }
                >
                    {icon("attach")}
                </Button>

                <Button
                    appearance=ButtonAppearance::Primary
                    disabled=Signal::derive(move || vm.session.with(|s| s.is_uploading()))
                    on_click=move |_| vm.send()
                >
                    {icon("send")}
                </Button>
            </div>
        </div>
    }
}
