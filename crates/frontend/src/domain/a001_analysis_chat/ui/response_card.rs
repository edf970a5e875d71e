//! Карточка ответа сервиса анализа: вид выбирается по варианту ответа

use super::price_chart::PriceChart;
use contracts::domain::a001_analysis_chat::response::or_placeholder;
use contracts::domain::a001_analysis_chat::{
    chart_points, format_amount, AnalysisResponse, DiseaseDetection, MarketAnalysis,
};
use leptos::prelude::*;
use thaw::*;

const CARD_STYLE: &str = "background: #1E1E1E; color: #fff; padding: 20px; border-radius: 12px; max-width: 900px; display: flex; flex-direction: column; gap: 18px;";
const HEADING_STYLE: &str = "font-size: 16px; font-weight: bold; margin-bottom: 6px;";

#[component]
#[allow(non_snake_case)]
fn InfoRow(label: &'static str, value: String) -> impl IntoView {
    view! {
        <div style="font-size: 14px; line-height: 1.6;">
            <strong>{label}": "</strong>
            {value}
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
pub fn ResponseCard(response: AnalysisResponse) -> impl IntoView {
    match response {
        AnalysisResponse::DiseaseDetection(d) => view! { <DiseasePanel data=d /> }.into_any(),
        AnalysisResponse::Market(m) => view! { <MarketPanel data=m /> }.into_any(),
    }
}

#[component]
#[allow(non_snake_case)]
fn DiseasePanel(data: DiseaseDetection) -> impl IntoView {
    let crop = data.crop_detection;
    let disease = data.disease_detection;

    view! {
        <div style=CARD_STYLE>
            <div>
                <div style=format!("{} color: #4ade80;", HEADING_STYLE)>"🌱 Crop Information"</div>
                <InfoRow label="Crop" value=crop.crop_name />
                <InfoRow label="Variety" value=or_placeholder(crop.variety.as_deref(), "Not specified") />
                <InfoRow label="Growth Stage" value=crop.growth_stage />
            </div>

            <div>
                <div style=format!("{} color: #f87171;", HEADING_STYLE)>"🦠 Disease Detection"</div>
                <InfoRow label="Disease" value=disease.primary_condition />
                <InfoRow label="Affected Parts" value=disease.affected_parts.join(", ") />
                <InfoRow label="Severity" value=disease.severity />
                <InfoRow label="Symptoms" value=disease.visible_symptoms.join(", ") />
                <InfoRow label="Type" value=disease.disease_type />
            </div>

            <div>
                <div style=format!("{} color: #60a5fa;", HEADING_STYLE)>"📊 Confidence"</div>
                <div>{format!("{}%", format_amount(data.confidence_score))}</div>
            </div>

            <div>
                <div style=format!("{} color: #c084fc;", HEADING_STYLE)>"🏷️ Keywords"</div>
                <div>{data.agricultural_keywords.join(", ")}</div>
            </div>

            {data.image_url.map(|url| {
                view! {
                    <div>
                        <div style=format!("{} color: #facc15;", HEADING_STYLE)>"🖼️ Image"</div>
                        <img src=url alt="Crop" style="border-radius: 8px; width: 100%; max-width: 400px;" />
                    </div>
                }
            })}
        </div>
    }
}

#[component]
#[allow(non_snake_case)]
fn MarketPanel(data: MarketAnalysis) -> impl IntoView {
    let crop = data.crop_info;
    let prices = data.price_analysis;
    let points = chart_points(&prices);
    let unit = prices.normalized_unit.clone();

    let listings = prices
        .original_listings
        .into_iter()
        .map(|(market, items)| {
            view! {
                <div style="margin-top: 8px;">
                    <div style="font-weight: 600;">{market}</div>
                    <ul style="margin: 4px 0 0 20px; font-size: 13px;">
                        {items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}
                    </ul>
                </div>
            }
        })
        .collect_view();

    view! {
        <div style=CARD_STYLE>
            {data.image_url.map(|url| {
                view! { <img src=url alt="Crop" style="width: 160px; height: 160px; object-fit: cover; border-radius: 8px;" /> }
            })}

            <div>
                <div style=format!("{} color: #4ade80;", HEADING_STYLE)>"🌱 Crop Information"</div>
                <InfoRow label="Crop" value=crop.crop_details.crop_name />
                <InfoRow label="Variety" value=or_placeholder(crop.crop_details.variety.as_deref(), "N/A") />
                <InfoRow label="Growth Stage" value=or_placeholder(crop.crop_details.growth_stage.as_deref(), "N/A") />
                <InfoRow label="Health" value=crop.health_condition />
                <InfoRow label="Confidence" value=format!("{}%", format_amount(crop.confidence)) />
                <div style="margin-top: 6px; display: flex; gap: 6px; flex-wrap: wrap; align-items: center;">
                    <strong style="font-size: 14px;">"Keywords:"</strong>
                    {crop
                        .keywords
                        .into_iter()
                        .map(|k| {
                            view! {
                                <Badge appearance=BadgeAppearance::Tint color=BadgeColor::Success>
                                    {k}
                                </Badge>
                            }
                        })
                        .collect_view()}
                </div>
            </div>

            <div>
                <div style=format!("{} color: #60a5fa;", HEADING_STYLE)>"💰 Price Analysis"</div>
                <div style="font-size: 13px; margin-bottom: 8px;">{format!("Unit: {}", unit)}</div>
                <PriceChart points=points unit=unit.clone() />

                <div style="margin-top: 12px;">
                    <div style="font-weight: 600; color: #c084fc;">"🛒 Market Listings"</div>
                    {listings}
                </div>

                {prices.notes.filter(|n| !n.trim().is_empty()).map(|notes| {
                    view! {
                        <div style="margin-top: 12px; color: #facc15; font-size: 13px; font-style: italic;">
                            {format!("⚠ {}", notes)}
                        </div>
                    }
                })}
            </div>
        </div>
    }
}
