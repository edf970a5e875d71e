//! Столбчатая диаграмма цен по рынкам (SVG)

use contracts::domain::a001_analysis_chat::{chart_scale, format_amount, ChartPoint};
use leptos::prelude::*;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 260.0;
const LEFT: f64 = 48.0;
const RIGHT: f64 = 12.0;
const TOP: f64 = 12.0;
const BOTTOM: f64 = 36.0;
const TICKS: usize = 4;

fn px(v: f64) -> String {
    format!("{:.1}", v)
}

#[component]
#[allow(non_snake_case)]
pub fn PriceChart(points: Vec<ChartPoint>, unit: String) -> impl IntoView {
    if points.is_empty() {
        return view! {
            <div style="color: var(--colorNeutralForeground3); font-size: 13px;">"No price data"</div>
        }
        .into_any();
    }

    let scale = chart_scale(&points);
    let plot_w = WIDTH - LEFT - RIGHT;
    let plot_h = HEIGHT - TOP - BOTTOM;
    let slot = plot_w / points.len() as f64;
    let bar_w = (slot * 0.6).min(64.0);

    let grid = (0..=TICKS)
        .map(|i| {
            let value = scale * i as f64 / TICKS as f64;
            let y = TOP + plot_h - plot_h * i as f64 / TICKS as f64;
            view! {
                <g>
                    <line
                        x1=px(LEFT)
                        x2=px(WIDTH - RIGHT)
                        y1=px(y)
                        y2=px(y)
                        stroke="#444"
                        stroke-dasharray="3 3"
                    />
                    <text x=px(LEFT - 6.0) y=px(y + 4.0) text-anchor="end" font-size="11" fill="currentColor">
                        {format_amount(value)}
                    </text>
                </g>
            }
        })
        .collect_view();

    let bars = points
        .into_iter()
        .enumerate()
        .map(|(i, point)| {
            let h = (point.price / scale * plot_h).max(0.0);
            let x = LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let label = format!("{} {}", format_amount(point.price), unit);
            view! {
                <g>
                    <rect x=px(x) y=px(TOP + plot_h - h) width=px(bar_w) height=px(h) rx="4" fill="#4ade80" />
                    <text
                        x=px(x + bar_w / 2.0)
                        y=px(TOP + plot_h - h - 4.0)
                        text-anchor="middle"
                        font-size="10"
                        fill="currentColor"
                    >
                        {label}
                    </text>
                    <text
                        x=px(x + bar_w / 2.0)
                        y=px(HEIGHT - BOTTOM + 16.0)
                        text-anchor="middle"
                        font-size="11"
                        fill="currentColor"
                    >
                        {point.market}
                    </text>
                </g>
            }
        })
        .collect_view();

    view! {
        <svg
            viewBox=format!("0 0 {} {}", WIDTH, HEIGHT)
            style="width: 100%; height: auto; background: #2A2A2A; border-radius: 8px;"
            role="img"
        >
            {grid}
            {bars}
        </svg>
    }
    .into_any()
}
