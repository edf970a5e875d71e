use super::response::PriceAnalysis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Точка столбчатой диаграммы цен
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub market: String,
    pub price: f64,
}

/// Одна точка на каждую запись `prices`, в исходном порядке
pub fn chart_points(analysis: &PriceAnalysis) -> Vec<ChartPoint> {
    analysis
        .prices
        .iter()
        .map(|(market, price)| ChartPoint {
            market: market.clone(),
            price: coerce_price(price),
        })
        .collect()
}

/// Привести цену к числу.
///
/// Пустые значения (`null`, `false`, `0`, `""`) дают 0, строки разбираются
/// после обрезки пробелов, всё нечисловое тоже даёт 0.
/// Отрицательная цена считается нулевой (столбец не может уйти вниз).
pub fn coerce_price(value: &Value) -> f64 {
    let price = match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    price.max(0.0)
}

/// Верхняя граница оси Y: максимум, округлённый вверх до 1, 2, 2.5 или 5 × 10^n
pub fn chart_scale(points: &[ChartPoint]) -> f64 {
    let max = points
        .iter()
        .map(|p| p.price)
        .fold(0.0_f64, f64::max);

    if max <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(max.log10().floor());
    let normalized = max / magnitude;
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|s| normalized <= *s)
        .unwrap_or(10.0);

    step * magnitude
}

/// Число для подписи: целые без дробной части, иначе до двух знаков
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
