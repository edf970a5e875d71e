//! Ответ внешнего сервиса анализа.
//!
//! Сервис возвращает произвольный JSON двух известных форм: анализ рынка
//! (`"type": "market"`) и диагностика болезни (всё остальное). Разбор идёт
//! через [`AnalysisResponse::decode`], который отказывает с [`DecodeError`]
//! вместо того, чтобы пропускать неполные данные в отрисовку.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Значение поля `type` для ответа анализа рынка
pub const MARKET_TYPE: &str = "market";

/// Ошибки разбора ответа сервиса анализа
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("invalid market analysis: {0}")]
    Market(String),

    #[error("invalid disease detection: {0}")]
    Disease(String),
}

/// Разобранный ответ сервиса
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResponse {
    Market(MarketAnalysis),
    DiseaseDetection(DiseaseDetection),
}

impl AnalysisResponse {
    /// Разобрать JSON ответа сервиса.
    ///
    /// Ответ может прийти в конверте `{"data": {...}}`, тогда разбирается
    /// вложенный объект; `type` берётся из него или из самого конверта.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let (payload, kind) = unwrap_envelope(value)?;

        if kind == Some(MARKET_TYPE) {
            MarketAnalysis::deserialize(payload)
                .map(AnalysisResponse::Market)
                .map_err(|e| DecodeError::Market(e.to_string()))
        } else {
            DiseaseDetection::deserialize(payload)
                .map(AnalysisResponse::DiseaseDetection)
                .map_err(|e| DecodeError::Disease(e.to_string()))
        }
    }

    pub fn is_market(&self) -> bool {
        matches!(self, AnalysisResponse::Market(_))
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            AnalysisResponse::Market(m) => m.image_url.as_deref(),
            AnalysisResponse::DiseaseDetection(d) => d.image_url.as_deref(),
        }
    }
}

fn unwrap_envelope(value: &Value) -> Result<(&Value, Option<&str>), DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let outer_type = obj.get("type").and_then(Value::as_str);

    let carries_payload = obj.contains_key("crop_detection") || obj.contains_key("crop_info");

    match obj.get("data") {
        Some(inner @ Value::Object(fields)) if !carries_payload => {
            let kind = fields.get("type").and_then(Value::as_str).or(outer_type);
            Ok((inner, kind))
        }
        _ => Ok((value, outer_type)),
    }
}

// Сериализуем обратно в форму сервиса, чтобы сохранённая история
// разбиралась тем же `decode`.
impl Serialize for AnalysisResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TaggedMarket<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            #[serde(flatten)]
            analysis: &'a MarketAnalysis,
        }

        match self {
            AnalysisResponse::Market(analysis) => TaggedMarket {
                kind: MARKET_TYPE,
                analysis,
            }
            .serialize(serializer),
            AnalysisResponse::DiseaseDetection(detection) => detection.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AnalysisResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AnalysisResponse::decode(&value).map_err(D::Error::custom)
    }
}

// ============================================================================
// Disease detection
// ============================================================================

/// Диагностика болезни культуры
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDetection {
    pub crop_detection: CropDetection,
    pub disease_detection: DiseaseFinding,
    pub confidence_score: f64,
    pub agricultural_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDetection {
    pub crop_name: String,
    #[serde(default)]
    pub variety: Option<String>,
    pub growth_stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseFinding {
    pub primary_condition: String,
    pub affected_parts: Vec<String>,
    pub severity: String,
    pub visible_symptoms: Vec<String>,
    pub disease_type: String,
}

// ============================================================================
// Market analysis
// ============================================================================

/// Анализ рыночных цен
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub crop_info: CropInfo,
    pub price_analysis: PriceAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropInfo {
    pub crop_details: CropDetails,
    /// Сервис присылает поле с опечаткой `health_codition`
    #[serde(rename = "health_codition", alias = "health_condition")]
    pub health_condition: String,
    pub confidence: f64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDetails {
    pub crop_name: String,
    #[serde(default)]
    pub variety: Option<String>,
    #[serde(default)]
    pub growth_stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    /// Цена по рынкам; значения приходят числами, строками или null
    pub prices: IndexMap<String, Value>,
    pub normalized_unit: String,
    pub original_listings: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Текст поля или заглушка, если поле пустое
pub fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}
