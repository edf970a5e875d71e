use serde::{Deserialize, Serialize};

/// Базовый адрес внешнего сервиса анализа
pub const ANALYSIS_SERVICE_BASE: &str = "http://159.89.173.106:8000";

/// Режим анализа: определяет endpoint и тексты интерфейса для следующей отправки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Market,
    DiseaseDetection,
}

/// Строка таблицы конфигурации режима
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    pub path: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub placeholder: &'static str,
    pub assistant_label: &'static str,
    pub stage_messages: &'static [&'static str],
}

const MARKET_PROFILE: ModeProfile = ModeProfile {
    path: "/analyze",
    title: "Market Analysis",
    icon: "📊",
    description: "Get market analysis, price predictions, and trading insights",
    placeholder: "Ask about market trends, prices, or upload images for analysis...",
    assistant_label: "Market AI",
    stage_messages: &[
        "Analyzing...",
        "Market data collecting...",
        "Data processing...",
        "Almost ready...",
        "Response is ready and streaming...",
    ],
};

const DISEASE_PROFILE: ModeProfile = ModeProfile {
    path: "/disease-detection",
    title: "Disease Detection",
    icon: "🔬",
    description: "Upload crop images to detect diseases and get treatment recommendations",
    placeholder: "Describe symptoms or upload crop image for disease detection...",
    assistant_label: "Disease AI",
    stage_messages: &[
        "Analyzing image...",
        "Disease pattern recognition...",
        "Comparing with disease database...",
        "Generating diagnosis...",
        "Treatment recommendations ready...",
    ],
};

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 2] = [AnalysisMode::Market, AnalysisMode::DiseaseDetection];

    pub fn profile(&self) -> &'static ModeProfile {
        match self {
            AnalysisMode::Market => &MARKET_PROFILE,
            AnalysisMode::DiseaseDetection => &DISEASE_PROFILE,
        }
    }

    /// Полный URL endpoint'а для режима
    pub fn endpoint(&self) -> String {
        format!("{}{}", ANALYSIS_SERVICE_BASE, self.profile().path)
    }

    pub fn toggled(&self) -> Self {
        match self {
            AnalysisMode::Market => AnalysisMode::DiseaseDetection,
            AnalysisMode::DiseaseDetection => AnalysisMode::Market,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Market => "market",
            AnalysisMode::DiseaseDetection => "disease_detection",
        }
    }

    /// Сообщения этапов загрузки, показанные к моменту `stage` (включительно)
    pub fn stages_until(&self, stage: usize) -> &'static [&'static str] {
        let stages = self.profile().stage_messages;
        let end = (stage + 1).min(stages.len());
        &stages[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_differ_per_mode() {
        assert_eq!(
            AnalysisMode::Market.endpoint(),
            "http://159.89.173.106:8000/analyze"
        );
        assert_eq!(
            AnalysisMode::DiseaseDetection.endpoint(),
            "http://159.89.173.106:8000/disease-detection"
        );
    }

    #[test]
    fn test_toggle_is_involution() {
        for mode in AnalysisMode::ALL {
            assert_ne!(mode.toggled(), mode);
            assert_eq!(mode.toggled().toggled(), mode);
        }
    }

    #[test]
    fn test_stages_saturate() {
        let mode = AnalysisMode::DiseaseDetection;
        assert_eq!(mode.stages_until(0), &["Analyzing image..."]);
        assert_eq!(mode.stages_until(1).len(), 2);
        assert_eq!(mode.stages_until(100).len(), 5);
    }

    #[test]
    fn test_default_is_market() {
        assert_eq!(AnalysisMode::default(), AnalysisMode::Market);
    }
}
