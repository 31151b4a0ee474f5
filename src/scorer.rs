use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::TopPrediction;
use crate::risk::{self, Category, RiskTier, SAFE_CLASS};

pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const MIN_THRESHOLD: f32 = 0.1;
pub const MAX_THRESHOLD: f32 = 0.99;

const MIN_SCORE: i32 = 5;

const BANNER_SAFE: &str = "✅ ¡Excelente! Conducción Segura. Mantente concentrado.";
const BANNER_MODERATE: &str = "⚠️ Precaución. Riesgo Moderado. Reajuste su postura y atención.";
const BANNER_CRITICAL: &str = "🚨 ¡PELIGRO CRÍTICO! Detenga la distracción inmediatamente.";

const QUALIFIER_RAISED_RISK: &str = "El riesgo es incrementado por el perfil seleccionado.";
const QUALIFIER_MITIGATED: &str = "Tu experiencia mitiga ligeramente la severidad.";

/// Driving experience the user declares alongside the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExperienceTier {
    Principiante,
    #[default]
    Intermedio,
    Avanzado,
}

impl ExperienceTier {
    /// Amount subtracted from a non-safe class's base score.
    pub fn adjustment(self) -> i32 {
        match self {
            ExperienceTier::Principiante => -15,
            ExperienceTier::Intermedio => 0,
            ExperienceTier::Avanzado => 5,
        }
    }

    /// Note appended to the impact text of a distraction class. Beginners are
    /// warned, advanced drivers reassured.
    pub fn qualifier(self) -> Option<&'static str> {
        match self {
            ExperienceTier::Principiante => Some(QUALIFIER_RAISED_RISK),
            ExperienceTier::Intermedio => None,
            ExperienceTier::Avanzado => Some(QUALIFIER_MITIGATED),
        }
    }

    /// Parses a form value; anything unrecognised is treated as `Intermedio`.
    pub fn from_form(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::debug!(value, "unknown experience tier, using Intermedio");
            ExperienceTier::Intermedio
        })
    }
}

impl FromStr for ExperienceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Principiante" => Ok(ExperienceTier::Principiante),
            "Intermedio" => Ok(ExperienceTier::Intermedio),
            "Avanzado" => Ok(ExperienceTier::Avanzado),
            other => Err(format!("unknown experience tier: {other}")),
        }
    }
}

impl fmt::Display for ExperienceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExperienceTier::Principiante => "Principiante",
            ExperienceTier::Intermedio => "Intermedio",
            ExperienceTier::Avanzado => "Avanzado",
        };
        f.write_str(name)
    }
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class_name: &'static str,
    #[serde(rename = "confidence")]
    pub confidence_percent: String,
    #[serde(rename = "message")]
    pub composed_message: String,
    #[serde(rename = "message_type")]
    pub category: Category,
    pub final_score: i32,
    #[serde(rename = "risk_level")]
    pub risk_tier: RiskTier,
    #[serde(rename = "impact_message")]
    pub adjusted_impact_message: String,
    #[serde(rename = "used_threshold")]
    pub threshold_used: f32,
}

/// Parses the optional `threshold` form field. Missing or unparseable input
/// yields the default; finite values are clamped into the accepted range.
pub fn parse_threshold(raw: Option<&str>) -> f32 {
    match raw.map(str::trim).and_then(|s| s.parse::<f32>().ok()) {
        Some(t) if t.is_finite() => t.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
        _ => DEFAULT_THRESHOLD,
    }
}

fn banner(score: i32) -> &'static str {
    if score >= 80 {
        BANNER_SAFE
    } else if score >= 40 {
        BANNER_MODERATE
    } else {
        BANNER_CRITICAL
    }
}

/// Turns a raw top-1 prediction into the risk assessment returned to the
/// user.
pub fn assess(
    prediction: TopPrediction,
    threshold: f32,
    experience: ExperienceTier,
) -> PredictionResult {
    let class_index = if prediction.confidence < threshold {
        SAFE_CLASS
    } else {
        prediction.class_index
    };
    let entry = risk::lookup(class_index);

    let mut final_score = i32::from(entry.base_score);
    let mut impact = entry.message.to_string();

    // Unknown indices resolve to the safe entry, so key off the entry itself.
    if entry.class_index != SAFE_CLASS {
        let adjustment = experience.adjustment();
        final_score = (final_score - adjustment).max(MIN_SCORE);

        if let Some(qualifier) = experience.qualifier() {
            impact = format!("({experience}) {}. {qualifier}", entry.message);
        }
    }

    PredictionResult {
        class_name: entry.class_name,
        confidence_percent: format!("{:.2}%", prediction.confidence * 100.0),
        composed_message: format!("{}<br><br>{}", banner(final_score), entry.message),
        category: entry.category,
        final_score,
        risk_tier: entry.tier,
        adjusted_impact_message: impact,
        threshold_used: threshold,
    }
}
