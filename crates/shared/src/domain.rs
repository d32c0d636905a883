use serde::{Deserialize, Serialize};

/// Raw response of the prediction backend: a binary label plus a
/// confidence on the 0-100 percentage scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub prediction: String,
    pub confidence: f64,
}

impl RawPrediction {
    /// The backend is only ever expected to emit these two labels.
    /// Anything else still maps (see `assessment::assess`) but callers
    /// doing I/O should log it.
    pub fn is_known_label(&self) -> bool {
        matches!(self.prediction.as_str(), "Old" | "New")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Poor,
    Excellent,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Poor => "Poor",
            Condition::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDetails {
    pub cover_condition: String,
    pub page_condition: String,
    pub binding_condition: String,
}

/// Normalized, UI-facing assessment. Confidence is always fractional
/// (0.0-1.0); details and recommendations always come from the same
/// source label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub condition: Condition,
    pub confidence: f64,
    pub details: ConditionDetails,
    pub recommendations: Vec<String>,
}
