//! Normalization of a raw classifier label into the UI-facing assessment.

use crate::domain::{ClassificationResult, Condition, ConditionDetails, RawPrediction};

/// Label the backend uses for an aged/worn book.
pub const AGED_LABEL: &str = "Old";

const WORN_DETAILS: [&str; 3] = ["Worn cover", "Yellowed pages", "Loose binding"];
const CLEAN_DETAILS: [&str; 3] = ["Clean cover", "Crisp pages", "Firm binding"];

const PRESERVATION_RECOMMENDATIONS: [&str; 3] = [
    "Store in a dry, cool place.",
    "Consider rebinding for preservation.",
    "Avoid direct sunlight exposure.",
];
const PROTECTIVE_RECOMMENDATIONS: [&str; 3] = [
    "Keep in protective sleeve.",
    "Maintain in low-humidity environment.",
    "Avoid bending or stacking heavy items.",
];

/// Maps a raw prediction into the normalized result. Total: every label
/// other than [`AGED_LABEL`] takes the good-condition branch. The 0-100
/// confidence is rescaled to 0.0-1.0 here and nowhere else.
pub fn assess(raw: &RawPrediction) -> ClassificationResult {
    let aged = raw.prediction == AGED_LABEL;

    let (condition, details, recommendations) = if aged {
        (Condition::Poor, WORN_DETAILS, PRESERVATION_RECOMMENDATIONS)
    } else {
        (Condition::Excellent, CLEAN_DETAILS, PROTECTIVE_RECOMMENDATIONS)
    };

    ClassificationResult {
        condition,
        confidence: raw.confidence / 100.0,
        details: ConditionDetails {
            cover_condition: details[0].to_string(),
            page_condition: details[1].to_string(),
            binding_condition: details[2].to_string(),
        },
        recommendations: recommendations.iter().map(ToString::to_string).collect(),
    }
}
