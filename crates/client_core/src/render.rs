//! Turns a [`PredictionResult`] into what the Results zone shows.

use std::cmp::Ordering;

use shared::protocol::Probabilities;

use crate::types::PredictionResult;

pub const NOT_A_CAR_LABEL: &str = "Not a Car";
pub const OOD_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRow {
    pub label: String,
    pub probability: f64,
    pub percent_text: String,
    /// Bar fill in `[0, 1]`.
    pub bar_fraction: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub confidence_text: String,
    pub not_a_car: bool,
    /// `None` hides the breakdown panel.
    pub probabilities: Option<Vec<ProbabilityRow>>,
}

impl ResultView {
    pub fn shows_probabilities(&self) -> bool {
        self.probabilities.is_some()
    }
}

pub fn humanize_label(raw: &str) -> String {
    raw.replace('_', " ")
}

/// `0.87` → `"87.0%"`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Ordered OR of five signals. Any hit hides the breakdown panel.
pub fn is_not_a_car(result: &PredictionResult) -> bool {
    let lower = result.predicted_class.to_lowercase();
    result.predicted_class == NOT_A_CAR_LABEL
        || lower.contains("not")
        || lower.contains("ood")
        // A reported 0.0 is a score, not an absent field, so it counts.
        || result
            .ood_probability
            .is_some_and(|probability| probability < OOD_THRESHOLD)
        || result.class_probabilities.is_none()
}

/// Rows sorted by descending probability; equal values keep wire order.
pub fn probability_rows(probabilities: &Probabilities) -> Vec<ProbabilityRow> {
    let mut entries: Vec<(&str, f64)> = probabilities.iter().collect();
    entries.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    entries
        .into_iter()
        .map(|(label, probability)| ProbabilityRow {
            label: humanize_label(label),
            probability,
            percent_text: format_percent(probability),
            bar_fraction: probability.clamp(0.0, 1.0) as f32,
        })
        .collect()
}

pub fn render_result(result: &PredictionResult) -> ResultView {
    let not_a_car = is_not_a_car(result);
    let probabilities = if not_a_car {
        None
    } else {
        result
            .probabilities()
            .filter(|probabilities| !probabilities.is_empty())
            .map(probability_rows)
    };

    ResultView {
        label: humanize_label(&result.predicted_class),
        confidence_text: format!("{} confidence", format_percent(result.confidence)),
        not_a_car,
        probabilities,
    }
}
