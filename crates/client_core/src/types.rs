use shared::protocol::{PredictionPayload, Probabilities};

/// Classification output for one image. Lives for one display cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub predicted_class: String,
    pub confidence: f64,
    pub ood_probability: Option<f64>,
    pub class_probabilities: Option<Probabilities>,
    pub all_probabilities: Option<Probabilities>,
}

impl PredictionResult {
    /// Breakdown to display: `class_probabilities` wins over
    /// `all_probabilities`.
    pub fn probabilities(&self) -> Option<&Probabilities> {
        self.class_probabilities
            .as_ref()
            .or(self.all_probabilities.as_ref())
    }
}

impl From<PredictionPayload> for PredictionResult {
    fn from(payload: PredictionPayload) -> Self {
        Self {
            predicted_class: payload.predicted_class,
            confidence: payload.confidence,
            ood_probability: payload.ood_probability,
            class_probabilities: payload.class_probabilities,
            all_probabilities: payload.all_probabilities,
        }
    }
}
