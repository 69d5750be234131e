//! Upload-and-classify lifecycle: file intake, preview decoding, the zone
//! state machine, result rendering and the HTTP client for the
//! classification service. Nothing in here knows about a widget toolkit;
//! front-ends plug in through [`View`] and run the jobs the controller hands
//! out.

pub mod config;
pub mod controller;
pub mod error;
pub mod intake;
pub mod preview;
pub mod reducer;
pub mod render;
pub mod transport;
pub mod types;

pub use config::{load_settings, Endpoints, Settings, SettingsError};
pub use controller::{
    DecodeJob, HealthJob, PredictCompletion, PredictJob, PreviewCompletion,
    UploadLifecycleController, View,
};
pub use error::{ErrorKind, UploadError};
pub use intake::{CandidateFile, FileSource, SelectedFile, MAX_UPLOAD_BYTES};
pub use preview::{Preview, PreviewImage};
pub use render::{render_result, ProbabilityRow, ResultView};
pub use transport::{ClassificationService, HttpClassificationClient};
pub use types::PredictionResult;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;
