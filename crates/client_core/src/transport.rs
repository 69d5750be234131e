//! Classification service client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mime_guess::mime::Mime;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::Value;
use shared::{
    error::ApiError,
    protocol::{ClassesResponse, HealthResponse, PredictResponse},
};
use tracing::debug;

use crate::{
    config::{Endpoints, Settings, SettingsError},
    error::UploadError,
    intake::SelectedFile,
    types::PredictionResult,
};

/// Form field carrying the image bytes.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub const UPLOAD_FIELD: &str = "file";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Classification failed";

#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn health(&self) -> Result<HealthResponse>;
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult, UploadError>;
    async fn classes(&self) -> Result<ClassesResponse>;
}

pub struct HttpClassificationClient {
    http: Client,
    endpoints: Endpoints,
}

impl HttpClassificationClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            endpoints,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.endpoints()?))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl ClassificationService for HttpClassificationClient {
    async fn health(&self) -> Result<HealthResponse> {
        let body: Value = self
            .http
            .get(self.endpoints.health.clone())
            .send()
            .await
            .context("health request failed")?
            .error_for_status()?
            .json()
            .await
            .context("health response was not JSON")?;
        Ok(health_from_value(body))
    }

    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult, UploadError> {
        let bytes = file.read_bytes_async().await?;
        let form = Form::new().part(UPLOAD_FIELD, upload_part(file, bytes)?);

        let response = self
            .http
            .post(self.endpoints.predict.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::NetworkFailure(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ApiError>()
                .await
                .ok()
                .and_then(|body| body.detail_text());
            return Err(UploadError::ServerRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| UploadError::NetworkFailure(err.to_string()))?;
        debug!(file_id = %file.id, status = status.as_u16(), bytes = body.len(), "predict response received");
        parse_predict_body(&body)
    }

    async fn classes(&self) -> Result<ClassesResponse> {
        let classes = self
            .http
            .get(self.endpoints.classes.clone())
            .send()
            .await
            .context("classes request failed")?
            .error_for_status()?
            .json()
            .await
            .context("classes response was not valid")?;
        Ok(classes)
    }
}

/// The `file` part. A MIME type the multipart encoder can't parse (such
/// as a bare `image/`) is sent as `application/octet-stream`.
fn upload_part(file: &SelectedFile, bytes: Vec<u8>) -> Result<Part, UploadError> {
    let content_type = match file.mime_type.parse::<Mime>() {
        Ok(_) => file.mime_type.as_str(),
        Err(err) => {
            debug!(mime_type = %file.mime_type, "sending as octet-stream: {err}");
            FALLBACK_CONTENT_TYPE
        }
    };
    Part::bytes(bytes)
        .file_name(file.name.clone())
        .mime_str(content_type)
        .map_err(UploadError::unreadable)
}

/// Interprets a 2xx predict body. `success` missing counts as false.
pub fn parse_predict_body(body: &str) -> Result<PredictionResult, UploadError> {
    let response: PredictResponse = serde_json::from_str(body).map_err(|err| {
        UploadError::ClassificationFailed(format!("invalid response body: {err}"))
    })?;

    if !response.success {
        let message = response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
        return Err(UploadError::ClassificationFailed(message));
    }

    response
        .prediction
        .map(PredictionResult::from)
        .ok_or_else(|| {
            UploadError::ClassificationFailed("response did not include a prediction".to_string())
        })
}

fn health_from_value(body: Value) -> HealthResponse {
    match serde_json::from_value::<HealthResponse>(body.clone()) {
        Ok(health) => health,
        Err(_) => {
            let mut health = HealthResponse::default();
            health.extra.insert("body".to_string(), body);
            health
        }
    }
}
