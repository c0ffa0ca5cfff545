use log::debug;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::PredictError;
use crate::models::{detail_message, interpret_response, PredictionPayload, PredictionResult};

pub const PREDICT_PATH: &str = "/predict";
pub const HEALTH_PATH: &str = "/health";

/// Something that can turn a payload into a prediction.
#[allow(async_fn_in_trait)]
pub trait PredictionService {
    async fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, PredictError>;
}

/// `PredictionService` over HTTP: one `POST /predict` per call, no retry,
/// no timeout.
#[derive(Clone, Debug)]
pub struct HttpPredictionService {
    client: Client,
    base_url: Url,
}

impl HttpPredictionService {
    pub fn new(base_url: &str) -> Result<Self, PredictError> {
        let base_url = Url::parse(base_url).map_err(|e| PredictError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url, PredictError> {
        self.base_url.join(path).map_err(|e| PredictError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason: e.to_string(),
        })
    }

    pub fn predict_url(&self) -> Result<Url, PredictError> {
        self.url(PREDICT_PATH)
    }

    /// Fetches the service health document as-is.
    pub async fn health(&self) -> Result<Value, PredictError> {
        let response = self.client.get(self.url(HEALTH_PATH)?).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let data: Value =
            serde_json::from_slice(&body).map_err(|e| PredictError::Decode(e.to_string()))?;
        if !status.is_success() {
            return Err(PredictError::Http {
                status: status.as_u16(),
                detail: detail_message(&data),
            });
        }
        Ok(data)
    }
}

impl PredictionService for HttpPredictionService {
    async fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, PredictError> {
        let url = self.predict_url()?;
        debug!("POST {}", url);

        // `json` sets Content-Type: application/json
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("{} answered {} ({} bytes)", PREDICT_PATH, status, body.len());

        interpret_response(status.as_u16(), status.is_success(), &body)
    }
}
