use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_OK: &str = "ok";
pub const STATUS_MODEL_NOT_LOADED: &str = "model_not_loaded";

/// Free-form record posted to `/predict`; any JSON object is accepted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct PredictPayload(pub Map<String, Value>);

impl PredictPayload {
    pub fn into_record(self) -> Map<String, Value> {
        self.0
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: Option<f64>,
    pub features_used: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_path: String,
    pub n_features: Option<usize>,
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        ErrorDetail {
            detail: detail.into(),
        }
    }
}
