//! Client for the traffic accident severity service.
//!
//! [`PredictorController`] turns a snapshot of the prediction form into a
//! `POST /predict` call and renders the answer, or the failure, into a
//! single result region. The browser binding lives in `dom` (wasm32 only);
//! the `severity-client` binary drives the same controller from a terminal.

pub mod controller;
pub mod error;
pub mod models;
pub mod render;
pub mod service;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use controller::{FormSource, PredictorController, ResultView};
pub use error::PredictError;
pub use models::{Field, FormInputs, PredictionPayload, PredictionResult};
pub use render::{RenderedPrediction, PENDING_PLACEHOLDER};
pub use service::{HttpPredictionService, PredictionService};
