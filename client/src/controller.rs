use log::{debug, warn};

use crate::error::PredictError;
use crate::models::{FormInputs, PredictionPayload};
use crate::render::{render_error, render_prediction, RenderedPrediction, PENDING_PLACEHOLDER};
use crate::service::PredictionService;

/// Where the controller reads the form from.
pub trait FormSource {
    fn read(&self) -> FormInputs;
}

/// The single output region a prediction is rendered into.
///
/// Views take `&self`: concurrent predictions write to the same region
/// without coordination.
pub trait ResultView {
    /// Makes the region visible and shows the placeholder.
    fn show_pending(&self, placeholder: &str);
    fn show_prediction(&self, rendered: &RenderedPrediction);
    fn show_error(&self, message: &str);
}

pub struct PredictorController<F, S, V> {
    form: F,
    service: S,
    view: V,
}

impl<F, S, V> PredictorController<F, S, V>
where
    F: FormSource,
    S: PredictionService,
    V: ResultView,
{
    pub fn new(form: F, service: S, view: V) -> Self {
        Self {
            form,
            service,
            view,
        }
    }

    /// Synchronous half of a prediction: snapshots the form, builds the
    /// payload and puts the view in its pending state.
    pub fn begin(&self) -> PredictionPayload {
        let inputs = self.form.read();
        let payload = PredictionPayload::from_inputs(&inputs);
        self.view.show_pending(PENDING_PLACEHOLDER);
        payload
    }

    /// Asynchronous half: one request, then exactly one render.
    pub async fn complete(
        &self,
        payload: PredictionPayload,
    ) -> Result<RenderedPrediction, PredictError> {
        debug!("requesting prediction for {:?}", payload.state_ut_city);

        match self.service.predict(&payload).await {
            Ok(result) => {
                let rendered = render_prediction(&result);
                self.view.show_prediction(&rendered);
                Ok(rendered)
            }
            Err(err) => {
                warn!("prediction failed: {}", err);
                self.view.show_error(&render_error(&err));
                Err(err)
            }
        }
    }

    pub async fn predict(&self) -> Result<RenderedPrediction, PredictError> {
        let payload = self.begin();
        self.complete(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionResult;
    use serde_json::json;
    use std::cell::RefCell;

    struct FixedForm(FormInputs);

    impl FormSource for FixedForm {
        fn read(&self) -> FormInputs {
            self.0.clone()
        }
    }

    struct FakeService {
        answer: Result<PredictionResult, PredictError>,
        calls: RefCell<Vec<PredictionPayload>>,
    }

    impl FakeService {
        fn answering(answer: Result<PredictionResult, PredictError>) -> Self {
            Self {
                answer,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PredictionService for FakeService {
        async fn predict(
            &self,
            payload: &PredictionPayload,
        ) -> Result<PredictionResult, PredictError> {
            self.calls.borrow_mut().push(payload.clone());
            self.answer.clone()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Pending(String),
        Text(String),
    }

    #[derive(Default)]
    struct RecordingView {
        shown: RefCell<Vec<Shown>>,
    }

    impl RecordingView {
        fn last(&self) -> Option<Shown> {
            self.shown.borrow().last().cloned()
        }
    }

    impl ResultView for RecordingView {
        fn show_pending(&self, placeholder: &str) {
            self.shown
                .borrow_mut()
                .push(Shown::Pending(placeholder.to_string()));
        }

        fn show_prediction(&self, rendered: &RenderedPrediction) {
            self.shown.borrow_mut().push(Shown::Text(rendered.to_string()));
        }

        fn show_error(&self, message: &str) {
            self.shown.borrow_mut().push(Shown::Text(message.to_string()));
        }
    }

    fn form() -> FormInputs {
        FormInputs {
            state_ut_city: "Chennai".to_string(),
            total_traffic_accidents_cases: "100".to_string(),
            total_traffic_accidents_died: "5".to_string(),
            compute_ratios: true,
            ..Default::default()
        }
    }

    fn controller(
        answer: Result<PredictionResult, PredictError>,
    ) -> PredictorController<FixedForm, FakeService, RecordingView> {
        PredictorController::new(
            FixedForm(form()),
            FakeService::answering(answer),
            RecordingView::default(),
        )
    }

    #[test]
    fn begin_shows_pending_before_any_request() {
        let controller = controller(Err(PredictError::Transport("unused".to_string())));
        let payload = controller.begin();

        assert_eq!(
            controller.view.last(),
            Some(Shown::Pending("Predicting...".to_string()))
        );
        assert!(controller.service.calls.borrow().is_empty());
        assert_eq!(payload.fatality_ratio_total, Some(0.05));
        assert_eq!(payload.fatality_ratio_road, None);
    }

    #[tokio::test]
    async fn renders_prediction_with_confidence() {
        let controller = controller(Ok(PredictionResult {
            prediction: Some(json!("High")),
            confidence: Some(0.8234),
        }));
        controller.predict().await.unwrap();

        assert_eq!(
            *controller.view.shown.borrow(),
            vec![
                Shown::Pending("Predicting...".to_string()),
                Shown::Text("Prediction: High (confidence 0.823)".to_string()),
            ]
        );
        let calls = controller.service.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].state_ut_city, "Chennai");
    }

    #[tokio::test]
    async fn renders_prediction_without_confidence() {
        let controller = controller(Ok(PredictionResult {
            prediction: Some(json!("High")),
            confidence: None,
        }));
        controller.predict().await.unwrap();
        assert_eq!(
            controller.view.last(),
            Some(Shown::Text("Prediction: High".to_string()))
        );
    }

    #[tokio::test]
    async fn renders_server_detail_as_error() {
        let controller = controller(Err(PredictError::Http {
            status: 400,
            detail: Some("bad city".to_string()),
        }));
        let err = controller.predict().await.unwrap_err();

        assert_eq!(err.to_string(), "bad city");
        assert_eq!(
            controller.view.last(),
            Some(Shown::Text("Error: bad city".to_string()))
        );
    }

    #[tokio::test]
    async fn renders_transport_failure_as_error() {
        let controller = controller(Err(PredictError::Transport(
            "error sending request".to_string(),
        )));
        controller.predict().await.unwrap_err();
        assert_eq!(
            controller.view.last(),
            Some(Shown::Text("Error: error sending request".to_string()))
        );
    }

    #[tokio::test]
    async fn each_trigger_issues_its_own_request() {
        let controller = controller(Ok(PredictionResult {
            prediction: Some(json!("minor")),
            confidence: Some(0.5),
        }));
        let first = controller.begin();
        let second = controller.begin();
        let (a, b) = tokio::join!(controller.complete(first), controller.complete(second));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(controller.service.calls.borrow().len(), 2);
        assert_eq!(controller.view.shown.borrow().len(), 4);
    }
}
