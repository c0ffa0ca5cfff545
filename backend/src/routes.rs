use std::path::PathBuf;
use std::sync::Arc;

use actix_files::NamedFile;
use actix_web::error::InternalError;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};

use crate::inference::ModelInference;
use crate::models::{
    ErrorDetail, HealthResponse, PredictPayload, PredictResponse, STATUS_MODEL_NOT_LOADED,
    STATUS_OK,
};

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub model: Option<Arc<ModelInference>>,
    pub model_path: String,
    pub static_dir: PathBuf,
}

pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let (status, n_features) = match &state.model {
        Some(model) => (STATUS_OK, Some(model.feature_names().len())),
        None => (STATUS_MODEL_NOT_LOADED, None),
    };
    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        model_path: state.model_path.clone(),
        n_features,
    })
}

pub async fn predict(
    state: web::Data<AppState>,
    payload: web::Json<PredictPayload>,
) -> HttpResponse {
    let model = match &state.model {
        Some(model) => Arc::clone(model),
        None => {
            error!("prediction requested but no model is loaded");
            return HttpResponse::InternalServerError().json(ErrorDetail::new("Model not loaded"));
        }
    };

    let record = payload.into_inner().into_record();
    let worker_model = Arc::clone(&model);

    match web::block(move || worker_model.predict(&record)).await {
        Ok(Ok(prediction)) => {
            info!(
                "prediction={} confidence={:?}",
                prediction.label, prediction.confidence
            );
            HttpResponse::Ok().json(PredictResponse {
                prediction: prediction.label,
                confidence: prediction.confidence,
                features_used: model.feature_names().to_vec(),
            })
        }
        Ok(Err(e)) => {
            warn!("prediction failed: {:#}", e);
            HttpResponse::BadRequest().json(ErrorDetail::new(format!("Prediction failed: {:#}", e)))
        }
        Err(e) => {
            error!("blocking prediction task failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorDetail::new(format!("Prediction failed: {}", e)))
        }
    }
}

pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match NamedFile::open_async(state.static_dir.join("index.html")).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            error!("index page unavailable: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Index page unavailable"))
        }
    }
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorDetail::new("Not Found"))
}

/// Malformed or non-object bodies answer 422 with a `detail`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            warn!("rejected request body: {}", detail);
            InternalError::from_response(
                err,
                HttpResponse::UnprocessableEntity().json(ErrorDetail::new(detail)),
            )
            .into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Classifier, ModelMetadata};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    struct Fixed(Vec<f32>);

    impl Classifier for Fixed {
        fn predict_proba(&self, _row: &[f32]) -> anyhow::Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn predict_proba(&self, _row: &[f32]) -> anyhow::Result<Vec<f32>> {
            anyhow::bail!("input has 3 columns, model expects 4")
        }
    }

    fn state(classifier: Option<Box<dyn Classifier>>) -> web::Data<AppState> {
        let model = classifier.map(|c| {
            Arc::new(ModelInference::new(
                ModelMetadata {
                    features: vec![
                        "road_accidents_cases".to_string(),
                        "state_ut_city_Delhi".to_string(),
                    ],
                    classes: vec![
                        "fatal".to_string(),
                        "minor".to_string(),
                        "serious".to_string(),
                    ],
                },
                c,
            ))
        });
        web::Data::new(AppState {
            model,
            model_path: "model/rf_v1.onnx".to_string(),
            static_dir: PathBuf::from("./static"),
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state)
                    .app_data(json_config())
                    .configure(configure)
                    .default_service(web::route().to(not_found)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_without_model() {
        let app = app!(state(None));
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "model_not_loaded");
        assert_eq!(body.model_path, "model/rf_v1.onnx");
        assert_eq!(body.n_features, None);
    }

    #[actix_web::test]
    async fn health_with_model() {
        let app = app!(state(Some(Box::new(Fixed(vec![1.0])))));
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.n_features, Some(2));
    }

    #[actix_web::test]
    async fn predict_without_model_is_a_server_error() {
        let app = app!(state(None));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"state_ut_city": "Delhi"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Model not loaded");
    }

    #[actix_web::test]
    async fn predict_returns_label_confidence_and_features() {
        let app = app!(state(Some(Box::new(Fixed(vec![0.2, 0.1, 0.7])))));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({
                "state_ut_city": "Delhi",
                "road_accidents_cases": 10.0,
                "road_accidents_injured": null,
                "fatality_ratio_road": 0.1,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: PredictResponse = test::read_body_json(resp).await;
        assert_eq!(body.prediction, "minor");
        assert_eq!(body.confidence, Some(0.7));
        assert_eq!(
            body.features_used,
            vec!["road_accidents_cases", "state_ut_city_Delhi"]
        );
    }

    #[actix_web::test]
    async fn classifier_failure_is_a_bad_request() {
        let app = app!(state(Some(Box::new(Broken))));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"state_ut_city": "Delhi"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Prediction failed: "));
        assert!(body.detail.contains("model expects 4"));
    }

    #[actix_web::test]
    async fn non_object_body_is_unprocessable() {
        let app = app!(state(Some(Box::new(Fixed(vec![1.0])))));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!([1, 2, 3]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());
    }

    #[actix_web::test]
    async fn unknown_route_has_a_detail() {
        let app = app!(state(None));
        let req = test::TestRequest::get().uri("/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Not Found");
    }

    #[actix_web::test]
    async fn index_serves_the_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Severity</h1>").unwrap();
        let data = web::Data::new(AppState {
            model: None,
            model_path: String::new(),
            static_dir: dir.path().to_path_buf(),
        });
        let app = app!(data);

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "<h1>Severity</h1>".as_bytes());
    }
}
