use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tract_onnx::prelude::*;

/// Column layout and class labels the model was trained with, stored next
/// to the model as `<model>.json`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelMetadata {
    pub features: Vec<String>,
    pub classes: Vec<String>,
}

impl ModelMetadata {
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        model_path.with_extension("json")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading model metadata {}", path.display()))?;
        let metadata: ModelMetadata = serde_json::from_str(&raw)
            .with_context(|| format!("parsing model metadata {}", path.display()))?;
        if metadata.features.is_empty() {
            bail!("model metadata {} lists no features", path.display());
        }
        Ok(metadata)
    }
}

/// Anything that maps one encoded row to class probabilities.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, row: &[f32]) -> anyhow::Result<Vec<f32>>;
}

/// ONNX classifier whose last output is the `[1, n_classes]` probability
/// matrix.
pub struct OnnxClassifier {
    model: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P, n_features: usize) -> TractResult<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(model_path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, n_features)),
            )?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, row: &[f32]) -> anyhow::Result<Vec<f32>> {
        let input = Tensor::from_shape(&[1, row.len()], row)?;
        let outputs = self.model.run(tvec!(input.into()))?;
        let probabilities = outputs
            .last()
            .ok_or_else(|| anyhow!("model produced no output"))?;
        Ok(probabilities.to_array_view::<f32>()?.iter().copied().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: Option<f64>,
}

pub struct ModelInference {
    metadata: ModelMetadata,
    classifier: Box<dyn Classifier>,
}

impl ModelInference {
    pub fn new(metadata: ModelMetadata, classifier: Box<dyn Classifier>) -> Self {
        Self {
            metadata,
            classifier,
        }
    }

    /// Loads `model_path` and its metadata sidecar.
    pub fn load(model_path: &Path) -> anyhow::Result<Self> {
        let metadata = ModelMetadata::load(&ModelMetadata::sidecar_path(model_path))?;
        let classifier = OnnxClassifier::load(model_path, metadata.features.len())
            .with_context(|| format!("loading model {}", model_path.display()))?;
        Ok(Self::new(metadata, Box::new(classifier)))
    }

    pub fn feature_names(&self) -> &[String] {
        &self.metadata.features
    }

    pub fn predict(&self, record: &Map<String, Value>) -> anyhow::Result<Prediction> {
        let row = encode_record(record, &self.metadata.features)?;
        let probabilities = self.classifier.predict_proba(&row)?;

        let (index, best) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .ok_or_else(|| anyhow!("model returned no class probabilities"))?;

        let label = self
            .metadata
            .classes
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string());

        Ok(Prediction {
            label,
            confidence: Some(widen(best)),
        })
    }
}

/// Widens an f32 through its shortest decimal form, so 0.7_f32 becomes
/// 0.7 rather than 0.699999988079071.
pub fn widen(value: f32) -> f64 {
    value.to_string().parse().unwrap_or_else(|_| f64::from(value))
}

/// One-hot encodes a record the way the training data was: numbers and
/// booleans keep their column, a string `v` under `k` lights up `k_v`, and
/// `null` lights up `k_nan`.
pub fn dummy_columns(record: &Map<String, Value>) -> anyhow::Result<HashMap<String, f32>> {
    let mut columns = HashMap::with_capacity(record.len() * 2);
    for (key, value) in record {
        match value {
            Value::Number(n) => {
                let v = n
                    .as_f64()
                    .ok_or_else(|| anyhow!("column '{}' is not a finite number", key))?;
                columns.insert(key.clone(), v as f32);
            }
            Value::Bool(b) => {
                columns.insert(key.clone(), if *b { 1.0 } else { 0.0 });
            }
            Value::String(s) => {
                columns.insert(format!("{}_{}", key, s), 1.0);
                columns.entry(format!("{}_nan", key)).or_insert(0.0);
            }
            Value::Null => {
                columns.insert(format!("{}_nan", key), 1.0);
            }
            Value::Array(_) | Value::Object(_) => {
                bail!("column '{}' holds a nested value", key)
            }
        }
    }
    Ok(columns)
}

/// Reindexes the encoded record onto `features`, filling gaps with 0.
pub fn encode_record(record: &Map<String, Value>, features: &[String]) -> anyhow::Result<Vec<f32>> {
    let columns = dummy_columns(record)?;
    Ok(features
        .iter()
        .map(|name| columns.get(name).copied().unwrap_or(0.0))
        .collect())
}
