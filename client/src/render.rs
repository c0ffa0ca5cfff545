use std::fmt;

use serde_json::Value;

use crate::error::PredictError;
use crate::models::PredictionResult;

/// Interim text shown while the request is in flight.
pub const PENDING_PLACEHOLDER: &str = "Predicting...";

/// Bold label in front of the prediction.
pub const PREDICTION_LABEL: &str = "Prediction:";

/// Text form of a successful prediction, split so views can style the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrediction {
    pub value: String,
    pub confidence: Option<String>,
}

impl RenderedPrediction {
    /// Everything after the label, e.g. `High (confidence 0.823)`.
    pub fn body(&self) -> String {
        match &self.confidence {
            Some(confidence) => format!("{} (confidence {})", self.value, confidence),
            None => self.value.clone(),
        }
    }
}

impl fmt::Display for RenderedPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", PREDICTION_LABEL, self.body())
    }
}

pub fn render_prediction(result: &PredictionResult) -> RenderedPrediction {
    RenderedPrediction {
        value: result
            .prediction
            .as_ref()
            .map_or_else(|| "undefined".to_string(), display_value),
        confidence: result.confidence.map(|c| to_fixed(c, 3)),
    }
}

pub fn render_error(err: &PredictError) -> String {
    format!("Error: {}", err)
}

/// String conversion of a JSON value as the page would show it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => display_number(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Fixed-point formatting that rounds exact ties away from zero, as the
/// page's `toFixed` does. `format!("{:.N}")` rounds ties to even.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() || value.abs() >= 1e21 {
        return display_number(value);
    }

    // every finite f64 has an exact decimal expansion of at most 1074 places
    let exact = format!("{:.1100}", value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(digits))
        .collect();

    if frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&b| char::from(b)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&b| char::from(b)));
    }
    out
}

fn display_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}
