use serde::Serialize;
use serde_json::Value;

use crate::error::PredictError;

/// Element id of the ratio checkbox.
pub const COMPUTE_RATIOS_ID: &str = "compute_ratios";

/// Text fields of the prediction form, in payload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    StateUtCity,
    RoadAccidentsCases,
    RoadAccidentsInjured,
    RoadAccidentsDied,
    TotalTrafficAccidentsCases,
    TotalTrafficAccidentsInjured,
    TotalTrafficAccidentsDied,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::StateUtCity,
        Field::RoadAccidentsCases,
        Field::RoadAccidentsInjured,
        Field::RoadAccidentsDied,
        Field::TotalTrafficAccidentsCases,
        Field::TotalTrafficAccidentsInjured,
        Field::TotalTrafficAccidentsDied,
    ];

    /// Element id on the page, which is also the payload key.
    pub fn id(self) -> &'static str {
        match self {
            Field::StateUtCity => "state_ut_city",
            Field::RoadAccidentsCases => "road_accidents_cases",
            Field::RoadAccidentsInjured => "road_accidents_injured",
            Field::RoadAccidentsDied => "road_accidents_died",
            Field::TotalTrafficAccidentsCases => "total_traffic_accidents_cases",
            Field::TotalTrafficAccidentsInjured => "total_traffic_accidents_injured",
            Field::TotalTrafficAccidentsDied => "total_traffic_accidents_died",
        }
    }
}

/// Raw form state captured at the moment a prediction is triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub state_ut_city: String,
    pub road_accidents_cases: String,
    pub road_accidents_injured: String,
    pub road_accidents_died: String,
    pub total_traffic_accidents_cases: String,
    pub total_traffic_accidents_injured: String,
    pub total_traffic_accidents_died: String,
    pub compute_ratios: bool,
}

impl FormInputs {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::StateUtCity => &self.state_ut_city,
            Field::RoadAccidentsCases => &self.road_accidents_cases,
            Field::RoadAccidentsInjured => &self.road_accidents_injured,
            Field::RoadAccidentsDied => &self.road_accidents_died,
            Field::TotalTrafficAccidentsCases => &self.total_traffic_accidents_cases,
            Field::TotalTrafficAccidentsInjured => &self.total_traffic_accidents_injured,
            Field::TotalTrafficAccidentsDied => &self.total_traffic_accidents_died,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::StateUtCity => &mut self.state_ut_city,
            Field::RoadAccidentsCases => &mut self.road_accidents_cases,
            Field::RoadAccidentsInjured => &mut self.road_accidents_injured,
            Field::RoadAccidentsDied => &mut self.road_accidents_died,
            Field::TotalTrafficAccidentsCases => &mut self.total_traffic_accidents_cases,
            Field::TotalTrafficAccidentsInjured => &mut self.total_traffic_accidents_injured,
            Field::TotalTrafficAccidentsDied => &mut self.total_traffic_accidents_died,
        };
        *slot = value.into();
    }
}

/// Converts a raw form value the way the page's `Number()` coercion does.
///
/// The empty string and anything unparseable are absent. Surrounding
/// whitespace is ignored and a whitespace-only value is zero.
pub fn parse_number(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    // f64::from_str also takes "inf" and "nan", which are not numbers here
    let plain = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plain {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Deaths over cases, only when both operands are present and non-zero.
pub fn fatality_ratio(died: Option<f64>, cases: Option<f64>) -> Option<f64> {
    let died = truthy(died)?;
    let cases = truthy(cases)?;
    Some(died / cases).filter(|ratio| ratio.is_finite())
}

/// JSON body sent to `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPayload {
    pub state_ut_city: String,
    pub road_accidents_cases: Option<f64>,
    pub road_accidents_injured: Option<f64>,
    pub road_accidents_died: Option<f64>,
    pub total_traffic_accidents_cases: Option<f64>,
    pub total_traffic_accidents_injured: Option<f64>,
    pub total_traffic_accidents_died: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatality_ratio_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatality_ratio_road: Option<f64>,
}

impl PredictionPayload {
    pub fn from_inputs(inputs: &FormInputs) -> Self {
        let mut payload = PredictionPayload {
            state_ut_city: inputs.state_ut_city.clone(),
            road_accidents_cases: parse_number(&inputs.road_accidents_cases),
            road_accidents_injured: parse_number(&inputs.road_accidents_injured),
            road_accidents_died: parse_number(&inputs.road_accidents_died),
            total_traffic_accidents_cases: parse_number(&inputs.total_traffic_accidents_cases),
            total_traffic_accidents_injured: parse_number(&inputs.total_traffic_accidents_injured),
            total_traffic_accidents_died: parse_number(&inputs.total_traffic_accidents_died),
            fatality_ratio_total: None,
            fatality_ratio_road: None,
        };

        if inputs.compute_ratios {
            payload.fatality_ratio_total = fatality_ratio(
                payload.total_traffic_accidents_died,
                payload.total_traffic_accidents_cases,
            );
            payload.fatality_ratio_road =
                fatality_ratio(payload.road_accidents_died, payload.road_accidents_cases);
        }

        payload
    }
}

/// Successful answer of the prediction service.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// `None` when the response carried no `prediction` key at all.
    pub prediction: Option<Value>,
    pub confidence: Option<f64>,
}

impl PredictionResult {
    pub fn from_value(data: &Value) -> Result<Self, PredictError> {
        let confidence = match data.get("confidence") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                return Err(PredictError::Decode(format!(
                    "confidence is not a number: {}",
                    other
                )))
            }
        };

        Ok(PredictionResult {
            prediction: data.get("prediction").cloned(),
            confidence,
        })
    }
}

/// Turns a raw HTTP answer into a result.
///
/// The body is parsed before the status is looked at, so a failing
/// response without a JSON body surfaces as a decode error.
pub fn interpret_response(
    status: u16,
    ok: bool,
    body: &[u8],
) -> Result<PredictionResult, PredictError> {
    let data: Value =
        serde_json::from_slice(body).map_err(|e| PredictError::Decode(e.to_string()))?;

    if !ok {
        return Err(PredictError::Http {
            status,
            detail: detail_message(&data),
        });
    }

    PredictionResult::from_value(&data)
}

/// The `detail` of an error body, when it is present and truthy.
pub(crate) fn detail_message(data: &Value) -> Option<String> {
    data.get("detail")
        .filter(|d| json_truthy(d))
        .map(crate::render::display_value)
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
