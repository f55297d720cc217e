//! Normalization of the provider's prediction payload.
//!
//! The provider answers in one of two equivalent encodings: camelCase
//! (`topIntent` / `confidenceScore`) or snake_case (`top_intent` /
//! `confidence_score`), optionally wrapped in a `result` envelope. Both are
//! decoded as typed parse strategies tried in order; anything that matches
//! neither yields the default result (empty intent, zero confidence) rather
//! than an error.

use bibliobot_core::ClassificationResult;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct CamelPrediction {
    #[serde(rename = "topIntent")]
    top_intent: Option<String>,
    #[serde(default)]
    intents: Vec<CamelIntent>,
}

#[derive(Debug, Deserialize)]
struct CamelIntent {
    category: Option<String>,
    #[serde(rename = "confidenceScore")]
    confidence_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SnakePrediction {
    top_intent: Option<String>,
    #[serde(default)]
    intents: Vec<SnakeIntent>,
}

#[derive(Debug, Deserialize)]
struct SnakeIntent {
    category: Option<String>,
    confidence_score: Option<f64>,
}

struct Prediction {
    top_intent: Option<String>,
    intents: Vec<(Option<String>, Option<f64>)>,
}

impl From<CamelPrediction> for Prediction {
    fn from(prediction: CamelPrediction) -> Self {
        Self {
            top_intent: prediction.top_intent,
            intents: prediction
                .intents
                .into_iter()
                .map(|intent| (intent.category, intent.confidence_score))
                .collect(),
        }
    }
}

impl From<SnakePrediction> for Prediction {
    fn from(prediction: SnakePrediction) -> Self {
        Self {
            top_intent: prediction.top_intent,
            intents: prediction
                .intents
                .into_iter()
                .map(|intent| (intent.category, intent.confidence_score))
                .collect(),
        }
    }
}

/// Decodes a raw provider response into the canonical result.
pub fn decode_classification(payload: &Value) -> ClassificationResult {
    // The prediction may sit under result.prediction or directly under
    // prediction, depending on the provider surface.
    let Some(prediction_value) = payload
        .get("result")
        .and_then(|result| result.get("prediction"))
        .or_else(|| payload.get("prediction"))
    else {
        return ClassificationResult::default();
    };

    let prediction = parse_prediction(prediction_value);
    let Some(prediction) = prediction else {
        return ClassificationResult::default();
    };

    let top_intent = prediction.top_intent.unwrap_or_default();
    let confidence = resolve_confidence(&top_intent, &prediction.intents);

    ClassificationResult { top_intent, confidence }
}

fn parse_prediction(value: &Value) -> Option<Prediction> {
    // A snake_case payload also deserializes under the camelCase strategy
    // (every field lands as None), so camelCase only wins when it actually
    // extracted something.
    if let Ok(camel) = CamelPrediction::deserialize(value) {
        if camel.top_intent.is_some()
            || camel.intents.iter().any(|intent| intent.confidence_score.is_some())
        {
            return Some(camel.into());
        }
    }
    if let Ok(snake) = SnakePrediction::deserialize(value) {
        if snake.top_intent.is_some() || !snake.intents.is_empty() {
            return Some(snake.into());
        }
    }
    None
}

/// Picks the confidence for the reported top intent.
///
/// The provider's intents list is sorted by confidence descending, but that
/// ordering is not a documented contract, so the entry matching the top
/// intent's label is preferred; the first element is only a fallback for
/// payloads whose entries carry no label.
fn resolve_confidence(top_intent: &str, intents: &[(Option<String>, Option<f64>)]) -> f64 {
    let by_label = intents
        .iter()
        .find(|(category, _)| category.as_deref() == Some(top_intent) && !top_intent.is_empty())
        .and_then(|(_, confidence)| *confidence);

    by_label
        .or_else(|| intents.first().and_then(|(_, confidence)| *confidence))
        .unwrap_or(0.0)
}
