//! Retrieved review records.
//!
//! Metadata policy: a match is kept as long as it has an id. Each metadata
//! field is optional on its own. Text fields must be JSON strings; ratings must
//! be numbers (or numeric strings) inside `0..=5`. The similarity score is
//! optional as well. Anything else is logged and treated as absent, never
//! coerced into a made-up value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inclusive rating scale used by the review corpus.
pub const RATING_RANGE: std::ops::RangeInclusive<f32> = 0.0..=5.0;

/// One nearest-neighbour hit from the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    /// Professor name (the vector id in the index).
    pub id: String,
    pub review: Option<String>,
    pub subject: Option<String>,
    /// Star rating out of 5.
    pub stars: Option<f32>,
    pub date: Option<String>,
    /// Similarity score as reported by the index; `None` when it sent none.
    pub score: Option<f32>,
}

impl MatchRecord {
    /// Build a record from the id, score, and raw metadata object of one match.
    pub fn from_metadata(
        id: String,
        score: Option<f32>,
        metadata: Option<&Map<String, Value>>,
    ) -> Self {
        let empty = Map::new();
        let metadata = metadata.unwrap_or(&empty);
        Self {
            review: text_field(&id, metadata, "review"),
            subject: text_field(&id, metadata, "subject"),
            stars: rating_field(&id, metadata),
            date: text_field(&id, metadata, "date"),
            score: score_field(&id, score),
            id,
        }
    }
}

fn score_field(id: &str, score: Option<f32>) -> Option<f32> {
    match score {
        Some(s) if s.is_finite() => Some(s),
        _ => {
            tracing::warn!(record = %id, "similarity score missing, left absent");
            None
        }
    }
}

fn text_field(id: &str, metadata: &Map<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            tracing::warn!(record = %id, field = key, value = %other, "non-text metadata ignored");
            None
        }
    }
}

fn rating_field(id: &str, metadata: &Map<String, Value>) -> Option<f32> {
    let raw = metadata.get("stars")?;
    let rating = match raw {
        Value::Null => return None,
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    match rating {
        Some(r) if r.is_finite() && RATING_RANGE.contains(&r) => Some(r),
        _ => {
            tracing::warn!(record = %id, value = %raw, "rating missing or out of range, ignored");
            None
        }
    }
}
