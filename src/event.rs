/// Input records handed from the export loader to the aggregator.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{json_kind, InputShapeError};

/// Artist label used when a row carries no artist.
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// One playback occurrence from the export.
///
/// `timestamp` is kept as raw text; rows whose timestamp cannot be parsed are
/// skipped during aggregation rather than at load time.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ListeningEvent {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub show_id: String,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    /// Date the show was performed, as written in the export.
    #[serde(default)]
    pub show_date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub location: String,
    /// Full length of the recording, however much of it was played.
    #[serde(default)]
    pub recording_minutes: Option<f64>,
    /// Fraction of the recording played, 0..1.
    #[serde(default)]
    pub completion: Option<f64>,
}

impl ListeningEvent {
    pub fn new(
        timestamp: impl Into<String>,
        artist: impl Into<String>,
        show_id: impl Into<String>,
        duration_minutes: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            artist: artist.into(),
            show_id: show_id.into(),
            duration_minutes: Some(duration_minutes),
            ..Default::default()
        }
    }

    /// Listening minutes with missing, negative and non-finite values mapped to 0.
    pub fn minutes(&self) -> f64 {
        match self.duration_minutes {
            Some(m) if m.is_finite() && m > 0.0 => m,
            _ => 0.0,
        }
    }

    /// Artist key; keys are not case- or whitespace-normalized.
    pub fn artist_key(&self) -> &str {
        if self.artist.is_empty() {
            UNKNOWN_ARTIST
        } else {
            &self.artist
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Artist,
    Recording,
    Other,
}

impl FavoriteKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "artist" => FavoriteKind::Artist,
            "recording" => FavoriteKind::Recording,
            _ => FavoriteKind::Other,
        }
    }
}

/// An item the user favorited, from `Favorites.tsv`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Favorite {
    pub kind: FavoriteKind,
    pub identifier: String,
    pub date_added: String,
}

/// Everything the loader extracted from one export.
#[derive(Debug, Clone, Default)]
pub struct Export {
    pub events: Vec<ListeningEvent>,
    pub favorites: Vec<Favorite>,
}

/// Convert a JSON document into listening events.
///
/// The document must be an array of objects. Inside a record, a field with an
/// unexpected type is treated as missing, so the row is later normalized or
/// skipped instead of failing the whole input.
pub fn events_from_value(value: &Value) -> Result<Vec<ListeningEvent>, InputShapeError> {
    let items = value.as_array().ok_or(InputShapeError::NotASequence {
        found: json_kind(value),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let record = item.as_object().ok_or(InputShapeError::NotARecord {
                index,
                found: json_kind(item),
            })?;
            Ok(ListeningEvent {
                timestamp: text_field(record, "timestamp"),
                artist: text_field(record, "artist"),
                show_id: text_field(record, "show_id"),
                duration_minutes: number_field(record, "duration_minutes"),
                show_date: text_field(record, "show_date"),
                venue: text_field(record, "venue"),
                location: text_field(record, "location"),
                recording_minutes: number_field(record, "recording_minutes"),
                completion: number_field(record, "completion"),
            })
        })
        .collect()
}

fn text_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number_field(record: &Map<String, Value>, key: &str) -> Option<f64> {
    record.get(key).and_then(Value::as_f64)
}
