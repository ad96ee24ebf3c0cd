/// Export loading.
///
/// Reads an Archive.org listening-history export (a directory or a single
/// file) into listening events and favorites.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::event::{events_from_value, Export, Favorite, FavoriteKind, ListeningEvent};

pub const SUMMARY_FILE: &str = "ListeningHistorySummary.tsv";
pub const FAVORITES_FILE: &str = "Favorites.tsv";
pub const EVENTS_FILE: &str = "events.json";

/// One row of `ListeningHistorySummary.tsv`. Columns not listed are ignored.
#[derive(Debug, Deserialize)]
struct SummaryRecord {
    #[serde(rename = "listenedOn", default)]
    listened_on: String,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    #[serde(rename = "recordingIdentifier", default)]
    recording_identifier: String,
    #[serde(rename = "showDate", default)]
    show_date: String,
    #[serde(default)]
    venue: String,
    #[serde(default)]
    location: String,
    /// Recording length in seconds.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    duration: Option<f64>,
    /// Fraction of the recording actually played, 0..1.
    #[serde(
        rename = "percentListenedTo",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    percent_listened_to: Option<f64>,
}

impl SummaryRecord {
    /// Played minutes need both the length and the fraction; a row missing
    /// either contributes no minutes.
    fn into_event(self) -> ListeningEvent {
        let played = self
            .duration
            .zip(self.percent_listened_to)
            .map(|(seconds, fraction)| seconds * fraction / 60.0);

        ListeningEvent {
            timestamp: self.listened_on,
            artist: self.artist_name,
            show_id: self.recording_identifier,
            duration_minutes: played,
            show_date: self.show_date,
            venue: self.venue,
            location: self.location,
            recording_minutes: self.duration.map(|seconds| seconds / 60.0),
            completion: self.percent_listened_to,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FavoriteRecord {
    #[serde(rename = "favoriteType", default)]
    favorite_type: String,
    #[serde(rename = "favoriteIdentifier", default)]
    favorite_identifier: String,
    #[serde(rename = "dateAdded", default)]
    date_added: String,
}

impl From<FavoriteRecord> for Favorite {
    fn from(record: FavoriteRecord) -> Self {
        Favorite {
            kind: FavoriteKind::from_label(&record.favorite_type),
            identifier: record.favorite_identifier,
            date_added: record.date_added,
        }
    }
}

/// Loads an export from a directory or a single `.tsv`/`.json` file.
///
/// In a directory the summary TSV is required (searched recursively when it is
/// not at the top level) unless an `events.json` list is present instead.
/// `Favorites.tsv` is optional.
pub fn load_export(path: &Path) -> Result<Export> {
    if path.is_dir() {
        return load_export_dir(path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let events = match extension.as_deref() {
        Some("tsv") => load_summary_tsv(path)?,
        Some("json") => load_events_json(path)?,
        _ => bail!(
            "Unsupported export file: {} (expected a directory, .tsv or .json)",
            path.display()
        ),
    };

    Ok(Export {
        events,
        favorites: Vec::new(),
    })
}

fn load_export_dir(dir: &Path) -> Result<Export> {
    let events = if let Some(summary) = find_file(dir, SUMMARY_FILE) {
        load_summary_tsv(&summary)?
    } else if let Some(events_json) = find_file(dir, EVENTS_FILE) {
        load_events_json(&events_json)?
    } else {
        bail!(
            "Could not find {} in {}. Make sure this is a valid Archive.org listening history export.",
            SUMMARY_FILE,
            dir.display()
        );
    };

    let favorites = match find_file(dir, FAVORITES_FILE) {
        Some(path) => load_favorites_tsv(&path)?,
        None => Vec::new(),
    };

    info!(
        events = events.len(),
        favorites = favorites.len(),
        "Loaded export from {}",
        dir.display()
    );

    Ok(Export { events, favorites })
}

/// Finds `name` under `dir`, preferring the shallowest match.
fn find_file(dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open TSV file: {}", path.display()))
}

/// Reads the listening summary. Malformed records are logged and skipped.
pub fn load_summary_tsv(path: &Path) -> Result<Vec<ListeningEvent>> {
    let mut reader = tsv_reader(path)?;
    let mut events = Vec::new();

    for (index, result) in reader.deserialize::<SummaryRecord>().enumerate() {
        match result {
            Ok(record) => events.push(record.into_event()),
            Err(e) => warn!(record = index + 1, "Skipping malformed listening record: {}", e),
        }
    }

    Ok(events)
}

/// Reads the favorites list. Malformed records are logged and skipped.
pub fn load_favorites_tsv(path: &Path) -> Result<Vec<Favorite>> {
    let mut reader = tsv_reader(path)?;
    let mut favorites = Vec::new();

    for (index, result) in reader.deserialize::<FavoriteRecord>().enumerate() {
        match result {
            Ok(record) => favorites.push(record.into()),
            Err(e) => warn!(record = index + 1, "Skipping malformed favorite record: {}", e),
        }
    }

    Ok(favorites)
}

/// Reads a JSON array of listening event records.
pub fn load_events_json(path: &Path) -> Result<Vec<ListeningEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

    let events = events_from_value(&value)
        .with_context(|| format!("Invalid events file: {}", path.display()))?;

    Ok(events)
}
