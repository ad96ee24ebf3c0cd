use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(test)]
use anyhow::{anyhow, bail};
#[cfg(test)]
use jsonschema::{Draft, JSONSchema};

pub const SCHEMA_VERSION: i32 = 1;

/// Weekday keys of `day_of_week_breakdown`, in display order.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Year-scoped listening statistics.
///
/// All numeric fields are unrounded; rounding happens at render time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatsSummary {
    pub schema_version: i32,
    pub year: i32,
    pub total_minutes: f64,
    pub total_hours: f64,
    pub total_days: f64,
    pub sessions: u32,
    pub skipped_rows: u32,
    pub unique_artists: u32,
    pub unique_shows: u32,
    pub first_listen: Option<NaiveDateTime>,
    pub last_listen: Option<NaiveDateTime>,
    /// Whole days between the first and last listen.
    pub listening_period_days: u32,
    /// Distinct dates with at least one event.
    pub active_days: u32,
    /// Artists first heard in the second half of the active days.
    pub new_artists: u32,
    pub unique_venues: u32,
    /// Venue with the most sessions.
    pub top_venue: Option<String>,
    /// Artist with the most sessions, which may differ from the top artist by minutes.
    pub most_played_artist: Option<MostPlayedArtist>,
    pub top_artists: Vec<ArtistEntry>,
    pub top_shows: Vec<ShowEntry>,
    pub top_days: Vec<DayEntry>,
    pub day_of_week_breakdown: IndexMap<String, f64>,
    pub day_of_week_sessions: IndexMap<String, u32>,
    pub monthly_breakdown: Vec<MonthEntry>,
    pub sessions_by_hour: Vec<u32>,
    pub busiest_day: Option<DayEntry>,
    pub streaks: Option<Streak>,
    pub marathon_days: u32,
    /// Sessions that played more than 80% of the recording; `None` when no
    /// event carries a completion fraction.
    pub completed_sessions: Option<u32>,
    pub longest_recording_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<FavoritesCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArtistEntry {
    pub artist: String,
    pub minutes: f64,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShowEntry {
    pub show_id: String,
    /// Artist of the earliest event for this show; the lowest name wins ties.
    /// The show metadata comes from the same event.
    pub artist: String,
    pub show_date: String,
    pub venue: String,
    pub location: String,
    pub minutes: f64,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MostPlayedArtist {
    pub artist: String,
    pub sessions: u32,
    /// Distinct (show date, venue) pairs heard from this artist.
    pub shows: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub minutes: f64,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonthEntry {
    /// Month number, 1-12.
    pub month: u32,
    pub minutes: f64,
    pub sessions: u32,
}

/// A run of consecutive calendar dates with at least one event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Streak {
    pub length: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct FavoritesCount {
    pub artists: u32,
    pub recordings: u32,
}

impl StatsSummary {
    /// Minutes listened on the given weekday.
    pub fn weekday_minutes(&self, day: Weekday) -> f64 {
        self.day_of_week_breakdown
            .get(WEEKDAYS[day.num_days_from_monday() as usize])
            .copied()
            .unwrap_or(0.0)
    }

    /// Sessions on the given weekday.
    pub fn weekday_sessions(&self, day: Weekday) -> u32 {
        self.day_of_week_sessions
            .get(WEEKDAYS[day.num_days_from_monday() as usize])
            .copied()
            .unwrap_or(0)
    }

    pub fn has_data(&self) -> bool {
        self.sessions > 0
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;

        let stats: StatsSummary = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

        Ok(stats)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize stats to JSON")
    }

    #[cfg(test)]
    /// Validate stats JSON against the JSON schema
    pub fn validate_with_schema(stats_json: &serde_json::Value, schema: &JSONSchema) -> Result<()> {
        match schema.validate(stats_json) {
            Ok(_) => Ok(()),
            Err(errors) => {
                let error_messages: Vec<String> = errors
                    .map(|e| format!("  - {}: {}", e.instance_path, e))
                    .collect();
                bail!("Stats validation failed:\n{}", error_messages.join("\n"))
            }
        }
    }

    #[cfg(test)]
    /// Load and compile the JSON schema
    pub fn load_schema(schema_path: &Path) -> Result<JSONSchema> {
        let schema_content = std::fs::read_to_string(schema_path)
            .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;

        let schema_json: serde_json::Value =
            serde_json::from_str(&schema_content).with_context(|| {
                format!(
                    "Failed to parse schema JSON from: {}",
                    schema_path.display()
                )
            })?;

        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .map_err(|e| anyhow!("Failed to compile JSON schema: {}", e))
    }
}
