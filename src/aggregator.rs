/// Listening statistics aggregation.
///
/// Turns listening events into a year-scoped `StatsSummary`.
/// Sums minutes per artist, show, weekday, month and day, ranks the top
/// entries and finds the busiest day and the longest listening streak.
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::error::InputShapeError;
use crate::event::{events_from_value, Export, Favorite, FavoriteKind, ListeningEvent};
use crate::stats::*;
use crate::timefmt::parse_timestamp;

const TOP_ARTISTS: usize = 10;
const TOP_SHOWS: usize = 5;
const TOP_DAYS: usize = 10;

/// Days above this many minutes count as marathon days.
const MARATHON_MINUTES: f64 = 240.0;

/// Sessions above this played fraction count as completed.
const COMPLETED_FRACTION: f64 = 0.8;

// ============================================================================
// Intermediate Aggregation Structs (private)
// ============================================================================

/// Minutes and session count for one key.
#[derive(Default)]
struct Bucket {
    minutes: f64,
    sessions: u32,
}

impl Bucket {
    fn record(&mut self, minutes: f64) {
        self.minutes += minutes;
        self.sessions += 1;
    }
}

/// Show totals plus the details of the first event folded into it.
struct ShowBucket {
    artist: String,
    show_date: String,
    venue: String,
    location: String,
    bucket: Bucket,
}

impl ShowBucket {
    fn from_event(event: &ListeningEvent) -> Self {
        Self {
            artist: event.artist_key().to_string(),
            show_date: event.show_date.clone(),
            venue: event.venue.clone(),
            location: event.location.clone(),
            bucket: Bucket::default(),
        }
    }
}

/// Play history of an artist with a non-empty name.
struct ArtistHistory {
    sessions: u32,
    first_heard: NaiveDate,
    shows: HashSet<(String, String)>,
}

/// Per-artist, per-show and per-venue accumulators used for rankings.
struct RankingAggregates {
    by_artist: HashMap<String, Bucket>,
    by_show: HashMap<String, ShowBucket>,
    by_venue: HashMap<String, u32>,
    named_artists: HashMap<String, ArtistHistory>,
}

impl RankingAggregates {
    fn new() -> Self {
        Self {
            by_artist: HashMap::new(),
            by_show: HashMap::new(),
            by_venue: HashMap::new(),
            named_artists: HashMap::new(),
        }
    }

    fn record(&mut self, ts: &NaiveDateTime, event: &ListeningEvent, minutes: f64) {
        self.by_artist
            .entry(event.artist_key().to_string())
            .or_default()
            .record(minutes);

        if !event.show_id.is_empty() {
            self.by_show
                .entry(event.show_id.clone())
                .or_insert_with(|| ShowBucket::from_event(event))
                .bucket
                .record(minutes);
        }

        if !event.venue.is_empty() {
            *self.by_venue.entry(event.venue.clone()).or_default() += 1;
        }

        if !event.artist.is_empty() {
            let history = self
                .named_artists
                .entry(event.artist.clone())
                .or_insert_with(|| ArtistHistory {
                    sessions: 0,
                    first_heard: ts.date(),
                    shows: HashSet::new(),
                });
            history.sessions += 1;
            if !event.show_date.is_empty() && !event.venue.is_empty() {
                history
                    .shows
                    .insert((event.show_date.clone(), event.venue.clone()));
            }
        }
    }
}

/// Time-bucketed accumulators.
struct TemporalAggregates {
    by_weekday: [Bucket; 7],
    by_month: BTreeMap<u32, Bucket>,
    by_day: BTreeMap<NaiveDate, Bucket>,
    by_hour: [u32; 24],
}

impl TemporalAggregates {
    fn new() -> Self {
        Self {
            by_weekday: Default::default(),
            by_month: BTreeMap::new(),
            by_day: BTreeMap::new(),
            by_hour: [0; 24],
        }
    }

    fn record(&mut self, ts: &NaiveDateTime, minutes: f64) {
        self.by_weekday[ts.weekday().num_days_from_monday() as usize].record(minutes);
        self.by_month.entry(ts.month()).or_default().record(minutes);
        self.by_day.entry(ts.date()).or_default().record(minutes);
        self.by_hour[ts.hour() as usize] += 1;
    }
}

/// Completion and recording length figures.
struct PlaybackAggregates {
    completed: u32,
    rated: u32,
    longest_recording: Option<f64>,
}

impl PlaybackAggregates {
    fn new() -> Self {
        Self {
            completed: 0,
            rated: 0,
            longest_recording: None,
        }
    }

    fn record(&mut self, event: &ListeningEvent) {
        if let Some(fraction) = event.completion.filter(|f| f.is_finite()) {
            self.rated += 1;
            if fraction > COMPLETED_FRACTION {
                self.completed += 1;
            }
        }

        if let Some(length) = event.recording_minutes.filter(|m| m.is_finite() && *m >= 0.0) {
            self.longest_recording = Some(self.longest_recording.map_or(length, |l| l.max(length)));
        }
    }
}

/// First and last retained timestamps.
struct CoverageBounds {
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl CoverageBounds {
    fn new() -> Self {
        Self {
            first: None,
            last: None,
        }
    }

    fn update(&mut self, ts: NaiveDateTime) {
        self.first = Some(self.first.map_or(ts, |first| first.min(ts)));
        self.last = Some(self.last.map_or(ts, |last| last.max(ts)));
    }

    fn period_days(&self) -> u32 {
        match (self.first, self.last) {
            (Some(first), Some(last)) => (last - first).num_days().max(0) as u32,
            _ => 0,
        }
    }
}

/// Builds the statistics summary for `year` from listening events.
///
/// Events outside `year` are ignored. Events with an unparseable timestamp are
/// skipped and counted in `skipped_rows`. Negative or missing durations count
/// as zero minutes but the event still marks its day as active.
///
/// Retained events are folded in a fixed order, so the summary does not depend
/// on the order of `events`.
pub fn aggregate(events: &[ListeningEvent], year: i32) -> StatsSummary {
    let mut skipped_rows: u32 = 0;
    let mut retained: Vec<(NaiveDateTime, &ListeningEvent)> = Vec::with_capacity(events.len());

    for event in events {
        let Some(ts) = parse_timestamp(&event.timestamp) else {
            skipped_rows += 1;
            continue;
        };
        if ts.year() == year {
            retained.push((ts, event));
        }
    }

    if skipped_rows > 0 {
        debug!(skipped_rows, "Skipped events with unparseable timestamps");
    }

    retained.sort_by(fold_order);

    let mut rankings = RankingAggregates::new();
    let mut temporal = TemporalAggregates::new();
    let mut playback = PlaybackAggregates::new();
    let mut coverage = CoverageBounds::new();
    let mut total_minutes = 0.0;

    for (ts, event) in &retained {
        let minutes = event.minutes();
        total_minutes += minutes;

        rankings.record(ts, event, minutes);
        temporal.record(ts, minutes);
        playback.record(event);
        coverage.update(*ts);
    }

    let sessions = retained.len() as u32;
    let unique_artists = rankings.named_artists.len() as u32;
    let unique_shows = rankings.by_show.len() as u32;
    let unique_venues = rankings.by_venue.len() as u32;
    let active_days = temporal.by_day.len() as u32;
    let new_artists = count_new_artists(&rankings.named_artists, &temporal.by_day);
    let top_venue = most_sessions(rankings.by_venue.iter().map(|(v, n)| (v.as_str(), *n)))
        .map(str::to_string);
    let most_played_artist = most_played(&rankings.named_artists);

    let top_artists = rank_top_artists(rankings.by_artist);
    let top_shows = rank_top_shows(rankings.by_show);
    let top_days = rank_top_days(&temporal.by_day);
    let streaks = longest_streak(temporal.by_day.keys().copied());
    let marathon_days = temporal
        .by_day
        .values()
        .filter(|day| day.minutes > MARATHON_MINUTES)
        .count() as u32;
    let (day_of_week_breakdown, day_of_week_sessions) =
        build_weekday_breakdown(&temporal.by_weekday);

    let total_hours = total_minutes / 60.0;
    let total_days = total_hours / 24.0;

    info!(
        year,
        sessions,
        skipped_rows,
        total_minutes,
        "Aggregated listening stats"
    );

    StatsSummary {
        schema_version: SCHEMA_VERSION,
        year,
        total_minutes,
        total_hours,
        total_days,
        sessions,
        skipped_rows,
        unique_artists,
        unique_shows,
        first_listen: coverage.first,
        last_listen: coverage.last,
        listening_period_days: coverage.period_days(),
        active_days,
        new_artists,
        unique_venues,
        top_venue,
        most_played_artist,
        top_artists,
        top_shows,
        busiest_day: top_days.first().cloned(),
        top_days,
        day_of_week_breakdown,
        day_of_week_sessions,
        monthly_breakdown: build_monthly_breakdown(temporal.by_month),
        sessions_by_hour: temporal.by_hour.to_vec(),
        streaks,
        marathon_days,
        completed_sessions: (playback.rated > 0).then_some(playback.completed),
        longest_recording_minutes: playback.longest_recording,
        favorites: None,
    }
}

/// Aggregates a JSON document of listening events.
///
/// Fails with `InputShapeError` when the document is not an array of records;
/// no partial summary is produced in that case.
pub fn aggregate_value(
    value: &serde_json::Value,
    year: i32,
) -> Result<StatsSummary, InputShapeError> {
    let events = events_from_value(value)?;
    Ok(aggregate(&events, year))
}

/// Aggregates a loaded export, including favorites added during `year`.
pub fn aggregate_export(export: &Export, year: i32) -> StatsSummary {
    let mut stats = aggregate(&export.events, year);
    stats.favorites = Some(count_favorites(&export.favorites, year));
    stats
}

/// Timestamp, then artist, show and minutes, then the show details.
fn fold_order(
    (a_ts, a): &(NaiveDateTime, &ListeningEvent),
    (b_ts, b): &(NaiveDateTime, &ListeningEvent),
) -> Ordering {
    a_ts.cmp(b_ts)
        .then_with(|| a.artist.cmp(&b.artist))
        .then_with(|| a.show_id.cmp(&b.show_id))
        .then_with(|| a.minutes().total_cmp(&b.minutes()))
        .then_with(|| a.show_date.cmp(&b.show_date))
        .then_with(|| a.venue.cmp(&b.venue))
        .then_with(|| a.location.cmp(&b.location))
}

// ============================================================================
// Helper Functions for Building Sections
// ============================================================================

fn build_weekday_breakdown(
    by_weekday: &[Bucket; 7],
) -> (IndexMap<String, f64>, IndexMap<String, u32>) {
    WEEKDAYS
        .iter()
        .zip(by_weekday.iter())
        .map(|(day, bucket)| {
            (
                (day.to_string(), bucket.minutes),
                (day.to_string(), bucket.sessions),
            )
        })
        .unzip()
}

/// Months come out of the BTreeMap in ascending order; only months with
/// events were ever inserted.
fn build_monthly_breakdown(by_month: BTreeMap<u32, Bucket>) -> Vec<MonthEntry> {
    by_month
        .into_iter()
        .map(|(month, bucket)| MonthEntry {
            month,
            minutes: bucket.minutes,
            sessions: bucket.sessions,
        })
        .collect()
}

/// Artists whose first active day falls in the second half of the active days.
/// Zero with fewer than two active days.
fn count_new_artists(
    artists: &HashMap<String, ArtistHistory>,
    by_day: &BTreeMap<NaiveDate, Bucket>,
) -> u32 {
    if by_day.len() < 2 {
        return 0;
    }
    let Some(midpoint) = by_day.keys().nth(by_day.len() / 2) else {
        return 0;
    };
    artists
        .values()
        .filter(|history| history.first_heard >= *midpoint)
        .count() as u32
}

fn most_played(artists: &HashMap<String, ArtistHistory>) -> Option<MostPlayedArtist> {
    let name = most_sessions(artists.iter().map(|(name, h)| (name.as_str(), h.sessions)))?;
    let history = &artists[name];
    Some(MostPlayedArtist {
        artist: name.to_string(),
        sessions: history.sessions,
        shows: history.shows.len() as u32,
    })
}

fn count_favorites(favorites: &[Favorite], year: i32) -> FavoritesCount {
    let mut count = FavoritesCount::default();
    for favorite in favorites {
        let in_year = parse_timestamp(&favorite.date_added).is_some_and(|ts| ts.year() == year);
        if !in_year {
            continue;
        }
        match favorite.kind {
            FavoriteKind::Artist => count.artists += 1,
            FavoriteKind::Recording => count.recordings += 1,
            FavoriteKind::Other => {}
        }
    }
    count
}

// ============================================================================
// Helper Functions for Ranking
// ============================================================================

/// Minutes descending, then name ascending.
fn by_minutes_then_name(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Key with the most sessions; the lowest name wins ties.
fn most_sessions<'a>(counts: impl Iterator<Item = (&'a str, u32)>) -> Option<&'a str> {
    counts
        .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(name, _)| name)
}

fn rank_top_artists(by_artist: HashMap<String, Bucket>) -> Vec<ArtistEntry> {
    let mut ranked: Vec<_> = by_artist.into_iter().collect();
    ranked.sort_by(|a, b| {
        by_minutes_then_name((a.1.minutes, a.0.as_str()), (b.1.minutes, b.0.as_str()))
    });

    ranked
        .into_iter()
        .take(TOP_ARTISTS)
        .map(|(artist, bucket)| ArtistEntry {
            artist,
            minutes: bucket.minutes,
            sessions: bucket.sessions,
        })
        .collect()
}

fn rank_top_shows(by_show: HashMap<String, ShowBucket>) -> Vec<ShowEntry> {
    let mut ranked: Vec<_> = by_show.into_iter().collect();
    ranked.sort_by(|a, b| {
        by_minutes_then_name(
            (a.1.bucket.minutes, a.0.as_str()),
            (b.1.bucket.minutes, b.0.as_str()),
        )
    });

    ranked
        .into_iter()
        .take(TOP_SHOWS)
        .map(|(show_id, show)| ShowEntry {
            show_id,
            artist: show.artist,
            show_date: show.show_date,
            venue: show.venue,
            location: show.location,
            minutes: show.bucket.minutes,
            sessions: show.bucket.sessions,
        })
        .collect()
}

/// Ranks days by minutes; the earliest date wins ties.
fn rank_top_days(by_day: &BTreeMap<NaiveDate, Bucket>) -> Vec<DayEntry> {
    let mut ranked: Vec<_> = by_day.iter().collect();
    ranked.sort_by(|a, b| b.1.minutes.total_cmp(&a.1.minutes).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_DAYS)
        .map(|(date, bucket)| DayEntry {
            date: *date,
            minutes: bucket.minutes,
            sessions: bucket.sessions,
        })
        .collect()
}

/// Longest run of consecutive dates. Expects ascending, distinct dates.
/// The earliest run wins ties.
fn longest_streak(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Streak> {
    let mut best: Option<Streak> = None;
    let mut current: Option<Streak> = None;

    for date in dates {
        current = match current {
            Some(mut run) if run.end.succ_opt() == Some(date) => {
                run.end = date;
                run.length += 1;
                Some(run)
            }
            _ => Some(Streak {
                length: 1,
                start: date,
                end: date,
            }),
        };

        if let Some(run) = &current {
            if best.as_ref().map_or(true, |b| run.length > b.length) {
                best = Some(run.clone());
            }
        }
    }

    best
}
