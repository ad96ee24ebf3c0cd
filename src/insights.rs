/// Personalised one-line observations derived from a stats summary.
use chrono::{Month, Weekday};
use std::fmt;

use crate::stats::StatsSummary;

/// Recordings longer than this many minutes make an epic session.
const EPIC_RECORDING_MINUTES: f64 = 120.0;

/// Part of the day a listening hour falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=16 => DayPeriod::Afternoon,
            17..=20 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Insight {
    Streak(u32),
    TimeOfDay { period: DayPeriod, hour: u32 },
    /// Share of sessions on Saturday and Sunday, in percent.
    WeekendWarrior(f64),
    /// Share of sessions Monday to Friday, in percent.
    WeekdayListener(f64),
    Eclectic(u32),
    Superfan(String),
    Marathon { days: u32, max_hours: f64 },
    PeakMonth(u32),
    ConcertExplorer(u32),
    LoyalTo(String),
    CreatureOfHabit,
    FreeSpirit,
    ExplorerMode(u32),
    /// Share of sessions that played most of the recording, in percent.
    Completionist(f64),
    /// Share of partially played sessions, in percent.
    Sampler(f64),
    EpicSession { hours: f64 },
    DeepDive { artist: String, shows: u32 },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::Streak(days) => write!(f, "{}-day listening streak", days),
            Insight::TimeOfDay { period, hour } => match period {
                DayPeriod::Morning => write!(f, "Morning listener (peak at {}:00)", hour),
                DayPeriod::Afternoon => write!(f, "Afternoon vibes (peak at {}:00)", hour),
                DayPeriod::Evening => write!(f, "Evening sessions (peak at {}:00)", hour),
                DayPeriod::Night => write!(f, "Night owl (peak at {}:00)", hour),
            },
            Insight::WeekendWarrior(pct) => write!(f, "Weekend warrior - {:.0}% on Sat/Sun", pct),
            Insight::WeekdayListener(pct) => write!(f, "Weekday listener - {:.0}% Mon-Fri", pct),
            Insight::Eclectic(artists) => {
                write!(f, "Eclectic taste - {} different artists", artists)
            }
            Insight::Superfan(artist) => write!(f, "Superfan of {}", artist),
            Insight::Marathon { days, max_hours } => write!(
                f,
                "{} marathon listening days (max {:.1}h)",
                days, max_hours
            ),
            Insight::PeakMonth(month) => write!(f, "Peak listening month: {}", month_name(*month)),
            Insight::ConcertExplorer(venues) => {
                write!(f, "Concert explorer - {} different venues", venues)
            }
            Insight::LoyalTo(venue) => write!(f, "Loyal to {}", venue),
            Insight::CreatureOfHabit => {
                write!(f, "Creature of habit - consistent listening schedule")
            }
            Insight::FreeSpirit => write!(f, "Free spirit - listening at all hours"),
            Insight::ExplorerMode(artists) => {
                write!(f, "Explorer mode - discovered {} new artists", artists)
            }
            Insight::Completionist(pct) => {
                write!(f, "Completionist - {:.0}% shows heard fully", pct)
            }
            Insight::Sampler(pct) => write!(f, "Sampler - explores {:.0}% partial shows", pct),
            Insight::EpicSession { hours } => {
                write!(f, "Epic session - {:.1}h longest show", hours)
            }
            Insight::DeepDive { artist, shows } => {
                write!(f, "Deep dive - {} different {} shows", shows, artist)
            }
        }
    }
}

/// Full English month name for 1-12.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

/// Derives insights from a summary. Returns nothing for an empty year.
///
/// Shares and favourites are based on session counts, not minutes.
pub fn derive_insights(stats: &StatsSummary) -> Vec<Insight> {
    let mut insights = Vec::new();
    if !stats.has_data() {
        return insights;
    }
    let sessions = stats.sessions as f64;

    if let Some(streak) = &stats.streaks {
        if streak.length > 2 {
            insights.push(Insight::Streak(streak.length));
        }
    }

    if let Some(hour) = peak_hour(&stats.sessions_by_hour) {
        insights.push(Insight::TimeOfDay {
            period: DayPeriod::from_hour(hour),
            hour,
        });
    }

    let weekend = stats.weekday_sessions(Weekday::Sat) + stats.weekday_sessions(Weekday::Sun);
    let weekend_pct = weekend as f64 / sessions * 100.0;
    if weekend_pct > 60.0 {
        insights.push(Insight::WeekendWarrior(weekend_pct));
    } else if weekend_pct < 30.0 {
        insights.push(Insight::WeekdayListener(100.0 - weekend_pct));
    }

    let diversity = stats.unique_artists as f64 / sessions;
    if diversity > 0.5 {
        insights.push(Insight::Eclectic(stats.unique_artists));
    } else if diversity < 0.15 {
        if let Some(top) = &stats.most_played_artist {
            insights.push(Insight::Superfan(top.artist.clone()));
        }
    }

    if stats.marathon_days > 0 {
        let max_hours = stats
            .busiest_day
            .as_ref()
            .map_or(0.0, |day| day.minutes / 60.0);
        insights.push(Insight::Marathon {
            days: stats.marathon_days,
            max_hours,
        });
    }

    // earliest month wins ties
    let peak_month = stats
        .monthly_breakdown
        .iter()
        .fold(None::<(u32, u32)>, |best, entry| match best {
            Some((_, count)) if count >= entry.sessions => best,
            _ => Some((entry.month, entry.sessions)),
        });
    if let Some((month, _)) = peak_month {
        insights.push(Insight::PeakMonth(month));
    }

    if stats.unique_venues > 20 {
        insights.push(Insight::ConcertExplorer(stats.unique_venues));
    } else if stats.unique_venues < 5 {
        if let Some(venue) = &stats.top_venue {
            insights.push(Insight::LoyalTo(venue.clone()));
        }
    }

    match hour_spread(&stats.sessions_by_hour) {
        Some(spread) if spread < 3.0 => insights.push(Insight::CreatureOfHabit),
        Some(spread) if spread > 6.0 => insights.push(Insight::FreeSpirit),
        _ => {}
    }

    if stats.active_days > 30 && stats.new_artists > 5 {
        insights.push(Insight::ExplorerMode(stats.new_artists));
    }

    if let Some(completed) = stats.completed_sessions {
        let completed_pct = completed as f64 / sessions * 100.0;
        if completed_pct > 75.0 {
            insights.push(Insight::Completionist(completed_pct));
        } else if completed_pct < 25.0 {
            insights.push(Insight::Sampler(100.0 - completed_pct));
        }
    }

    if let Some(longest) = stats.longest_recording_minutes {
        if longest > EPIC_RECORDING_MINUTES {
            insights.push(Insight::EpicSession {
                hours: longest / 60.0,
            });
        }
    }

    if diversity < 0.15 {
        if let Some(top) = stats.most_played_artist.as_ref().filter(|top| top.shows > 10) {
            insights.push(Insight::DeepDive {
                artist: top.artist.clone(),
                shows: top.shows,
            });
        }
    }

    insights
}

/// Hour with the most sessions; the lowest hour wins ties.
fn peak_hour(sessions_by_hour: &[u32]) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (hour, &count) in sessions_by_hour.iter().enumerate() {
        if count == 0 {
            continue;
        }
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((hour as u32, count));
        }
    }
    best.map(|(hour, _)| hour)
}

/// Sample standard deviation of the session hours; `None` below two sessions.
fn hour_spread(sessions_by_hour: &[u32]) -> Option<f64> {
    let count: u32 = sessions_by_hour.iter().sum();
    if count < 2 {
        return None;
    }
    let weighted = || {
        sessions_by_hour
            .iter()
            .enumerate()
            .map(|(hour, &n)| (hour as f64, n as f64))
    };

    let mean = weighted().map(|(hour, n)| hour * n).sum::<f64>() / count as f64;
    let variance = weighted()
        .map(|(hour, n)| n * (hour - mean).powi(2))
        .sum::<f64>()
        / (count - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::event::ListeningEvent;

    fn event(ts: &str, artist: &str, minutes: f64) -> ListeningEvent {
        ListeningEvent::new(ts, artist, "show", minutes)
    }

    #[test]
    fn test_no_insights_for_empty_year() {
        assert!(derive_insights(&aggregate(&[], 2025)).is_empty());
    }

    #[test]
    fn test_day_period_boundaries() {
        assert_eq!(DayPeriod::from_hour(4), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(17), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(21), DayPeriod::Night);
    }

    #[test]
    fn test_superfan_weekend_streak_and_marathon() {
        // Saturday 2025-01-04 and Sunday 2025-01-05, then Monday
        let mut events = Vec::new();
        for day in 4..=6 {
            for hour in [21, 22, 23] {
                let minutes = if day == 6 { 5.0 } else { 100.0 };
                events.push(event(
                    &format!("2025-01-{:02} {}:00:00", day, hour),
                    "Grateful Dead",
                    minutes,
                ));
            }
        }

        let stats = aggregate(&events, 2025);
        let insights = derive_insights(&stats);

        assert_eq!(
            insights,
            vec![
                Insight::Streak(3),
                Insight::TimeOfDay {
                    period: DayPeriod::Night,
                    hour: 21
                },
                Insight::WeekendWarrior(6.0 / 9.0 * 100.0),
                Insight::Superfan("Grateful Dead".to_string()),
                Insight::Marathon {
                    days: 2,
                    max_hours: 5.0
                },
                Insight::PeakMonth(1),
                Insight::CreatureOfHabit,
            ]
        );
        assert_eq!(insights[2].to_string(), "Weekend warrior - 67% on Sat/Sun");
        assert_eq!(insights[4].to_string(), "2 marathon listening days (max 5.0h)");
    }

    #[test]
    fn test_eclectic_weekday_listener() {
        let events = vec![
            event("2025-03-03 08:00:00", "A", 30.0),
            event("2025-03-04 08:00:00", "B", 30.0),
            event("2025-05-05 08:00:00", "C", 60.0),
        ];

        let insights = derive_insights(&aggregate(&events, 2025));

        assert!(insights.contains(&Insight::Eclectic(3)));
        assert!(insights.contains(&Insight::WeekdayListener(100.0)));
        assert!(insights.contains(&Insight::TimeOfDay {
            period: DayPeriod::Morning,
            hour: 8
        }));
        assert!(insights.contains(&Insight::PeakMonth(3)));
        assert!(!insights.iter().any(|i| matches!(i, Insight::Streak(_))));
    }

    #[test]
    fn test_weekend_share_and_peak_month_count_sessions() {
        // one long Saturday session in June, three short weekday sessions in March
        let events = vec![
            event("2025-06-07 10:00:00", "A", 600.0),
            event("2025-03-03 10:00:00", "A", 5.0),
            event("2025-03-04 10:00:00", "A", 5.0),
            event("2025-03-05 10:00:00", "A", 5.0),
        ];

        let insights = derive_insights(&aggregate(&events, 2025));

        assert!(insights.contains(&Insight::WeekdayListener(75.0)));
        assert!(insights.contains(&Insight::PeakMonth(3)));
        assert!(!insights.iter().any(|i| matches!(i, Insight::WeekendWarrior(_))));
    }

    #[test]
    fn test_superfan_is_most_played_artist() {
        let mut events = vec![event("2025-02-01 10:00:00", "Long Jam", 900.0)];
        for day in 2..=15 {
            events.push(event(&format!("2025-02-{:02} 10:00:00", day), "Regular", 3.0));
        }

        let stats = aggregate(&events, 2025);
        assert_eq!(stats.top_artists[0].artist, "Long Jam");

        let insights = derive_insights(&stats);
        assert!(insights.contains(&Insight::Superfan("Regular".to_string())));
    }

    #[test]
    fn test_venue_insights() {
        let mut events: Vec<_> = (1..=4)
            .map(|d| event(&format!("2025-04-{:02} 10:00:00", d), "A", 10.0))
            .collect();
        for (event, venue) in events.iter_mut().zip(["Ryman", "Ryman", "Fillmore", "Ryman"]) {
            event.venue = venue.to_string();
        }

        let insights = derive_insights(&aggregate(&events, 2025));
        assert!(insights.contains(&Insight::LoyalTo("Ryman".to_string())));

        let mut stats = aggregate(&events, 2025);
        stats.unique_venues = 25;
        let insights = derive_insights(&stats);
        assert!(insights.contains(&Insight::ConcertExplorer(25)));
        assert_eq!(
            Insight::ConcertExplorer(25).to_string(),
            "Concert explorer - 25 different venues"
        );

        // no venue data, no venue insight
        let plain = aggregate(&[event("2025-04-01 10:00:00", "A", 10.0)], 2025);
        assert!(!derive_insights(&plain)
            .iter()
            .any(|i| matches!(i, Insight::LoyalTo(_) | Insight::ConcertExplorer(_))));
    }

    #[test]
    fn test_free_spirit_listening_at_all_hours() {
        let events: Vec<_> = [0, 4, 8, 12, 16, 20, 23]
            .iter()
            .map(|hour| event(&format!("2025-04-01 {:02}:00:00", hour), "A", 10.0))
            .collect();

        let insights = derive_insights(&aggregate(&events, 2025));
        assert!(insights.contains(&Insight::FreeSpirit));
        assert!(!insights.contains(&Insight::CreatureOfHabit));
    }

    #[test]
    fn test_hour_spread() {
        let mut by_hour = vec![0; 24];
        by_hour[10] = 1;
        assert_eq!(hour_spread(&by_hour), None);

        by_hour[12] = 1;
        let spread = hour_spread(&by_hour).unwrap();
        assert!((spread - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_explorer_mode_needs_a_month_of_activity() {
        let mut stats = aggregate(&[event("2025-04-01 10:00:00", "A", 10.0)], 2025);
        stats.new_artists = 8;
        stats.active_days = 30;
        assert!(!derive_insights(&stats).contains(&Insight::ExplorerMode(8)));

        stats.active_days = 31;
        assert!(derive_insights(&stats).contains(&Insight::ExplorerMode(8)));
    }

    #[test]
    fn test_completionist_sampler_and_epic_session() {
        let mut events: Vec<_> = (1..=4)
            .map(|d| event(&format!("2025-04-{:02} 10:00:00", d), "A", 10.0))
            .collect();
        for event in &mut events {
            event.completion = Some(0.95);
        }
        events[0].recording_minutes = Some(150.0);

        let insights = derive_insights(&aggregate(&events, 2025));
        assert!(insights.contains(&Insight::Completionist(100.0)));
        assert!(insights.contains(&Insight::EpicSession { hours: 2.5 }));
        assert_eq!(
            Insight::EpicSession { hours: 2.5 }.to_string(),
            "Epic session - 2.5h longest show"
        );

        for event in &mut events {
            event.completion = Some(0.1);
            event.recording_minutes = Some(90.0);
        }
        let insights = derive_insights(&aggregate(&events, 2025));
        assert!(insights.contains(&Insight::Sampler(100.0)));
        assert!(!insights.iter().any(|i| matches!(i, Insight::EpicSession { .. })));
        assert_eq!(
            Insight::Sampler(100.0).to_string(),
            "Sampler - explores 100% partial shows"
        );
    }

    #[test]
    fn test_deep_dive_into_top_artist() {
        let events: Vec<_> = (1..=24)
            .map(|i| {
                let mut e = event(&format!("2025-07-{:02} 20:00:00", i), "Grateful Dead", 60.0);
                e.show_date = format!("1977-05-{:02}", (i + 1) / 2);
                e.venue = "Barton Hall".to_string();
                e
            })
            .collect();

        let stats = aggregate(&events, 2025);
        assert_eq!(stats.most_played_artist.as_ref().unwrap().shows, 12);

        let insights = derive_insights(&stats);
        let deep_dive = Insight::DeepDive {
            artist: "Grateful Dead".to_string(),
            shows: 12,
        };
        assert!(insights.contains(&deep_dive));
        assert_eq!(deep_dive.to_string(), "Deep dive - 12 different Grateful Dead shows");
    }

    #[test]
    fn test_insight_display() {
        assert_eq!(Insight::Streak(7).to_string(), "7-day listening streak");
        assert_eq!(
            Insight::PeakMonth(12).to_string(),
            "Peak listening month: December"
        );
        assert_eq!(
            Insight::TimeOfDay {
                period: DayPeriod::Night,
                hour: 2
            }
            .to_string(),
            "Night owl (peak at 2:00)"
        );
        assert_eq!(
            Insight::CreatureOfHabit.to_string(),
            "Creature of habit - consistent listening schedule"
        );
        assert_eq!(Insight::LoyalTo("Ryman".into()).to_string(), "Loyal to Ryman");
    }

    #[test]
    fn test_month_name_out_of_range() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(13), "Unknown");
    }
}
