use crate::insights::{derive_insights, month_name};
use crate::stats::*;
use crate::timefmt::format_timestamp_opt;
use anyhow::Result;

/// Render stats to a Markdown "wrapped" report.
pub fn render(stats: &StatsSummary) -> Result<String> {
    let mut output = String::new();

    // 1. Title
    render_header(&mut output, stats);

    if !stats.has_data() {
        output.push_str(&format!(
            "No listening activity found for {}.\n",
            stats.year
        ));
        return Ok(output);
    }

    // 2. Totals
    render_summary(&mut output, stats);

    // 3. Rankings
    render_top_artists(&mut output, &stats.top_artists);
    render_top_shows(&mut output, &stats.top_shows);
    render_top_days(&mut output, &stats.top_days);

    // 4. Activity
    render_activity(&mut output, stats);

    // 5. Insights
    render_insights(&mut output, stats);

    Ok(output)
}

fn render_header(output: &mut String, stats: &StatsSummary) {
    output.push_str(&format!("# 🎧 Your Listening Wrapped {}\n\n", stats.year));
}

fn render_summary(output: &mut String, stats: &StatsSummary) {
    output.push_str("### 📊 Summary\n");
    output.push_str(&format!(
        "- ⏱️ **Listening time:** {} minutes ({:.1} hours, {:.1} days)\n",
        format_number(stats.total_minutes.round() as i64),
        stats.total_hours,
        stats.total_days
    ));
    output.push_str(&format!(
        "- 🎵 **Sessions:** {}\n",
        format_number(stats.sessions as i64)
    ));
    output.push_str(&format!(
        "- 🎤 **Unique artists:** {}\n",
        format_number(stats.unique_artists as i64)
    ));
    output.push_str(&format!(
        "- 🎸 **Unique shows:** {}\n",
        format_number(stats.unique_shows as i64)
    ));
    if let Some(ref streak) = stats.streaks {
        output.push_str(&format!(
            "- 🔥 **Longest streak:** {} {} ({} → {})\n",
            streak.length,
            plural(streak.length, "day", "days"),
            streak.start,
            streak.end
        ));
    }
    if let Some(ref favorites) = stats.favorites {
        output.push_str(&format!(
            "- ⭐ **Favorites added:** {} artists, {} recordings\n",
            favorites.artists, favorites.recordings
        ));
    }
    output.push_str(&format!(
        "- 🗓️ **First / last listen:** {} / {}\n",
        format_timestamp_opt(stats.first_listen.as_ref()),
        format_timestamp_opt(stats.last_listen.as_ref())
    ));
    output.push_str(&format!(
        "- 📆 **Listening period:** {} {}\n",
        format_number(stats.listening_period_days as i64),
        plural(stats.listening_period_days, "day", "days")
    ));
    output.push_str(&format!(
        "\n*All sections below refer to the year {}.*\n\n",
        stats.year
    ));
}

fn render_top_artists(output: &mut String, artists: &[ArtistEntry]) {
    if artists.is_empty() {
        return;
    }

    output.push_str("### 🎤 Top artists\n");
    for (i, entry) in artists.iter().enumerate() {
        output.push_str(&format!(
            "{}. **{}** · {:.1} hours · {} {}\n",
            i + 1,
            entry.artist,
            entry.minutes / 60.0,
            format_number(entry.sessions as i64),
            plural(entry.sessions, "session", "sessions")
        ));
    }
    output.push('\n');
}

fn render_top_shows(output: &mut String, shows: &[ShowEntry]) {
    if shows.is_empty() {
        return;
    }

    output.push_str("### 🎸 Top shows\n");
    for (i, entry) in shows.iter().enumerate() {
        output.push_str(&format!(
            "{}. **{}** ({}){} · {:.1} hours · {} {}\n",
            i + 1,
            entry.show_id,
            entry.artist,
            show_details(entry),
            entry.minutes / 60.0,
            format_number(entry.sessions as i64),
            plural(entry.sessions, "listen", "listens")
        ));
    }
    output.push('\n');
}

/// " · date @ venue, location" with whichever parts are known.
fn show_details(entry: &ShowEntry) -> String {
    let place = [entry.venue.as_str(), entry.location.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    match (entry.show_date.is_empty(), place.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!(" · {}", entry.show_date),
        (true, false) => format!(" · {}", place),
        (false, false) => format!(" · {} @ {}", entry.show_date, place),
    }
}

fn render_top_days(output: &mut String, days: &[DayEntry]) {
    if days.is_empty() {
        return;
    }

    output.push_str("### 📅 Top listening days\n");
    output.push_str("| Date | Hours | Sessions |\n");
    output.push_str("| ---- | ----- | -------- |\n");
    for day in days {
        output.push_str(&format!(
            "| {} | {:.1} | {} |\n",
            day.date,
            day.minutes / 60.0,
            format_number(day.sessions as i64)
        ));
    }
    output.push('\n');
}

fn render_activity(output: &mut String, stats: &StatsSummary) {
    output.push_str("### 📈 Activity\n");

    if let Some(ref day) = stats.busiest_day {
        output.push_str("#### 🚀 Peaks\n");
        output.push_str(&format!(
            "- 📍 **Busiest day:** {} ({} minutes)\n\n",
            day.date,
            format_number(day.minutes.round() as i64)
        ));
    }

    // By weekday - horizontal display, minutes
    output.push_str("#### 📅 By weekday (minutes)\n");
    output.push_str("| Mon | Tue | Wed | Thu | Fri | Sat | Sun |\n");
    output.push_str("| --- | --- | --- | --- | --- | --- | --- |\n");
    output.push('|');
    for day in WEEKDAYS {
        let minutes = stats.day_of_week_breakdown.get(day).copied().unwrap_or(0.0);
        output.push_str(&format!(" {} |", format_number(minutes.round() as i64)));
    }
    output.push_str("\n\n");

    // By month - only months with listening
    if !stats.monthly_breakdown.is_empty() {
        output.push_str("#### 📆 By month\n");
        output.push_str("| Month | Hours | Sessions |\n");
        output.push_str("| ----- | ----- | -------- |\n");
        for entry in &stats.monthly_breakdown {
            output.push_str(&format!(
                "| {} | {:.1} | {} |\n",
                month_name(entry.month),
                entry.minutes / 60.0,
                format_number(entry.sessions as i64)
            ));
        }
        output.push('\n');
    }
}

fn render_insights(output: &mut String, stats: &StatsSummary) {
    let insights = derive_insights(stats);
    if insights.is_empty() {
        return;
    }

    output.push_str("### ✨ Insights\n");
    for insight in insights {
        output.push_str(&format!("- {}\n", insight));
    }
    output.push('\n');
}

fn plural(n: u32, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Format a number with thousand separators (raw integers, no abbreviation)
fn format_number(n: i64) -> String {
    let is_negative = n < 0;
    let abs_str = n.unsigned_abs().to_string();
    let mut grouped_rev = String::new();

    // Insert commas every three digits, starting from the right
    for (count, ch) in abs_str.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    let mut formatted: String = grouped_rev.chars().rev().collect();
    if is_negative {
        formatted.insert(0, '-');
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::event::ListeningEvent;

    fn sample() -> StatsSummary {
        let events = vec![
            ListeningEvent::new("2025-01-06 20:00:00", "Grateful Dead", "gd1977-05-08", 90.0),
            ListeningEvent::new("2025-01-07 21:00:00", "Grateful Dead", "gd1972-08-27", 1200.0),
            ListeningEvent::new("2025-02-08 09:00:00", "Phish", "ph1997-11-17", 60.0),
        ];
        aggregate(&events, 2025)
    }

    #[test]
    fn test_render_sections() {
        let report = render(&sample()).unwrap();

        assert!(report.starts_with("# 🎧 Your Listening Wrapped 2025\n"));
        assert!(
            report.contains("- ⏱️ **Listening time:** 1,350 minutes (22.5 hours, 0.9 days)")
        );
        assert!(report.contains("1. **Grateful Dead** · 21.5 hours · 2 sessions"));
        assert!(report.contains("2. **Phish** · 1.0 hours · 1 session\n"));
        assert!(report.contains("1. **gd1972-08-27** (Grateful Dead) · 20.0 hours · 1 listen"));
        assert!(report.contains("| 2025-01-07 | 20.0 | 1 |"));
        assert!(report.contains("- 📍 **Busiest day:** 2025-01-07 (1,200 minutes)"));
        assert!(report.contains("| 90 | 1,200 | 0 | 0 | 0 | 60 | 0 |"));
        assert!(report.contains("| January | 21.5 | 2 |"));
        assert!(report.contains("| February | 1.0 | 1 |"));
        assert!(report.contains("### ✨ Insights"));
        assert!(report.contains("- 🔥 **Longest streak:** 2 days (2025-01-06 → 2025-01-07)"));
        assert!(report.contains("- 📆 **Listening period:** 32 days"));
    }

    #[test]
    fn test_render_show_details() {
        let mut event = ListeningEvent::new("2025-01-06 20:00:00", "Grateful Dead", "gd77", 90.0);
        event.show_date = "1977-05-08".to_string();
        event.venue = "Barton Hall".to_string();
        event.location = "Ithaca, NY".to_string();
        let mut partial = ListeningEvent::new("2025-01-07 20:00:00", "Phish", "ph97", 30.0);
        partial.venue = "McNichols".to_string();

        let report = render(&aggregate(&[event, partial], 2025)).unwrap();
        assert!(report.contains(
            "1. **gd77** (Grateful Dead) · 1977-05-08 @ Barton Hall, Ithaca, NY · 1.5 hours"
        ));
        assert!(report.contains("2. **ph97** (Phish) · McNichols · 0.5 hours"));
    }

    #[test]
    fn test_render_empty_year() {
        let report = render(&aggregate(&[], 2024)).unwrap();
        assert!(report.contains("No listening activity found for 2024."));
        assert!(!report.contains("### 📊 Summary"));
    }

    #[test]
    fn test_render_favorites_line() {
        let mut stats = sample();
        stats.favorites = Some(FavoritesCount {
            artists: 2,
            recordings: 5,
        });
        let report = render(&stats).unwrap();
        assert!(report.contains("- ⭐ **Favorites added:** 2 artists, 5 recordings"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-4200), "-4,200");
    }
}
