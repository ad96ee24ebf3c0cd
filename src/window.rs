/// Reporting window handling.
///
/// Parses and validates the reporting year (e.g. '2025') given on the command
/// line and exposes its inclusive date boundaries.
use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};

/// A calendar year with its inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub year: i32,
    /// Start date (inclusive)
    pub from: NaiveDate,
    /// End date (inclusive)
    pub to: NaiveDate,
}

impl YearWindow {
    /// Parse a window string into a YearWindow.
    ///
    /// Only four-digit years between 1970 and 2099 are accepted.
    pub fn parse(window: &str) -> Result<Self> {
        let window = window.trim();
        let year = window.parse::<i32>().map_err(|_| {
            anyhow!(
                "Invalid year format: '{}'. Expected a year such as '2025'",
                window
            )
        })?;
        Self::for_year(year)
    }

    pub fn for_year(year: i32) -> Result<Self> {
        if !(1970..=2099).contains(&year) {
            return Err(anyhow!("Year out of range (1970-2099): {}", year));
        }
        let from =
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| anyhow!("Invalid year: {}", year))?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| anyhow!("Invalid year: {}", year))?;
        Ok(YearWindow { year, from, to })
    }

    /// The window for the current local year.
    pub fn current() -> Result<Self> {
        Self::for_year(Local::now().year())
    }
}
