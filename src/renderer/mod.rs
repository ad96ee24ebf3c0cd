pub mod md;

use anyhow::Result;

use crate::stats::StatsSummary;

/// Output formats the CLI can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
}

impl Format {
    /// Parses a format name; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "md" => Some(Format::Markdown),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn filename(self, year: i32) -> String {
        match self {
            Format::Markdown => format!("wrapped-{}.md", year),
            Format::Json => format!("wrapped-{}.json", year),
        }
    }

    pub fn render(self, stats: &StatsSummary) -> Result<String> {
        match self {
            Format::Markdown => md::render(stats),
            Format::Json => stats.to_json_pretty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(Format::parse("md"), Some(Format::Markdown));
        assert_eq!(Format::parse(" json "), Some(Format::Json));
        assert_eq!(Format::parse("html"), None);
    }

    #[test]
    fn test_filenames() {
        assert_eq!(Format::Markdown.filename(2025), "wrapped-2025.md");
        assert_eq!(Format::Json.filename(2025), "wrapped-2025.json");
    }
}
