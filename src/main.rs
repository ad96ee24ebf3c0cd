use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use wrapped::aggregator;
use wrapped::loader;
use wrapped::logging;
use wrapped::renderer::Format;
use wrapped::stats::StatsSummary;
use wrapped::window::YearWindow;

// Help text constants
const HELP_MAIN: &str = "\
wrapped — listening-history year in review

Commands:
    --export <path>      Aggregate an Archive.org listening history export.
    --json-stats <path>  Re-render a previously written stats JSON.

Usage:
    wrapped --export <path> [--year <YYYY>] [--render md,json] [--output <dir>]
    wrapped --json-stats <path> [--render md] [--output <dir>]

More help:
    wrapped --help export
    wrapped --help render";

const HELP_EXPORT: &str = "\
Aggregate an export

Usage:
    wrapped --export <path> [--year <YYYY>] [--render md,json] [--output <dir>] [--log-dir <dir>]

Options:
    --export <path>    Export directory (containing ListeningHistorySummary.tsv and
                       optionally Favorites.tsv), a summary .tsv file, or a JSON
                       event list.
    --year <YYYY>      Reporting year (default: current year, env WRAPPED_YEAR).
    --log-dir <dir>    Append logs to <dir>/wrapped.log instead of stderr.

Examples:
  wrapped --export ~/Downloads/listening-history --year 2025
  wrapped --export ListeningHistorySummary.tsv --render md --output reports";

const HELP_RENDER: &str = "\
Render reports (md,json)

Usage:
    wrapped --render [formats] (--export <path> | --json-stats <path>) [--output <dir>]

Options:
    --render [formats]   Comma-separated formats (md,json). Empty renders all.
    --json-stats <path>  Stats JSON written by an earlier run.
    --output <dir>       Output directory (default: current dir, env WRAPPED_OUTPUT).
                         Files are named wrapped-<year>.md and wrapped-<year>.json.";

#[derive(Parser)]
#[command(name = "wrapped", disable_help_flag = true)]
#[command(about = "Listening history year-in-review tool", long_about = None)]
struct Cli {
    /// Export directory or file to aggregate
    #[arg(long)]
    export: Option<PathBuf>,

    /// Reporting year (defaults to the current year)
    #[arg(long, env = "WRAPPED_YEAR")]
    year: Option<String>,

    /// Render formats (comma-separated: md,json). Renders all if no formats specified.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    render: Option<String>,

    /// Path to a stats JSON file written by an earlier run
    #[arg(long)]
    json_stats: Option<PathBuf>,

    /// Output directory (defaults to current directory)
    #[arg(short, long, env = "WRAPPED_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory for the log file (logs go to stderr when omitted)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Show help (global or per topic). Example: wrapped --help render
    #[arg(long, value_name = "TOPIC", num_args = 0..=1, default_missing_value = "")]
    help: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(help_topic) = cli.help {
        let topic = help_topic.trim();
        if topic.is_empty() {
            println!("{}", HELP_MAIN);
        } else if topic.eq_ignore_ascii_case("export") {
            println!("{}", HELP_EXPORT);
        } else if topic.eq_ignore_ascii_case("render") {
            println!("{}", HELP_RENDER);
        } else {
            println!("Unknown help topic: {}", topic);
        }
        return Ok(());
    }

    logging::init_logging(cli.log_dir.as_deref())?;

    // Load or build stats
    let stats = if let Some(json_path) = cli.json_stats {
        StatsSummary::load_from_file(&json_path)?
    } else if let Some(export_path) = cli.export {
        let window = match cli.year {
            Some(ref year) => YearWindow::parse(year)?,
            None => YearWindow::current()?,
        };
        info!("Reporting window: {} to {}", window.from, window.to);
        let export = loader::load_export(&export_path)?;
        aggregator::aggregate_export(&export, window.year)
    } else {
        eprintln!("No action specified. Use --export to aggregate a listening history export.");
        eprintln!("Example: wrapped --export ~/Downloads/listening-history --year 2025");
        return Ok(());
    };

    // Determine output directory
    let output_dir = cli.output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    // Parse formats
    let formats: Vec<&str> = match cli.render.as_deref() {
        None | Some("") => vec!["md", "json"],
        Some(render_arg) => render_arg.split(',').map(|s| s.trim()).collect(),
    };

    // Render each format
    for name in formats {
        let Some(format) = Format::parse(name) else {
            warn!("Unknown format '{}', skipping", name);
            eprintln!("Warning: Unknown format '{}', skipping", name);
            continue;
        };

        let rendered = format.render(&stats)?;
        let output_path = output_dir.join(format.filename(stats.year));
        std::fs::write(&output_path, rendered)
            .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
        info!("Wrote {}", output_path.display());
        eprintln!("Report written to: {}", output_path.display());
    }

    Ok(())
}
