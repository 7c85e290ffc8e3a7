use std::fs;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;

use anstyle::Style;
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;

use frametrace::config::FrametraceConfig;
use frametrace::styling::{HINT_EMOJI, WARNING_EMOJI, eprintln, println};
use frametrace::timeline::{self, Aggregate, DrawOrder, DurationQuery, ReadOptions, RenderOptions};

/// Get the version string, trying git describe first, falling back to Cargo version
fn version_str() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        let git_version = env!("VERGEN_GIT_DESCRIBE");
        let cargo_version = env!("CARGO_PKG_VERSION");

        // Try to use git describe, fall back to Cargo version if it's the idempotent placeholder
        if git_version.contains("IDEMPOTENT") {
            cargo_version.to_string()
        } else {
            git_version.to_string()
        }
    })
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values for pandas/R
    Csv,
    /// One JSON object per row
    Json,
}

#[derive(Parser)]
#[command(name = "frametrace")]
#[command(about = "Frame-timing analysis for VR streaming logs", long_about = None)]
#[command(version = version_str())]
struct Cli {
    /// Enable verbose output (show reader progress and debug info)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Row filters shared by every subcommand. Unset flags fall back to the
/// config file, then to the built-in defaults.
#[derive(Debug, clap::Args)]
struct ReadArgs {
    /// Drop frames before this index and renumber the rest
    #[arg(long)]
    skip: Option<i64>,

    /// Drop events past this many milliseconds from the log origin
    /// (non-positive disables the filter)
    #[arg(long)]
    duration_ms: Option<i64>,
}

impl ReadArgs {
    fn resolve(&self, config: &FrametraceConfig) -> ReadOptions {
        ReadOptions {
            skip: self.skip.unwrap_or(config.skip),
            duration_ms: self.duration_ms.unwrap_or(config.duration_ms),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten frames into a row-per-frame table
    #[command(after_long_help = r#"EXAMPLES:
  # CSV pivot for pandas
  frametrace pivot timings.csv > timings-flat.csv

  # One row per display repetition, as JSON
  frametrace pivot timings.csv --per-repeat --format json

  # Drop the warm-up frames
  frametrace pivot timings.csv --skip 120
"#)]
    Pivot {
        /// Path to the timing log (reads from stdin if omitted or '-')
        file: Option<PathBuf>,

        /// Emit one row per (frame, repetition) instead of one per frame
        #[arg(long)]
        per_repeat: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Render an SVG timeline diagram
    #[command(after_long_help = r#"EXAMPLES:
  # Timeline for the first two seconds
  frametrace render timings.csv --duration-ms 2000 -o timeline.svg

  # Paint frames in capture order
  frametrace render timings.csv --draw-order oldest-first
"#)]
    Render {
        /// Path to the timing log (reads from stdin if omitted or '-')
        file: Option<PathBuf>,

        /// Which end of the capture paints first
        #[arg(long, value_enum)]
        draw_order: Option<DrawOrder>,

        /// Horizontal scale in pixels per millisecond
        #[arg(long)]
        pixels_per_ms: Option<f64>,

        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Per-frame durations between two events
    #[command(after_long_help = r#"EXAMPLES:
  # Motion-to-photon latency, one value per frame
  frametrace durations timings.csv

  # Encode time on stream 0, with summary statistics
  frametrace durations timings.csv --begin encode_begin --end encode_end --stream 0 --stats

  # Latest wake-up to latest display, reprojected frames only
  frametrace durations timings.csv --begin-agg max --flag reprojected
"#)]
    Durations {
        /// Path to the timing log (reads from stdin if omitted or '-')
        file: Option<PathBuf>,

        /// Begin event name (default from config, initially wake_up)
        #[arg(long)]
        begin: Option<String>,

        /// End event name (default from config, initially display)
        #[arg(long)]
        end: Option<String>,

        /// Cross-stream reduction for the begin event
        #[arg(long, value_enum, default_value_t = Aggregate::Min)]
        begin_agg: Aggregate,

        /// Cross-stream reduction for the end event
        #[arg(long, value_enum, default_value_t = Aggregate::Max)]
        end_agg: Aggregate,

        /// Restrict the query to one stream id
        #[arg(long)]
        stream: Option<u8>,

        /// Only frames whose flag set contains this token
        #[arg(long)]
        flag: Option<String>,

        /// Append summary statistics
        #[arg(long)]
        stats: bool,

        #[command(flatten)]
        read: ReadArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --verbose flag or RUST_LOG env var
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "off" }),
    )
    .init();

    if let Err(e) = run(cli.command) {
        // Timeline errors are already formatted with emoji and colors
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    let config = FrametraceConfig::load().context("Failed to load config")?;

    match command {
        Commands::Pivot {
            file,
            per_repeat,
            format,
            output,
            read,
        } => {
            let frames = read_frames(file.as_deref(), &read.resolve(&config))?;
            let table = timeline::pivot(&frames, per_repeat);
            let rendered = match format {
                OutputFormat::Csv => table.to_csv(),
                OutputFormat::Json => {
                    let mut json = table.to_json();
                    json.push('\n');
                    json
                }
            };
            write_output(output.as_deref(), &rendered)
        }

        Commands::Render {
            file,
            draw_order,
            pixels_per_ms,
            output,
            read,
        } => {
            let frames = read_frames(file.as_deref(), &read.resolve(&config))?;
            let options = RenderOptions {
                draw_order: draw_order.unwrap_or(config.render.draw_order),
                pixels_per_ms: pixels_per_ms.unwrap_or(config.render.pixels_per_ms),
            };
            let svg = timeline::render(&frames, &options);
            write_output(output.as_deref(), &svg)
        }

        Commands::Durations {
            file,
            begin,
            end,
            begin_agg,
            end_agg,
            stream,
            flag,
            stats,
            read,
        } => {
            let frames = read_frames(file.as_deref(), &read.resolve(&config))?;
            let query = DurationQuery {
                begin: begin.unwrap_or(config.durations.begin),
                end: end.unwrap_or(config.durations.end),
                stream,
                begin_aggregate: begin_agg,
                end_aggregate: end_agg,
            };
            debug!(
                "query {} ({}) -> {} ({}), stream {:?}",
                query.begin, query.begin_aggregate, query.end, query.end_aggregate, query.stream
            );
            let durations = timeline::durations(&frames, &query, flag.as_deref());

            if durations.is_empty() {
                eprintln!(
                    "{WARNING_EMOJI} No frame resolved {} -> {}",
                    query.begin, query.end
                );
                return Ok(());
            }

            for duration in &durations {
                println!("{duration:.3}");
            }

            if stats
                && let Some(stats) = timeline::summarize(&durations)
            {
                let bold = Style::new().bold();
                println!();
                println!("{bold}samples{bold:#} {}", stats.count);
                println!("{bold}mean{bold:#}    {:.3} ms", stats.mean);
                println!("{bold}p50{bold:#}     {:.3} ms", stats.p50);
                println!("{bold}p90{bold:#}     {:.3} ms", stats.p90);
                println!("{bold}p99{bold:#}     {:.3} ms", stats.p99);
                println!("{bold}max{bold:#}     {:.3} ms", stats.max);
            }
            Ok(())
        }
    }
}

/// Read the whole log from a file or stdin ('-' or no path).
fn read_frames(file: Option<&Path>, options: &ReadOptions) -> anyhow::Result<timeline::FrameSet> {
    let input = match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?,
        _ => {
            if std::io::stdin().is_terminal() {
                eprintln!(
                    "{HINT_EMOJI} Reading from stdin... (pipe a timing log or press Ctrl+D to end)"
                );
            }
            let mut content = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            content
        }
    };

    Ok(timeline::read_str(&input, options)?)
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Error writing {}", path.display()))
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
