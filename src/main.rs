use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use setheard::Tracker;
use setheard::config::AppConfig;
use setheard::models::AnalysisRow;
use setheard::snapshot::{DirSource, HttpSource, SnapshotSource};

#[derive(Parser)]
#[command(name = "setheard", version, about = "Which songs have you heard live?")]
struct Cli {
    /// Directory containing the snapshot JSON files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL serving the snapshot JSON files
    #[arg(long, global = true, conflicts_with = "data_dir")]
    base_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show snapshot totals
    Stats,

    /// Search shows by performance name or venue (substring match)
    Search {
        query: String,

        /// Number of results (defaults to config search_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Songs heard across the given shows
    Analyze {
        /// Show ids
        #[arg(required = true)]
        show_ids: Vec<i64>,

        /// List songs never heard at these shows instead
        #[arg(short, long)]
        reverse: bool,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// List shows grouped by tour or year
    Groups,

    /// Write a normalized copy of the snapshot
    Export {
        /// Output directory
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    // Resolve snapshot source: CLI > config > XDG default
    let base_url = if cli.data_dir.is_some() {
        None
    } else {
        cli.base_url.or_else(|| config.base_url.clone())
    };
    let source: Arc<dyn SnapshotSource> = if let Some(url) = base_url {
        Arc::new(HttpSource::new(&url, config.http_timeout()))
    } else {
        let dir = cli
            .data_dir
            .or(config.data_dir.clone())
            .unwrap_or_else(setheard::config::default_data_dir);
        Arc::new(DirSource::new(dir))
    };
    log::info!("Snapshot: {}", source.describe());

    let tracker = Tracker::from_config(&config, source).context("Invalid group rules in config")?;

    match cli.command {
        Commands::Stats => {
            let stats = tracker.get_stats().await.context("Failed to load snapshot")?;
            if cli.json {
                return print_json(&stats);
            }
            println!("Snapshot Statistics");
            println!("===================");
            println!("Source:        {}", tracker.source_description());
            println!("Shows:         {}", stats.total_shows);
            println!("Songs:         {}", stats.total_songs);
            println!("Performances:  {}", stats.total_performances);
        }

        Commands::Search { query, limit } => {
            let tracker = match limit {
                Some(n) => tracker.with_search_limit(n),
                None => tracker,
            };
            let shows = tracker.search_shows(&query).await.context("Search failed")?;
            if cli.json {
                return print_json(&shows);
            }

            if shows.is_empty() {
                println!("No shows matching \"{}\".", query);
                return Ok(());
            }

            println!("{:>6} {:>10}  {:<40} {}", "Id", "Date", "Performance", "Venue");
            println!("{}", "-".repeat(90));
            for s in &shows {
                println!(
                    "{:>6} {:>10}  {:<40} {}",
                    s.id,
                    s.date,
                    truncate(&s.performance_name, 40),
                    s.venue
                );
            }
        }

        Commands::Analyze { show_ids, reverse, limit } => {
            if reverse {
                let result = tracker
                    .analyze_reverse_songs(&show_ids)
                    .await
                    .context("Analysis failed")?;
                if cli.json {
                    return print_json(&result);
                }
                println!(
                    "Never heard: {} of {} songs ({:.1}%)",
                    result.never_heard_songs,
                    result.total_songs,
                    result.completion_rate * 100.0
                );
                println!();
                print_song_table(&result.songs, limit);
            } else {
                let result = tracker
                    .analyze_songs(&show_ids)
                    .await
                    .context("Analysis failed")?;
                if cli.json {
                    return print_json(&result);
                }
                println!(
                    "Heard: {} of {} songs ({:.1}%) across {} selected shows",
                    result.heard_songs,
                    result.total_songs,
                    result.completion_rate * 100.0,
                    show_ids.len()
                );
                println!();
                print_song_table(&result.songs, limit);
            }
        }

        Commands::Groups => {
            let groups = tracker.grouped_shows().await.context("Failed to load snapshot")?;
            if cli.json {
                return print_json(&groups);
            }
            for group in &groups {
                println!("{} ({} shows)", group.group_name, group.shows.len());
                for s in &group.shows {
                    println!("  {:>6} {:>10}  {}", s.id, s.date, s.performance_name);
                }
            }
        }

        Commands::Export { out_dir } => {
            let catalog = tracker.catalog().await.context("Failed to load snapshot")?;
            let meta = setheard::snapshot::writer::write_dir(&out_dir, &catalog.snapshot, None)
                .context("Export failed")?;
            println!(
                "Exported {} shows, {} songs, {} performances to {}",
                meta.total_shows,
                meta.total_songs,
                meta.total_performances,
                out_dir.display()
            );
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print analysis rows, at most `limit` of them.
fn print_song_table(rows: &[AnalysisRow], limit: usize) {
    if rows.is_empty() {
        println!("No songs.");
        return;
    }

    println!(
        "{:<30} {:>4} {:>5} {:>6}  {:>10}  {}",
        "Song", "Hits", "Total", "Rate", "Latest", "Performance"
    );
    println!("{}", "-".repeat(95));

    for r in rows.iter().take(limit) {
        println!(
            "{:<30} {:>4} {:>5} {:>6.3}  {:>10}  {}",
            truncate(&r.song_name, 30),
            r.hit_count,
            r.total_appearances,
            r.selection_rate,
            r.latest_date,
            r.latest_performance,
        );
    }

    if rows.len() > limit {
        println!("... {} more", rows.len() - limit);
    }
}

/// Truncate on a char boundary, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
