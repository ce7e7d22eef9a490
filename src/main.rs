use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livewire_analytics::api::{build_router, state::AppState};
use livewire_analytics::config::{AppConfig, DataMode};
use livewire_analytics::fetch::{GridClient, GridClientConfig};
use livewire_analytics::source::StatsService;

#[derive(Parser)]
#[command(name = "livewire")]
#[command(about = "Esports series analytics over GRID data")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Data mode override (live, mock)
    #[arg(long)]
    mode: Option<DataMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a stats report from a series document on disk
    Stats {
        /// Path to a JSON series document (optionally wrapped in seriesState)
        file: PathBuf,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Download a series end-state document
    Download {
        /// GRID series id
        series_id: String,

        /// Write the document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Bypass the download cache
        #[arg(long)]
        fresh: bool,
    },

    /// List series from the configured source
    LiveSeries {
        /// Number of series to list
        #[arg(long, default_value = "10")]
        first: u32,
    },

    /// Start the API server
    Serve {
        /// Bind address (defaults to the config file's server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port number (defaults to the config file's server.port)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries command output
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(log_level, cli.json_logs);

    tracing::info!(
        "Starting livewire v{} ({} mode)",
        env!("CARGO_PKG_VERSION"),
        config.mode
    );

    match cli.command {
        Commands::Stats { file, pretty } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document: serde_json::Value = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let service = StatsService::from_config(&config)?;
            let report = service.compute(&document)?;
            match report.winner() {
                Some(team) => {
                    tracing::info!("{}: won by {}", report.overview.title, team.name);
                    if let Some(metrics) = team.id.as_deref().and_then(|id| report.team_metrics(id)) {
                        tracing::info!(
                            "{}: RTE {} / OPE {} / DSV {} over {} rounds",
                            team.name,
                            metrics.round_timing_efficiency,
                            metrics.ope,
                            metrics.dsv,
                            metrics.total_rounds
                        );
                    }
                }
                None => tracing::info!("{}: no decided winner", report.overview.title),
            }

            let output = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", output);
        }
        Commands::Download {
            series_id,
            out,
            fresh,
        } => {
            let document = match config.mode {
                DataMode::Live => {
                    let client = GridClient::new(GridClientConfig::from_app_config(&config)?)?;
                    let download = if fresh {
                        client.download_series_fresh(&series_id).await?
                    } else {
                        client.download_series(&series_id).await?
                    };
                    tracing::info!(
                        "Series {} fetched at {}{}",
                        download.series_id,
                        download.fetched_at.to_rfc3339(),
                        if download.from_cache { " (cached)" } else { "" }
                    );
                    download.document
                }
                DataMode::Mock => {
                    let service = StatsService::from_config(&config)?;
                    service.raw_series(&series_id).await?
                }
            };

            write_output(out.as_deref(), &serde_json::to_string_pretty(&document)?)?;
        }
        Commands::LiveSeries { first } => {
            let service = StatsService::from_config(&config)?;
            let listings = service.list_series(first).await?;

            if listings.is_empty() {
                println!("No series found");
            }
            for listing in &listings {
                println!(
                    "{:<10} {:<40} {:<24} {}",
                    listing.id,
                    listing.matchup(),
                    listing.tournament.as_deref().unwrap_or("-"),
                    listing.start_time_scheduled.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let service = StatsService::from_config(&config)?;
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let app = build_router(AppState::new(config, service));

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
