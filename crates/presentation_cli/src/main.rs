//! Korea bus arrival CLI
//!
//! Command-line host for stop setup and arrival monitoring.

#![allow(clippy::print_stdout)]

mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use application::{FormError, SetupFlow, set_scan_interval};
use clap::{Parser, Subcommand};
use domain::StopId;
use infrastructure::{AppConfig, DEFAULT_CONFIG_FILE, KakaoBusAdapter, init_logging};

/// Korea bus arrival CLI
#[derive(Debug, Parser)]
#[command(name = "korea-bus")]
#[command(author, version, about = "Korean bus arrival monitor", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file
    #[arg(short, long, env = "KOREA_BUS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search bus stops by name
    Search {
        /// Stop name, e.g. "광화문"
        name: String,
    },

    /// List the lines serving a stop
    Lines {
        /// Stop id, e.g. BS219257
        stop_id: String,
    },

    /// Check that lines are currently reported at a stop
    Validate {
        /// Stop id
        #[arg(short, long)]
        stop: String,

        /// Line number (repeatable)
        #[arg(short, long = "line", required = true)]
        lines: Vec<String>,
    },

    /// Add a stop to the configuration file
    ///
    /// Example: korea-bus setup --stop-name 광화문 --pick 2 --line 720 --line 9
    Setup {
        /// Stop name to search for
        #[arg(long)]
        stop_name: String,

        /// Which search result to use (1-based)
        #[arg(long, default_value = "1")]
        pick: usize,

        /// Line number (repeatable)
        #[arg(short, long = "line", required = true)]
        lines: Vec<String>,

        /// Display name used as sensor name prefix
        #[arg(long)]
        name: Option<String>,

        /// Poll interval override in seconds
        #[arg(long, allow_negative_numbers = true)]
        scan_interval: Option<i64>,
    },

    /// Poll configured stops and print sensor states as JSON
    Watch {
        /// Watch this stop instead of the configured ones
        #[arg(short, long, requires = "lines")]
        stop: Option<String>,

        /// Line number for --stop (repeatable)
        #[arg(short, long = "line")]
        lines: Vec<String>,

        /// Poll interval override in seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Fetch once, print and exit
        #[arg(long)]
        once: bool,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Report a form error by key and exit
fn exit_with(err: FormError) -> ! {
    println!("❌ {}", err.key());
    std::process::exit(1);
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_from(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    if cli.verbose > 0 {
        config.logging.filter = log_filter_from_verbosity(cli.verbose).to_string();
    }
    init_logging(&config.logging)?;

    let adapter = Arc::new(KakaoBusAdapter::new(&config.api)?);
    let flow = SetupFlow::new(Arc::clone(&adapter) as _, Arc::clone(&adapter) as _);

    match cli.command {
        Commands::Search { name } => {
            let stops = flow.search_stops(&name).await.unwrap_or_else(|e| exit_with(e));

            println!("🚏 Bus stops matching \"{name}\":");
            for (index, stop) in stops.iter().enumerate() {
                println!("{:>3}. {}  {}", index + 1, stop.stop_id, stop);
                println!("     {} [{}]", stop.location, stop.bus_types.join(", "));
            }
        },

        Commands::Lines { stop_id } => {
            let stop_id =
                StopId::new(stop_id).unwrap_or_else(|_| exit_with(FormError::InvalidBusStopId));
            let lines = flow.list_lines(&stop_id).await.unwrap_or_else(|e| exit_with(e));

            println!("🚌 Lines at {stop_id}:");
            for line in lines {
                println!("   {line}");
            }
        },

        Commands::Validate { stop, lines } => {
            let (stop_id, lines) = flow
                .validate(&stop, &lines)
                .await
                .unwrap_or_else(|e| exit_with(e));

            let lines: Vec<_> = lines.iter().map(ToString::to_string).collect();
            println!("✅ {stop_id}: {}", lines.join(", "));
        },

        Commands::Setup {
            stop_name,
            pick,
            lines,
            name,
            scan_interval,
        } => {
            let stops = flow
                .search_stops(&stop_name)
                .await
                .unwrap_or_else(|e| exit_with(e));

            let Some(stop) = pick.checked_sub(1).and_then(|i| stops.get(i)) else {
                bail!("--pick {pick} is out of range (1..={})", stops.len());
            };
            println!("🚏 Using {} ({})", stop, stop.stop_id);

            let mut entry = flow
                .create_entry(stop.stop_id.as_str(), &lines, name, &config.stops)
                .await
                .unwrap_or_else(|e| exit_with(e));
            if let Some(seconds) = scan_interval {
                set_scan_interval(&mut entry, seconds).unwrap_or_else(|e| exit_with(e));
            }

            let unique_id = entry.unique_id();
            config.stops.push(entry);
            config.save(&cli.config)?;

            println!("✅ Added {unique_id} to {}", cli.config.display());
        },

        Commands::Watch {
            stop,
            lines,
            interval,
            once,
        } => {
            let entries = match stop {
                Some(stop) => vec![watch::adhoc_entry(&stop, &lines)?],
                None => config.stops.clone(),
            };
            if entries.is_empty() {
                bail!(
                    "no stops configured in {}; run `korea-bus setup` or pass --stop",
                    cli.config.display()
                );
            }

            let options = watch::WatchOptions {
                interval,
                default_interval_secs: config.polling.default_scan_interval_secs,
                once,
            };
            watch::run(adapter, &entries, &options).await?;
        },
    }

    Ok(())
}
