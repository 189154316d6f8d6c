//! ipwatch - keeps DNS records pointed at the current public IP.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ipwatch::cache::IpCache;
use ipwatch::config::Config;
use ipwatch::daemon::{Daemon, TickOutcome};
use ipwatch::detector::IpDetector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipwatch")]
#[command(about = "Watches the public IP and updates DNS records when it changes")]
#[command(version)]
struct Cli {
    /// Path to config file. Without one, the default locations and then the
    /// environment are used.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the IP and update records until interrupted (default)
    Run {
        /// Check interval in seconds, overriding the configuration
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single check and exit
    Once,

    /// Show the current and cached IP
    Status,

    /// Validate configuration and resolve every record
    Validate,

    /// Print an example configuration file
    ExampleConfig,
}

fn init_logging(debug: bool) {
    let debug = debug
        || std::env::var("DEBUG")
            .map(|v| !v.is_empty() && v != "0")
            .unwrap_or(false);
    let default_level = if debug { "ipwatch=debug" } else { "ipwatch=info" };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    Config::discover(path.map(PathBuf::as_path)).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command.unwrap_or(Commands::Run { interval: None }) {
        Commands::Run { interval } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(interval) = interval {
                config.check_interval_secs = interval;
                config.validate()?;
            }
            cmd_run(config).await?;
        }
        Commands::Once => {
            let config = load_config(cli.config.as_ref())?;
            cmd_once(config).await?;
        }
        Commands::Status => {
            let config = load_config(cli.config.as_ref())?;
            cmd_status(config).await?;
        }
        Commands::Validate => {
            let config = load_config(cli.config.as_ref())?;
            cmd_validate(config).await?;
        }
        Commands::ExampleConfig => {
            print!("{}", Config::example().to_toml()?);
        }
    }

    Ok(())
}

async fn cmd_run(config: Config) -> anyhow::Result<()> {
    let daemon = Daemon::start(&config).await?;

    tokio::select! {
        _ = daemon.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

async fn cmd_once(config: Config) -> anyhow::Result<()> {
    let daemon = Daemon::start(&config).await?;

    match daemon.tick().await {
        TickOutcome::FetchFailed => anyhow::bail!("Could not detect the public IP"),
        TickOutcome::CacheUnreadable => anyhow::bail!(
            "Could not read the IP cache at {}",
            daemon.cache().path().display()
        ),
        TickOutcome::Unchanged { ip } => println!("{} (unchanged)", ip),
        TickOutcome::Applied {
            ip,
            updated,
            failed,
            ..
        } => {
            println!("{}: {} record(s) updated, {} failed", ip, updated, failed);
            if failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn cmd_status(config: Config) -> anyhow::Result<()> {
    let detector = IpDetector::new(config.ip_source.clone(), config.http_timeout())?;
    let cache = IpCache::new(&config.cache_file);

    println!("ipwatch Status");
    println!("==============\n");

    println!("Site:       {}", config.site_name);
    println!("Provider:   {}", config.provider.name());
    println!("IP source:  {}", detector.source());

    match detector.fetch().await {
        Ok(ip) => println!("Current IP: {}", ip),
        Err(e) => println!("Current IP: failed to detect ({})", e),
    }

    match cache.load().await {
        Ok(Some(ip)) => println!("Cached IP:  {}", ip),
        Ok(None) => println!("Cached IP:  (none)"),
        Err(e) => println!("Cached IP:  {}", e),
    }

    println!("\nRecords:");
    for name in config.record_names() {
        println!("  {}", name);
    }

    Ok(())
}

async fn cmd_validate(config: Config) -> anyhow::Result<()> {
    println!("Validating configuration...\n");

    let daemon = match Daemon::start(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            println!("FAILED - {}", e);
            std::process::exit(1);
        }
    };

    let records = daemon.records();
    for record in &records.records {
        println!(
            "  {}: {}",
            record.qualified(records.domain.as_deref()),
            record.id.as_deref().unwrap_or("-")
        );
    }

    println!(
        "\nAll {} record(s) resolved via {}.",
        records.len(),
        config.provider.name()
    );
    Ok(())
}
