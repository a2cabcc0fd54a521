mod watch;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use powerpoll::client::HttpEndpointClient;
use powerpoll::config::{Config, ConfigOverrides};
use powerpoll::services::AggregationEngine;

/// Utility-billing snapshot poller
#[derive(Parser)]
#[command(name = "powerpoll")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (default: ~/.powerpoll/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Consumer number of the account
    #[arg(long, global = true)]
    cons_no: Option<String>,

    /// Base URL of the billing service API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Polling interval
    #[arg(long, global = true, value_name = "MINUTES")]
    interval: Option<u64>,

    /// Per-request timeout
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one update cycle and print the snapshot as JSON
    Fetch {
        /// Print only the snapshot's field names
        #[arg(long)]
        keys: bool,
    },

    /// Poll on the configured interval, printing one JSON line per update
    Watch,

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    /// Log to stderr; `RUST_LOG` wins over `--log-level`
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("powerpoll={}", self.opts.log_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.opts.load_config()?;

        match self.command {
            Commands::Fetch { keys } => fetch(&config, keys).await,
            Commands::Watch => watch::run(&config).await,
            Commands::Config { save } => {
                println!("{}", serde_json::to_string_pretty(&config)?);
                if save {
                    let path = self.opts.config_path()?;
                    config.save(&path)?;
                    tracing::info!("Saved config to {}", path.display());
                }
                Ok(())
            }
        }
    }
}

impl GlobalOpts {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            cons_no: self.cons_no.clone(),
            scan_interval_minutes: self.interval,
            base_url: self.base_url.clone(),
            request_timeout_secs: self.timeout,
        }
    }

    fn config_path(&self) -> powerpoll::types::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::default_path(),
        }
    }

    fn load_config(&self) -> powerpoll::types::Result<Config> {
        Ok(Config::load(self.config.as_deref())?.with_overrides(self.overrides()))
    }
}

async fn fetch(config: &Config, keys: bool) -> anyhow::Result<()> {
    config.validate()?;
    let engine = AggregationEngine::new(HttpEndpointClient::from_config(config)?);
    let snapshot = engine.run_cycle_now().await?;

    if keys {
        for key in snapshot.keys() {
            println!("{}", key);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    }
    Ok(())
}
