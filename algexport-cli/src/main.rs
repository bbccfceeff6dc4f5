use algexport_formats::{FormatRegistry, register_builtin};
use algexport_indexer::IndexerClient;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod address;
mod config;
mod export;
mod pacer;
mod state;

use config::{Config, UnknownKindPolicy};
use export::{ExportOptions, Exporter};
use state::StateStore;

#[derive(Parser, Debug)]
#[command(
    name = "algexport",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("ALGEXPORT_BUILD_SHA"), ")"),
    about = "Export Algorand account history as tax-tool CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export new transactions since the last run for one or more accounts
    Export {
        /// Comma-separated account addresses
        #[arg(short, long)]
        accounts: String,

        /// Output format (see `algexport formats`)
        #[arg(short, long)]
        format: Option<String>,

        /// Indexer base URL
        #[arg(short = 's', long)]
        server: Option<String>,

        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        api_key_header: Option<String>,

        /// Directory for the CSV files
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Minimum milliseconds between indexer requests
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Log and skip unrecognized transaction types instead of failing
        #[arg(long)]
        skip_unknown: bool,
    },

    /// List the available output formats
    Formats,

    /// Show the last exported round per format and account
    Status {
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Write a default ~/.algexport/config.toml if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut registry = FormatRegistry::new();
    register_builtin(&mut registry);

    match cli.command {
        Command::Export {
            accounts,
            format,
            server,
            api_key,
            api_key_header,
            out_dir,
            delay_ms,
            skip_unknown,
        } => {
            let mut cfg = config::load_config()?;
            if let Some(url) = server {
                cfg.indexer.url = url;
            }
            if api_key.is_some() {
                cfg.indexer.api_key = api_key;
            }
            if let Some(header) = api_key_header {
                cfg.indexer.api_key_header = header;
            }
            if let Some(f) = format {
                cfg.export.format = f;
            }
            if let Some(dir) = out_dir {
                cfg.export.out_dir = dir;
            }
            if let Some(ms) = delay_ms {
                cfg.export.request_delay_ms = ms;
            }
            if skip_unknown {
                cfg.export.on_unknown_kind = UnknownKindPolicy::Skip;
            }
            run_export(&cfg, &registry, &accounts).await?;
        }

        Command::Formats => {
            for name in registry.names() {
                println!("{name}");
            }
        }

        Command::Status { format } => {
            let cfg = config::load_config()?;
            show_status(&cfg, format.as_deref())?;
        }

        Command::InitConfig => {
            let path = config::config_path()?;
            if config::write_default_config(&path)? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

fn state_store(cfg: &Config) -> Result<StateStore> {
    let path = match &cfg.export.state_file {
        Some(p) => p.clone(),
        None => state::default_state_path()?,
    };
    Ok(StateStore::new(path))
}

async fn run_export(cfg: &Config, registry: &FormatRegistry, accounts: &str) -> Result<()> {
    // Everything here is checked before the first request or file write.
    let accounts = address::parse_accounts(accounts)?;
    if accounts.is_empty() {
        bail!("no accounts given (pass -a ADDR[,ADDR...])");
    }
    let Some(format) = registry.create(&cfg.export.format) else {
        bail!(
            "unknown format '{}' (available: {})",
            cfg.export.format,
            registry.names().join(", ")
        );
    };
    let client = IndexerClient::new(&cfg.indexer).context("configure indexer client")?;
    let store = state_store(cfg)?;
    let mut state = store.load()?;

    info!(
        indexer = client.base_url(),
        format = format.name(),
        accounts = accounts.len(),
        "starting export"
    );

    let options = ExportOptions {
        out_dir: cfg.export.out_dir.clone(),
        request_delay: Duration::from_millis(cfg.export.request_delay_ms),
        on_unknown_kind: cfg.export.on_unknown_kind,
    };
    let mut exporter = Exporter::new(&client, format.as_ref(), options);
    let summary = exporter.run(&accounts, &mut state, &store).await?;

    info!(
        accounts = summary.accounts,
        pages = summary.pages,
        records = summary.records,
        skipped = summary.skipped,
        files = summary.files.len(),
        "export complete"
    );
    Ok(())
}

fn show_status(cfg: &Config, format: Option<&str>) -> Result<()> {
    let store = state_store(cfg)?;
    let state = store.load()?;
    if state.is_empty() {
        println!("No checkpoints in {}", store.path().display());
        return Ok(());
    }

    let rows: Vec<_> = state
        .iter()
        .filter(|(f, _, _)| format.is_none_or(|want| want == *f))
        .collect();
    if rows.is_empty() {
        println!("No checkpoints for format '{}'", format.unwrap_or_default());
        return Ok(());
    }
    println!("{:<14} {:<58} {:>12}", "FORMAT", "ACCOUNT", "LAST ROUND");
    for (f, account, cursor) in rows {
        println!("{:<14} {:<58} {:>12}", f, account, cursor.last_round);
    }
    Ok(())
}
