//! Listload CLI - Upload CSV columns as remote keyword lists
//!
//! # Main Commands
//!
//! ```bash
//! listload sync                        # Sync the CSV named in config.json
//! listload sync --csv lists.csv        # Sync another CSV
//! listload sync --dry-run              # Log payloads, send nothing
//! listload sync --delimiter auto       # Guess the delimiter from the header
//! listload serve                       # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! listload parse lists.csv             # Show the dataset a CSV loads to
//! listload fetch                       # Show the lists on the service
//! ```

use clap::{Parser, Subcommand};
use listload::{
    parse_csv_file_auto, sync_csv, Delimiter, HttpListApi, ListApi, SyncConfig, SyncError,
    SyncMode, DEFAULT_CONFIG_PATH,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "listload")]
#[command(about = "Upload CSV columns as remote keyword lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every CSV column to the list API
    Sync {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// CSV file (default: csv_path from the config)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Field delimiter: one character, "tab" or "auto"
        #[arg(short, long, default_value_t = Delimiter::default())]
        delimiter: Delimiter,

        /// Fetch existing lists but only log the writes
        #[arg(long)]
        dry_run: bool,
    },

    /// Load a CSV file and print the dataset as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Field delimiter: one character, "tab" or "auto"
        #[arg(short, long, default_value_t = Delimiter::default())]
        delimiter: Delimiter,
    },

    /// Print the lists currently on the service as JSON
    Fetch {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Config file read and written by the server
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            config,
            csv,
            delimiter,
            dry_run,
        } => cmd_sync(&config, csv.as_deref(), delimiter, dry_run).await,

        Commands::Parse { input, delimiter } => cmd_parse(&input, delimiter),

        Commands::Fetch { config } => cmd_fetch(&config).await,

        Commands::Serve { port, config } => cmd_serve(port, config).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_sync(
    config_path: &Path,
    csv: Option<&Path>,
    delimiter: Delimiter,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::load(config_path).map_err(SyncError::from)?;
    let csv_path = config.resolve_csv_path(csv).map_err(SyncError::from)?;
    let mode = if dry_run { SyncMode::DryRun } else { SyncMode::Live };

    let report = sync_csv(&config, &csv_path, delimiter, mode).await?;

    eprintln!("\n📊 Summary");
    eprintln!("   Lists processed: {}", report.columns_processed);
    eprintln!("   Created:         {}", report.created.len());
    eprintln!("   Updated:         {}", report.updated.len());
    eprintln!("   Full, skipped:   {}", report.skipped_full.len());
    eprintln!("   Empty columns:   {}", report.empty_columns.len());
    eprintln!("   Entities sent:   {}", report.entity_count());
    if mode == SyncMode::DryRun {
        eprintln!("   (dry run: nothing was sent)");
    }

    eprintln!("\n✨ Successfully synced data");
    Ok(())
}

fn cmd_parse(input: &Path, delimiter: Delimiter) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Loading CSV: {}", input.display());

    let result = parse_csv_file_auto(input, delimiter).map_err(SyncError::from)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Lists: {}", result.headers.join(", "));
    eprintln!("   Rows: {}{}", result.row_count, if result.truncated { " (truncated)" } else { "" });

    println!("{}", serde_json::to_string_pretty(&result.dataset)?);
    Ok(())
}

async fn cmd_fetch(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::load(config_path).map_err(SyncError::from)?;
    let api = HttpListApi::from_config(&config);

    let lists = api.fetch_collections().await.map_err(SyncError::from)?;
    eprintln!("📡 {} lists on {}", lists.len(), api.endpoint());

    println!("{}", serde_json::to_string_pretty(&lists)?);
    Ok(())
}

async fn cmd_serve(port: u16, config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    listload::server::start_server(port, config).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
