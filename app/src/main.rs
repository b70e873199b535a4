//! Mailweave - command-line entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailweave_core::{
    Config, Database, EmailImporter, JsonFileFetcher, MessageDisplay, User, UserRepository,
};
use tracing::info;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database file (overrides the configured path)
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON batch of fetched emails and group them into threads
    Import {
        /// JSON file containing an array of emails
        file: PathBuf,
    },
    /// Print every thread with its messages
    Show,
    /// Register a known sender
    AddUser {
        /// Sender email address
        #[arg(long)]
        email: String,
        /// Display name shown instead of the address
        #[arg(long)]
        name: Option<String>,
    },
}

fn init_logging(debug: bool, log_level: &str) {
    let level = if debug { "debug" } else { log_level };

    tracing_subscriber::fmt()
        .with_max_level(match level {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        })
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(database) = &args.database {
        config.storage.database_path = Some(database.clone());
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(args.debug, &config.app.log_level);
    info!("Starting {} v{}", mailweave_core::APP_NAME, mailweave_core::VERSION);

    let database_path = config.database_file_path();
    let database = Database::new(database_path.clone())
        .await
        .with_context(|| format!("failed to open database {}", database_path.display()))?;
    database.initialize().await?;
    let database = Arc::new(database);

    match args.command {
        Command::Import { file } => {
            let importer = EmailImporter::new(
                Arc::new(JsonFileFetcher::new(file)),
                database.clone(),
                database.clone(),
                database.clone(),
                database.clone(),
            )
            .with_config(config.import);

            let report = importer.import().await?;
            println!("{report}");
            for key in &report.unresolved_replies {
                println!("  unresolved reply: {key}");
            }
        }
        Command::Show => {
            let display = MessageDisplay::new(
                database.clone(),
                database.clone(),
                database.clone(),
                database.clone(),
            )
            .with_config(config.display);

            for line in display.render().await? {
                println!("{line}");
            }
        }
        Command::AddUser { email, name } => {
            let mut users = [User::new(email, name)];
            database.persist(&mut users).await?;
            let [user] = users;
            let id = user.id.map(|id| id.to_string()).unwrap_or_default();
            info!("Registered user {} ({})", user.email, id);
        }
    }

    Ok(())
}
