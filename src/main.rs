use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use boards::board::BoardService;
use boards::web::WebServer;
use boards::{Config, Database};

/// Boards discussion forum.
#[derive(Debug, Parser)]
#[command(name = "boards", version, about = "A multi-user discussion forum")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the web server (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Create a board.
    CreateBoard {
        /// Board name, unique.
        name: String,
        /// Short description shown on the home page.
        description: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load_with_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = boards::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        boards::logging::init_console_only(&config.logging.level);
    }

    match run(cli.command.unwrap_or(Command::Serve), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> boards::Result<()> {
    let db = Database::open(&config.database.path).await?;

    match command {
        Command::Migrate => {
            info!(version = db.schema_version().await?, "Database is up to date");
        }
        Command::CreateBoard { name, description } => {
            let board = BoardService::new(&db)
                .create_board(&name, &description)
                .await?;
            info!(board_id = board.id, name = %board.name, "Board created");
        }
        Command::Serve => {
            config.validate()?;
            let mailer = boards::mail::from_config(&config.mail)?;

            info!("Boards - discussion forum");
            info!(
                "Server configured on {}:{}",
                config.server.host, config.server.port
            );
            WebServer::new(config, db, mailer)?.run().await?;
        }
    }

    Ok(())
}
