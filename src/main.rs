use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rescue_roster::api::{router, AppState};
use rescue_roster::config::AppConfig;
use rescue_roster::db::Database;
use rescue_roster::logging::{init_logging, OperationTimer};
use rescue_roster::models::{NewUser, UserRole};
use rescue_roster::repository::SqliteRepository;
use rescue_roster::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the admin API
    Serve {
        /// Address to bind, overrides the configuration
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create or upgrade the database tables
    Migrate,
    /// Add a user account
    AddUser {
        /// First name
        #[arg(long)]
        first: String,

        /// Last name
        #[arg(long)]
        last: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Role (ADMIN, EMPLOYEE or USER)
        #[arg(long, default_value = "ADMIN")]
        role: String,
    },
    /// Issue a session token for a user
    IssueSession {
        /// User to sign in
        #[arg(long)]
        user_id: i64,
    },
}

#[allow(clippy::print_stdout)]
#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Keep the guard so the file writer flushes on exit
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        &config.logging.format,
    )?;

    info!("Starting rescue-roster");

    let cli = Cli::parse();

    config.database.url = config.get_database_url();
    let db = Database::from_config(&config.database).context("Failed to open database")?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config, db).await?;
        }
        Commands::Migrate => {
            let timer = OperationTimer::new("migrate");
            db.migrate()?;
            timer.finish();
            info!("Migrations applied");
        }
        Commands::AddUser {
            first,
            last,
            email,
            role,
        } => {
            InputValidator::validate_name(&first)?;
            InputValidator::validate_name(&last)?;
            InputValidator::validate_email(&email)?;
            let role: UserRole = role.to_uppercase().parse()?;
            let user = db.create_user(&NewUser {
                first_name: first,
                last_name: last,
                email,
                role,
            })?;
            info!(user_id = user.id, role = %user.role, "User created");
            println!("{}", user.id);
        }
        Commands::IssueSession { user_id } => {
            db.get_user(user_id)?
                .with_context(|| format!("User {user_id} not found"))?;
            let token = db.create_session(user_id, config.scheduling.session_ttl_hours)?;
            info!(user_id, ttl_hours = config.scheduling.session_ttl_hours, "Session issued");
            println!("{token}");
        }
    }

    Ok(())
}

async fn serve(config: &AppConfig, db: Database) -> Result<()> {
    let repository = SqliteRepository::new(Arc::new(db), config.scheduling.clone());
    let app = router(AppState::new(Arc::new(repository)));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
