use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheetdesk::api::{self, middleware::AdminAuth};
use sheetdesk::config::ServerConfig;
use sheetdesk::db::Database;

#[derive(Parser)]
#[command(name = "sheetdesk")]
#[command(about = "Documentation portal backend with a sheet review workflow")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Port for HTTP API (overrides SHEETDESK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file (overrides SHEETDESK_DB)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Apply pending migrations and exit
    Migrate {
        /// SQLite database file (overrides SHEETDESK_DB)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "sheetdesk=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &ServerConfig) -> anyhow::Result<Database> {
    let path = config.database_path()?;
    tracing::info!("Using database at {}", path.display());

    let db = Database::open(&path)?;
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;

    if config.admin_key.is_none() {
        tracing::warn!("SHEETDESK_ADMIN_KEY is not set, admin routes are open");
    }
    let app = api::create_router_with_auth(db, AdminAuth::from_config(&config));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("sheetdesk listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port, db }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if db.is_some() {
                config.database_path = db;
            }
            serve(config).await?;
        }
        Some(Commands::Migrate { db }) => {
            if db.is_some() {
                config.database_path = db;
            }
            open_database(&config)?;
            tracing::info!("Migrations applied");
        }
        None => serve(config).await?,
    }

    Ok(())
}
