use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deedquest::{api, config::Config};

#[derive(Parser)]
#[command(name = "deedquest")]
#[command(about = "Share good deeds, jokes, puzzles and happenings, and level up doing it")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000", env = "DEEDQUEST_PORT")]
        port: u16,

        /// SQLite database file
        #[arg(long, env = "DEEDQUEST_DB")]
        db: Option<PathBuf>,

        /// Reward tables JSON file
        #[arg(long, env = "DEEDQUEST_TABLES")]
        tables: Option<PathBuf>,

        /// Base URL of the media service
        #[arg(long, env = "DEEDQUEST_MEDIA_URL")]
        media_url: Option<String>,
    },
    /// Create or upgrade the database schema and exit
    Migrate {
        #[arg(long, env = "DEEDQUEST_DB")]
        db: Option<PathBuf>,
    },
    /// Print the effective reward tables as JSON
    Tables {
        #[arg(long, env = "DEEDQUEST_TABLES")]
        tables: Option<PathBuf>,

        /// Also write them to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "deedquest=debug,deedquest_core=debug,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve {
            port,
            db,
            tables,
            media_url,
        }) => {
            let config = Config {
                db_path: db,
                tables_path: tables,
                media_url,
            };
            serve(config, port).await?;
        }
        Some(Commands::Migrate { db }) => {
            let config = Config {
                db_path: db,
                ..Config::default()
            };
            config.open_database()?;
            tracing::info!("Database schema is up to date");
        }
        Some(Commands::Tables { tables, out }) => {
            let config = Config {
                tables_path: tables,
                ..Config::default()
            };
            let json = deedquest::config::export_tables(&config.load_tables()?, out.as_deref())?;
            println!("{}", json);
        }
        None => {
            // Default: start server
            serve(Config::default(), 3000).await?;
        }
    }

    Ok(())
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting DeedQuest server on port {}", port);

    let engine = config.build_engine()?;
    let app = api::create_router(engine);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("DeedQuest server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
