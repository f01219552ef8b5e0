use std::sync::Arc;

use clap::{Parser, Subcommand};
use invitelink_backend::auth::jwt::{self, StaffRole};
use invitelink_backend::config::Config;
use invitelink_backend::engine::InviteLifecycleEngine;
use invitelink_backend::models::invite::InviteId;
use invitelink_backend::qr::QrCodec;
use invitelink_backend::store::{InviteStore, PgStore};
use invitelink_backend::{AppState, app};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "invitelink-backend")]
#[command(about = "Event invitations, RSVPs and door check-in")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Mint a bearer token for event staff
    IssueToken {
        /// Staff member name, recorded as the token subject
        #[arg(long)]
        name: String,

        #[arg(long, value_enum, default_value = "door")]
        role: StaffRole,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Encode or verify scannable invite codes
    Qr {
        #[command(subcommand)]
        qr_cmd: QrCommand,
    },
}

#[derive(Subcommand)]
enum QrCommand {
    /// Print the code for an invite id
    Encode { invite_id: String },
    /// Validate a scanned code and print the invite id it carries
    Decode { code: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await?,
        Command::IssueToken { name, role, hours } => {
            let token = jwt::create_token(&name, role, hours, &config.jwt_secret)?;
            println!("{token}");
        }
        Command::Qr { qr_cmd } => {
            let codec = QrCodec::new(config.qr_secret.as_str());
            match qr_cmd {
                QrCommand::Encode { invite_id } => {
                    let id: InviteId = invite_id.parse()?;
                    println!("{}", codec.encode(id));
                }
                QrCommand::Decode { code } => {
                    println!("{}", codec.decode(&code)?);
                }
            }
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = match &config.database_url {
        Some(url) => {
            let db = PgPool::connect(url).await?;
            sqlx::migrate!().run(&db).await?;
            InviteStore::Postgres(PgStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, invites are kept in memory only");
            InviteStore::memory()
        }
    };

    let engine = InviteLifecycleEngine::new(
        store,
        QrCodec::new(config.qr_secret.as_str()),
        &config.public_base_url,
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        engine,
        config: Arc::new(config),
    };

    tracing::info!(store = state.engine.store().backend_name(), "listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
