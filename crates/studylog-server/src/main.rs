//! studylog certificate server
//!
//! Issues study-hour certificates and answers public verification links.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use studylog_core::config::{default_database_path, load_config, validate};
use studylog_core::tracing_init::{LogFormat, init_tracing};
use studylog_core::Config;
use studylog_server::auth::JwtManager;
use studylog_server::http::{AppState, build_router};
use studylog_server::storage::StudyDatabase;

const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Parser, Debug)]
#[command(name = "studylog-server")]
#[command(
    version,
    about = "studylog certificate server - issuance and public verification"
)]
struct Args {
    /// Path to a JSON config file layered over the global settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// JWT secret key shared with the login component.
    #[arg(
        long,
        env = "STUDYLOG_JWT_SECRET",
        default_value = DEV_SECRET,
        hide_env_values = true,
        global = true
    )]
    jwt_secret: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Address to listen on.
        #[arg(long)]
        addr: Option<SocketAddr>,

        /// Base URL printed in verification links.
        #[arg(long)]
        public_base_url: Option<String>,
    },
    /// Print an access token for an existing user.
    Token {
        /// User id to mint the token for.
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = &args.db_path {
        config.server.database_path = Some(path.clone());
    }

    match args.command {
        Some(Command::Token { user }) => {
            init_tracing("studylog_server=warn", LogFormat { json: args.log_json })?;
            mint_token(&config, &args.jwt_secret, &user).await
        }
        Some(Command::Serve {
            addr,
            public_base_url,
        }) => {
            if let Some(addr) = addr {
                config.server.listen_addr = addr;
            }
            if let Some(url) = public_base_url {
                config.server.public_base_url = url;
            }
            validate(&config)?;
            serve(config, &args.jwt_secret, args.log_json).await
        }
        None => serve(config, &args.jwt_secret, args.log_json).await,
    }
}

async fn serve(config: Config, jwt_secret: &str, log_json: bool) -> anyhow::Result<()> {
    let level = &config.server.log_level;
    init_tracing(
        &format!("studylog_server={level},tower_http={level}"),
        LogFormat { json: log_json },
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.listen_addr,
        "Starting studylog-server"
    );
    if jwt_secret == DEV_SECRET {
        warn!("Using the built-in development JWT secret; set STUDYLOG_JWT_SECRET in production");
    }

    let db = open_database(&config).await?;
    let jwt = Arc::new(JwtManager::new(
        jwt_secret.as_bytes(),
        config.auth.access_ttl_secs,
    ));
    let app = build_router(AppState::new(db, &config, jwt));

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;
    info!(
        addr = %config.server.listen_addr,
        public_base_url = %config.server.public_base_url,
        "HTTP server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn mint_token(config: &Config, jwt_secret: &str, user_id: &str) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let user = db
        .get_user(user_id)
        .await
        .with_context(|| format!("looking up user {user_id}"))?;
    let role = user
        .role()
        .ok_or_else(|| anyhow::anyhow!("user {user_id} has unknown role {:?}", user.role))?;

    let jwt = JwtManager::new(jwt_secret.as_bytes(), config.auth.access_ttl_secs);
    let (token, exp) = jwt.issue_access_token(&user.id, role)?;
    info!(user_id = %user.id, %role, exp, "Access token issued");
    println!("{token}");
    Ok(())
}

async fn open_database(config: &Config) -> anyhow::Result<StudyDatabase> {
    let path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => default_database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine data directory"))?,
    };
    info!(path = %path.display(), "Opening study database");
    Ok(StudyDatabase::open(&path).await?)
}
