//! Civic API Server
//!
//! Serves the civic REST API from memory. An admin account is created at
//! startup so the other accounts can be managed from the CLI.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use civic::domain::Role;
use civic::storage::InMemoryBackend;

#[derive(Parser)]
#[command(name = "civic-server", version, about = "In-memory civic API server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CIVIC_SERVER_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,

    /// Email of the admin account created at startup
    #[arg(long, env = "CIVIC_ADMIN_EMAIL", default_value = "admin@civic.local")]
    admin_email: String,

    /// Password of the startup admin (random when unset)
    #[arg(long, env = "CIVIC_ADMIN_PASSWORD")]
    admin_password: Option<String>,

    /// Reports a free citizen account may file
    #[arg(long, env = "CIVIC_FREE_REPORT_LIMIT", default_value_t = civic::validation::DEFAULT_FREE_REPORT_LIMIT)]
    free_report_limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("Starting civic API server...");

    let backend = InMemoryBackend::new().with_free_report_limit(args.free_report_limit);
    let generated = args.admin_password.is_none();
    let password = args
        .admin_password
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    backend
        .register_user("Administrator", &args.admin_email, &password, Role::Admin)
        .context("Failed to create the admin account")?;
    if generated {
        println!("Admin login: {} / {}", args.admin_email, password);
    } else {
        info!("Admin account: {}", args.admin_email);
    }

    let app = civic_server::app(backend);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;
    info!("Server listening on http://{}/api", args.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
