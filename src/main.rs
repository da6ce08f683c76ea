// src/main.rs
// banter - conversational gateway over pre-trained inference pipelines

use anyhow::Result;
use banter::config::{InferenceEndpoints, UploadConfig};
use banter::web::{self, state::AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "banter")]
#[command(about = "Conversational gateway over pre-trained inference pipelines")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "BANTER_PORT")]
    port: u16,

    /// Directory where uploads are staged (default: ./uploads)
    #[arg(long)]
    uploads_dir: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env from the current directory, if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let endpoints = InferenceEndpoints::from_env();
    let uploads = UploadConfig::load(cli.uploads_dir);
    uploads.ensure_dir()?;

    info!(
        chat_model = %endpoints.chat_model,
        model_loaded = endpoints.has_generation(),
        image_model = endpoints.classification.is_some(),
        text_model = endpoints.summarization.is_some(),
        uploads_dir = %uploads.dir.display(),
        "banter starting"
    );

    let state = AppState::from_endpoints(&endpoints, uploads);
    let app = web::create_router(state);

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("banter listening on http://localhost:{}", cli.port);
    println!("banter listening on http://localhost:{}", cli.port);

    axum::serve(listener, app).await?;

    Ok(())
}
