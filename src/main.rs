use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clinic_translate::{
    create_router, terminal, AppState, AudioBackendFactory, ChatSession, Config,
    HttpTranslationClient, SessionConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clinic-translate", version, about = "Doctor–patient translation client")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/clinic-translate")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP control API (default)
    Serve,
    /// Chat from the terminal
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);
    info!("Translation backend: {}", cfg.translation.base_url);

    let session = Arc::new(build_session(&cfg)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cfg, Arc::clone(&session)).await?,
        Command::Chat => terminal::run(Arc::clone(&session)).await?,
    }

    session.shutdown();
    Ok(())
}

fn build_session(cfg: &Config) -> Result<ChatSession> {
    let session_config = SessionConfig::from_config(cfg)?;

    let client = Arc::new(HttpTranslationClient::new(
        &cfg.translation.base_url,
        Duration::from_secs(cfg.translation.request_timeout_secs),
    )?);

    let backend = AudioBackendFactory::create(
        session_config.audio_source.clone(),
        session_config.audio.clone(),
    )
    .context("Failed to create audio backend")?;

    info!("Audio source: {}", backend.name());

    Ok(ChatSession::new(
        client.clone(),
        client,
        backend,
        session_config,
    ))
}

async fn serve(cfg: &Config, session: Arc<ChatSession>) -> Result<()> {
    session.hydrate().await;

    let app = create_router(AppState::new(session));
    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
