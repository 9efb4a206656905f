use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use client_core::{
    config::{load_settings, normalize_backend_url},
    HttpGateway, InteractionOrchestrator,
};
use tokio::{io::BufReader, task::LocalSet};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;
mod render;

use prompt::{run_prompt, App};
use render::{Presenter, HELP};

#[derive(Parser, Debug)]
#[command(about = "Chat with a trading assistant and analyze candlestick charts")]
struct Args {
    /// Overrides `backend_url` from client.toml and the environment.
    #[arg(long)]
    backend_url: Option<String>,
    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    LocalSet::new().run_until(run(args)).await
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(url) = args.backend_url.as_deref() {
        settings.backend_url = normalize_backend_url(url)?;
    }

    let gateway = Rc::new(HttpGateway::from_settings(&settings)?);
    match gateway.health_check().await {
        Ok(banner) => debug!(backend = %settings.backend_url, %banner, "backend: reachable"),
        Err(err) => warn!(backend = %settings.backend_url, error = %err, "backend: health check failed"),
    }

    let orchestrator = InteractionOrchestrator::new(gateway.clone()).await;
    let app = Rc::new(App {
        orchestrator,
        gateway,
        presenter: Presenter::default(),
    });

    println!("Session {}", app.orchestrator.session_id());
    println!("{HELP}");
    app.presenter.render_transcript(&app.orchestrator.snapshot());

    run_prompt(app, BufReader::new(tokio::io::stdin())).await
}
