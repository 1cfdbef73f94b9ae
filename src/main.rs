use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::run::PayrollOrchestrator;
use payroll_engine::store::{
    InMemoryAttendanceStore, InMemoryLedger, InMemoryProfileStore, SeedData,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding engine.yaml and rates/
    #[arg(long, default_value = "./config/facility")]
    config: PathBuf,

    /// Address to serve the HTTP API on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// YAML file of profiles and attendance to load into the in-memory stores
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let loader = ConfigLoader::load(&cli.config)?;

    let profiles = InMemoryProfileStore::new();
    let attendance = InMemoryAttendanceStore::new();
    if let Some(seed) = &cli.seed {
        SeedData::load(seed)?.apply(&profiles, &attendance).await?;
    }

    let orchestrator = PayrollOrchestrator::new(
        Arc::new(loader.config().clone()),
        Arc::new(profiles),
        Arc::new(attendance),
        Arc::new(InMemoryLedger::new()),
    );
    let app = create_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(
        listen = %cli.listen,
        facility_id = %loader.settings().facility_id,
        "Payroll engine listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
