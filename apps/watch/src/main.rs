use anyhow::Context;
use encore_watch::command::spawn_stdin_reader;
use encore_watch::{Config, Host};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the now-playing line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_watch=debug,encore_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        environment = %config.environment(),
        dashboard = %config.dashboard().url,
        authenticated = config.common.has_session(),
        "Starting Encore watch"
    );

    let mut host = Host::new(&config).context("Failed to initialize")?;
    host.select_target(config.target.clone())?;
    if config.target.is_none() {
        info!("No target selected, type `watch <target>` to start");
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = host.run(spawn_stdin_reader(), shutdown).await {
        if e.is_auth_failure() {
            error!("Dashboard rejected the session, log in again and update DASHBOARD_SESSION");
        }
        return Err(e).context("Watch session ended");
    }

    info!("Encore watch stopped");
    Ok(())
}
