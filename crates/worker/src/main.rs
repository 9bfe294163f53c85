use anyhow::Context;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymflow_core::WorkflowSettings;
use gymflow_db::PgStore;
use gymflow_worker::{ExpiryJob, JobConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymflow_worker=debug,gymflow_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let job_config = JobConfig::from_env();
    let settings = WorkflowSettings::from_env();
    tracing::info!(
        interval_secs = job_config.interval.as_secs(),
        run_once = job_config.run_once,
        channel = %settings.default_channel,
        "Worker starting"
    );

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = gymflow_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    gymflow_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database connection pool created");

    let channels = gymflow_notify::channels_from_env();
    let job = ExpiryJob::new(PgStore::new(pool), channels, &settings)?;

    if job_config.run_once {
        let summary = job.sweep(Utc::now()).await?;
        tracing::info!(?summary, "Single expiry sweep complete");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let job_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        job.run(job_config.interval, job_cancel).await;
    });

    shutdown_signal().await;
    cancel.cancel();
    handle.await.context("Expiry job panicked")?;

    tracing::info!("Worker stopped");
    Ok(())
}

/// Wait for SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping"),
        () = terminate => tracing::info!("Received SIGTERM, stopping"),
    }
}
