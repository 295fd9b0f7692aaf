//! Headless monitor binary: starts the refresh scheduler against the data
//! service and logs each published snapshot until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use wesad_monitor::{DataServiceClient, MonitorConfig, RefreshCoordinator, RefreshScheduler};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = MonitorConfig::from_env();
    info!(
        base_url = %config.base_url,
        subject = %config.subject,
        interval_secs = config.poll_interval.as_secs(),
        "starting live-refresh monitor"
    );

    let client = Arc::new(DataServiceClient::new(&config)?);

    // Optional dataset directory switch; the subject-scoped queries depend
    // on the service-side selection.
    if let Ok(dir) = std::env::var("MONITOR_DATA_DIR") {
        let dir_info = client.select_data_dir(&dir).await?;
        info!(
            data_dir = %dir_info.data_dir,
            files = dir_info.files.len(),
            "selected dataset directory"
        );
    }

    let coordinator = Arc::new(RefreshCoordinator::new());
    let scheduler = Arc::new(RefreshScheduler::new(client, coordinator, config));
    let mut updates = scheduler.subscribe();

    let instance = Uuid::new_v4();
    scheduler.start(instance);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                match snapshot.error {
                    Some(error) => warn!(%error, "refresh cycle reported an error"),
                    None => info!(
                        state = snapshot.state.as_deref().unwrap_or("--"),
                        trend = snapshot.trend.as_deref().unwrap_or("--"),
                        score = snapshot.score.unwrap_or(f64::NAN),
                        points = snapshot.history.len(),
                        "snapshot updated"
                    ),
                }
            }
        }
    }

    scheduler.stop(instance);
    Ok(())
}
