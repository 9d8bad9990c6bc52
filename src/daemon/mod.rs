mod app;

use crate::cli::config::SettingsUpdate;
use anyhow::Result;

pub async fn run(update: SettingsUpdate) -> Result<()> {
    tracing::info!("Starting points-poller");
    app::run(update).await
}
