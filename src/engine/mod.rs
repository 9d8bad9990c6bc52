mod controller;
mod cycle;
#[cfg(test)]
mod testing;

use crate::core::settings::Settings;
use crate::core::store::EngineStore;
use crate::remote::HttpAccountClient;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

pub use controller::{Controller, StartError};
pub use cycle::CycleExecutor;

/// Builds a cycle executor talking to the configured remote service.
pub fn build_executor(settings: &Settings) -> Result<CycleExecutor> {
    let client = HttpAccountClient::new(&settings.engine.base_url)?;
    Ok(CycleExecutor::new(
        Arc::new(client),
        EngineStore::new(),
        Duration::from_millis(settings.engine.settle_delay_ms),
    ))
}

pub fn build_controller(settings: &Settings) -> Result<Controller> {
    let executor = build_executor(settings)?;
    Ok(Controller::new(executor, settings.engine.allow_overlap))
}
