use crate::core::models::{AccountSnapshot, CycleOutcome, CycleStage, RunConfig, Severity};
use crate::core::store::EngineStore;
use crate::remote::{AccountClient, ClientError};
use std::sync::Arc;
use std::time::Duration;

/// Runs one read, grant, settle, re-read sequence against the remote account.
#[derive(Clone)]
pub struct CycleExecutor {
    client: Arc<dyn AccountClient>,
    store: EngineStore,
    settle_delay: Duration,
}

impl CycleExecutor {
    pub fn new(client: Arc<dyn AccountClient>, store: EngineStore, settle_delay: Duration) -> Self {
        Self {
            client,
            store,
            settle_delay,
        }
    }

    pub fn store(&self) -> &EngineStore {
        &self.store
    }

    /// Executes a full cycle and records it in the stats. Never retries: the
    /// grant call is not idempotent.
    pub async fn run(&self, config: &RunConfig) -> CycleOutcome {
        self.store.record_attempt().await;

        let outcome = self.execute(config).await;

        match &outcome {
            CycleOutcome::Success { after, .. } => {
                self.store.record_success(after.as_ref()).await;
            }
            CycleOutcome::Failure { .. } => {
                self.store.record_error().await;
            }
        }

        outcome
    }

    async fn execute(&self, config: &RunConfig) -> CycleOutcome {
        let store = &self.store;

        store
            .log(Severity::Info, format!("fetching account {}...", config.uid))
            .await;
        let before = match self.client.fetch_account(&config.uid).await {
            Ok(snapshot) => {
                store
                    .log(Severity::Success, format!("current points: {}", snapshot.points))
                    .await;
                store.update_snapshot(snapshot.clone()).await;
                snapshot
            }
            Err(e) => return self.fail(CycleStage::FetchBefore, e, None).await,
        };

        store.log(Severity::Info, "granting points...").await;
        match self
            .client
            .grant_points(&config.uid, &config.email, &config.device_id)
            .await
        {
            Ok(response) => {
                let message = if response.message.trim().is_empty() {
                    "grant accepted".to_string()
                } else {
                    response.message
                };
                store.log(Severity::Success, message).await;
            }
            Err(e) => return self.fail(CycleStage::Grant, e, None).await,
        }

        store
            .log(
                Severity::Info,
                format!(
                    "waiting {} ms for points to settle...",
                    self.settle_delay.as_millis()
                ),
            )
            .await;
        tokio::time::sleep(self.settle_delay).await;

        store.log(Severity::Info, "checking updated points...").await;
        let after = match self.client.fetch_account(&config.uid).await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(CycleStage::FetchAfter, e, Some(before)).await,
        };

        let delta = after.points.saturating_sub(before.points);
        store
            .log(Severity::Success, format_points_now(after.points, delta))
            .await;
        store.update_snapshot(after.clone()).await;

        CycleOutcome::Success {
            before: Some(before),
            after: Some(after),
            delta,
        }
    }

    async fn fail(
        &self,
        stage: CycleStage,
        error: ClientError,
        before: Option<AccountSnapshot>,
    ) -> CycleOutcome {
        let action = match stage {
            CycleStage::FetchBefore => "failed to fetch account",
            CycleStage::Grant => "failed to grant points",
            CycleStage::FetchAfter => "failed to re-read account",
        };
        let message = format!("{action}: {}", error.friendly_message());
        tracing::debug!(%stage, error = %error, "Cycle failed");

        self.store.log(Severity::Error, message.clone()).await;

        CycleOutcome::Failure {
            stage,
            kind: error.kind(),
            message,
            before,
        }
    }
}

fn format_points_now(points: i64, delta: i64) -> String {
    match delta {
        0 => format!("points now: {points}"),
        d if d > 0 => format!("points now: {points} (+{d})"),
        d => format!("points now: {points} ({d})"),
    }
}
