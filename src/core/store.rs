use crate::core::escalation::EscalationState;
use crate::core::event_log::{EventLog, LogEntry};
use crate::core::models::{AccountSnapshot, Severity};
use crate::core::stats::Stats;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::Level;

const LOG_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct StoreInner {
    stats: Stats,
    log: EventLog,
    escalation: EscalationState,
    run_generation: u64,
    last_snapshot: Option<AccountSnapshot>,
}

/// Routine entries are already printed by subscribers, so only problems reach
/// the default `info` filter.
fn mirror_level(severity: Severity) -> Level {
    match severity {
        Severity::Info | Severity::Success => Level::DEBUG,
        Severity::Warning => Level::WARN,
        Severity::Error => Level::ERROR,
    }
}

/// Shared engine state. Cycles running in parallel update it through short
/// write-locked sections, so counter updates never interleave.
#[derive(Clone)]
pub struct EngineStore {
    inner: Arc<RwLock<StoreInner>>,
    log_tx: broadcast::Sender<LogEntry>,
}

impl EngineStore {
    pub fn new() -> Self {
        let (log_tx, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            log_tx,
        }
    }

    /// Live feed of appended log entries, for the presentation layer.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.log_tx.subscribe()
    }

    pub async fn log(&self, severity: Severity, message: impl Into<String>) {
        let entry = self.inner.write().await.log.append(severity, message);

        match mirror_level(severity) {
            Level::ERROR => tracing::error!("{}", entry.message),
            Level::WARN => tracing::warn!("{}", entry.message),
            _ => tracing::debug!(severity = severity.label(), "{}", entry.message),
        }

        let _ = self.log_tx.send(entry);
    }

    pub async fn record_attempt(&self) {
        self.inner.write().await.stats.record_attempt();
    }

    pub async fn record_success(&self, after: Option<&AccountSnapshot>) {
        self.inner
            .write()
            .await
            .stats
            .record_success(after.map(|s| s.points));
    }

    pub async fn record_error(&self) {
        self.inner.write().await.stats.record_error();
    }

    /// Outcomes from a cycle started by an earlier run are ignored.
    pub async fn note_run_success(&self, generation: u64) {
        let mut inner = self.inner.write().await;
        if inner.run_generation == generation {
            inner.escalation.record_success();
        }
    }

    /// Returns `true` when the operator should be warned about repeated
    /// failures in run `generation`. Always `false` for a stale run.
    pub async fn note_run_failure(&self, generation: u64) -> bool {
        let mut inner = self.inner.write().await;
        inner.run_generation == generation && inner.escalation.record_failure()
    }

    pub async fn update_snapshot(&self, snapshot: AccountSnapshot) {
        self.inner.write().await.last_snapshot = Some(snapshot);
    }

    pub async fn stats(&self) -> Stats {
        self.inner.read().await.stats
    }

    pub async fn entries(&self) -> Vec<LogEntry> {
        self.inner.read().await.log.entries().cloned().collect()
    }

    pub async fn last_snapshot(&self) -> Option<AccountSnapshot> {
        self.inner.read().await.last_snapshot.clone()
    }

    pub async fn consecutive_failures(&self) -> u32 {
        self.inner.read().await.escalation.consecutive_failures()
    }

    /// Empties the log and zeroes the counters, keeping the last known points.
    pub async fn clear_log(&self) {
        let mut inner = self.inner.write().await;
        inner.log.clear();
        inner.stats.reset(true);
    }

    /// Re-arms escalation and returns the generation of the new run.
    pub async fn begin_run(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.run_generation += 1;
        inner.escalation = EscalationState::new();
        inner.run_generation
    }
}

impl Default for EngineStore {
    fn default() -> Self {
        Self::new()
    }
}
