use crate::core::models::{RunConfig, RunState, Severity};
use crate::core::settings::AccountSettings;
use crate::core::stats::Stats;
use crate::core::store::EngineStore;
use crate::core::validation::{validate, ValidationError};
use crate::engine::cycle::CycleExecutor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("engine is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Identifies one run. `stop` clears `active` before aborting the timer, so a
/// tick already past `tick().await` cannot spawn a cycle afterwards.
#[derive(Clone)]
struct RunTicket {
    generation: u64,
    active: Arc<AtomicBool>,
}

impl RunTicket {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn revoke(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

struct ActiveRun {
    config: RunConfig,
    ticket: RunTicket,
    timer: JoinHandle<()>,
}

impl ActiveRun {
    fn cancel(self) -> RunConfig {
        self.ticket.revoke();
        self.timer.abort();
        self.config
    }
}

/// Spawns cycles as independent tasks so that cancelling the timer never
/// interrupts a cycle that is already in flight.
#[derive(Clone)]
struct Dispatcher {
    executor: CycleExecutor,
    allow_overlap: bool,
    busy: Arc<AtomicBool>,
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Dispatcher {
    fn dispatch(&self, config: RunConfig, ticket: &RunTicket) {
        if !ticket.is_active() {
            tracing::debug!(generation = ticket.generation, "Run stopped, dropping tick");
            return;
        }

        let guard = if self.allow_overlap {
            None
        } else {
            if self.busy.swap(true, Ordering::SeqCst) {
                tracing::debug!("Previous cycle still in flight, skipping tick");
                return;
            }
            Some(BusyGuard(Arc::clone(&self.busy)))
        };

        let executor = self.executor.clone();
        let generation = ticket.generation;
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = executor.run(&config).await;
            let store = executor.store();

            if outcome.is_success() {
                store.note_run_success(generation).await;
            } else if store.note_run_failure(generation).await {
                store
                    .log(
                        Severity::Warning,
                        "many errors detected; check the settings or stop the run",
                    )
                    .await;
            }
        });
    }
}

async fn run_timer(dispatcher: Dispatcher, config: RunConfig, ticket: RunTicket) {
    let period = config.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        dispatcher.dispatch(config.clone(), &ticket);
    }
}

/// Owns the `Idle`/`Running` state machine. A timer task exists exactly
/// while the controller is running.
pub struct Controller {
    dispatcher: Dispatcher,
    run: Mutex<Option<ActiveRun>>,
}

impl Controller {
    pub fn new(executor: CycleExecutor, allow_overlap: bool) -> Self {
        Self {
            dispatcher: Dispatcher {
                executor,
                allow_overlap,
                busy: Arc::new(AtomicBool::new(false)),
            },
            run: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &EngineStore {
        self.dispatcher.executor.store()
    }

    /// Validates `candidate`, runs one cycle right away and arms the periodic
    /// timer. On validation failure nothing is scheduled.
    pub async fn start(&self, candidate: &AccountSettings) -> Result<RunConfig, StartError> {
        let mut run = self.run.lock().await;
        if run.is_some() {
            tracing::debug!("Start requested while already running");
            return Err(StartError::AlreadyRunning);
        }

        let store = self.store();
        let config = match validate(candidate) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(field = e.field(), "Rejected run settings");
                store.log(Severity::Error, e.to_string()).await;
                return Err(e.into());
            }
        };

        let ticket = RunTicket::new(store.begin_run().await);
        store
            .log(Severity::Info, format!("starting run for user {}", config.uid))
            .await;
        store
            .log(Severity::Info, format!("e-mail: {}", config.email))
            .await;
        store
            .log(Severity::Info, format!("device ID: {}", config.device_id))
            .await;
        store
            .log(
                Severity::Info,
                format!("interval: {} seconds", config.interval.as_secs()),
            )
            .await;

        self.dispatcher.dispatch(config.clone(), &ticket);
        let timer = tokio::spawn(run_timer(
            self.dispatcher.clone(),
            config.clone(),
            ticket.clone(),
        ));

        tracing::info!(
            uid = %config.uid,
            interval_secs = config.interval.as_secs(),
            allow_overlap = self.dispatcher.allow_overlap,
            "Engine started"
        );
        *run = Some(ActiveRun {
            config: config.clone(),
            ticket,
            timer,
        });
        Ok(config)
    }

    /// Cancels future ticks. Cycles already in flight run to completion.
    /// Returns `false` when the engine was already idle.
    pub async fn stop(&self) -> bool {
        let Some(active) = self.run.lock().await.take() else {
            return false;
        };

        let config = active.cancel();
        tracing::info!(uid = %config.uid, "Engine stopped");
        self.store()
            .log(Severity::Info, "monitoring stopped by operator")
            .await;
        true
    }

    pub async fn state(&self) -> RunState {
        if self.run.lock().await.is_some() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    pub async fn active_config(&self) -> Option<RunConfig> {
        self.run.lock().await.as_ref().map(|r| r.config.clone())
    }

    pub async fn stats(&self) -> Stats {
        self.store().stats().await
    }

    pub async fn clear_log(&self) {
        self.store().clear_log().await;
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(active) = self.run.get_mut().take() {
            active.cancel();
        }
    }
}
