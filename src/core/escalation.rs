/// Consecutive failures tolerated before the operator is warned.
const WARN_AFTER_FAILURES: u32 = 3;

/// Per-run failure tracking for the advisory "too many errors" warning.
#[derive(Debug, Clone, Default)]
pub struct EscalationState {
    consecutive_failures: u32,
    successes: u32,
    warned: bool,
}

impl EscalationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.successes = self.successes.saturating_add(1);
    }

    /// Returns `true` exactly once per run, the first time the failure
    /// streak passes the threshold without any success in the run.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if !self.warned
            && self.successes == 0
            && self.consecutive_failures > WARN_AFTER_FAILURES
        {
            self.warned = true;
            return true;
        }
        false
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
