use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub requests: u64,
    pub successes: u64,
    pub errors: u64,
    pub last_known_points: Option<i64>,
}

impl Stats {
    pub fn record_attempt(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    /// `points` is the balance from the post-grant read, when one was obtained.
    pub fn record_success(&mut self, points: Option<i64>) {
        self.successes = self.successes.saturating_add(1);
        if let Some(points) = points {
            self.last_known_points = Some(points);
        }
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    pub fn reset(&mut self, preserve_points: bool) {
        self.requests = 0;
        self.successes = 0;
        self.errors = 0;
        if !preserve_points {
            self.last_known_points = None;
        }
    }
}
