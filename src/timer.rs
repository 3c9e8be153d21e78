use std::time::{Duration, Instant};

/// Wall-clock timer with an optional limit.
#[derive(Clone, Debug)]
pub struct Timer {
    start: Instant,
    time_limit: Option<Duration>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Timer {
    /// Starts a timer with the given limit in seconds.
    pub fn new(time_limit: Option<f64>) -> Self {
        Self {
            start: Instant::now(),
            time_limit: time_limit.map(Duration::from_secs_f64),
        }
    }

    /// Restarts the timer, keeping the limit.
    pub fn restart(&mut self) {
        self.start = Instant::now();
    }

    /// Returns the elapsed time in seconds.
    pub fn get_elapsed_time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Returns the remaining time in seconds, if there is a limit.
    pub fn get_remaining_time_limit(&self) -> Option<f64> {
        let elapsed = self.start.elapsed();
        self.time_limit
            .map(|limit| limit.saturating_sub(elapsed).as_secs_f64())
    }

    /// Returns whether the time limit is reached.
    pub fn check_time_limit(&self) -> bool {
        self.get_remaining_time_limit()
            .is_some_and(|remaining| remaining <= 0.0)
    }
}
