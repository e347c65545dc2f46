use std::time::Duration;

pub const DEFAULT_GROWTH_FACTOR: f64 = 1.3;
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Capped exponential delay schedule for status polling.
///
/// Growth depends only on the number of ticks, never on what a tick returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial: initial.max(MIN_DELAY).min(max),
            factor: DEFAULT_GROWTH_FACTOR,
            max,
        }
    }

    /// Delay following `current`: `min(floor(current * factor), max)`, and
    /// never shorter than `current` itself (when `current` is within the cap).
    pub fn next(&self, current: Duration) -> Duration {
        let current_ms = current.as_millis() as u64;
        let grown = (current_ms as f64 * self.factor.max(1.0)).floor() as u64;
        let capped = Duration::from_millis(grown.max(current_ms)).min(self.max);
        capped.max(current.min(self.max))
    }

    /// The schedule starting at `initial`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial), move |d| Some(self.next(*d)))
    }
}
