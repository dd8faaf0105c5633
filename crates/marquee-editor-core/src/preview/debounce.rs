use std::ops::Add;
use std::time::Duration;

/// Delay between the last edit and the `EDITOR_UPDATE` it triggers.
pub const EDITOR_UPDATE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trailing-edge debounce as pure deadline bookkeeping.
///
/// Generic over the instant type so the same logic runs against
/// `web_time::Instant` in the browser and `tokio::time::Instant` under a
/// paused test clock.
#[derive(Debug, Clone)]
pub struct Debouncer<I> {
    delay: Duration,
    deadline: Option<I>,
}

impl<I> Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a change, pushing the deadline out to `now + delay`.
    pub fn touch(&mut self, now: I) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn due(&self, now: I) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Consume the pending deadline if it has passed.
    pub fn take(&mut self, now: I) -> bool {
        if self.due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl<I> Default for Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(EDITOR_UPDATE_DEBOUNCE)
    }
}
