use std::time::{Duration, Instant};

/// A cancelable delayed action carrying a payload.
///
/// Scheduling again replaces the pending payload and restarts the wait, so
/// only the last request inside the window fires. The owner drives it by
/// calling [`Debounced::poll`] with the current time.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    wait: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounced<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Changes the window; a pending action keeps its deadline.
    pub fn set_wait(&mut self, wait: Duration) {
        self.wait = wait;
    }

    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.wait, value));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }

    /// Takes the payload once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline().map_or(false, |deadline| now >= deadline);
        if due {
            self.cancel()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_the_window() {
        let start = Instant::now();
        let mut task = Debounced::new(Duration::from_millis(250));
        task.schedule(start, 1);
        assert_eq!(task.poll(start + Duration::from_millis(100)), None);
        assert_eq!(task.poll(start + Duration::from_millis(250)), Some(1));
        assert_eq!(task.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn rescheduling_coalesces_to_the_last_request() {
        let start = Instant::now();
        let mut task = Debounced::new(Duration::from_millis(250));
        task.schedule(start, 1);
        task.schedule(start + Duration::from_millis(200), 2);
        assert_eq!(task.poll(start + Duration::from_millis(300)), None);
        assert_eq!(task.poll(start + Duration::from_millis(450)), Some(2));
    }

    #[test]
    fn cancel_prevents_firing() {
        let start = Instant::now();
        let mut task = Debounced::new(Duration::ZERO);
        task.schedule(start, "save");
        assert_eq!(task.peek(), Some(&"save"));
        assert_eq!(task.cancel(), Some("save"));
        assert!(!task.is_pending());
        assert_eq!(task.poll(start + Duration::from_secs(1)), None);
    }
}
