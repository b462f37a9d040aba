use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Admits at most one poll cycle at a time. Overlapping attempts are
/// refused, not queued.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

#[derive(Debug)]
struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Proof that a cycle is in flight. The slot frees when the last clone is
/// dropped, so the token can travel with the fetch result.
#[derive(Debug, Clone)]
pub struct FlightToken(Arc<FlightGuard>);

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<FlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                FlightToken(Arc::new(FlightGuard {
                    busy: Arc::clone(&self.busy),
                }))
            })
    }

    pub fn in_flight(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_attempt_is_refused_until_token_drops() {
        let flight = SingleFlight::new();
        let token = flight.try_begin().unwrap();
        assert!(flight.in_flight());
        assert!(flight.try_begin().is_none());

        let copy = token.clone();
        drop(token);
        assert!(flight.try_begin().is_none());
        drop(copy);
        assert!(!flight.in_flight());
        assert!(flight.try_begin().is_some());
    }
}
