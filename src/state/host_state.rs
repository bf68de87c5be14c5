use std::time::Duration;
use tokio::time::Instant;

/// Tracks politeness state for one host during a crawl
///
/// One instance exists per host key; it is created on first reference and
/// never removed during a run.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Host key (host plus non-default port)
    pub host: String,

    /// Start time of the most recent reserved fetch slot
    ///
    /// Only ever moves forward.
    pub last_fetch_at: Option<Instant>,

    /// Minimum spacing applied to the most recent reservation
    pub min_delay: Duration,

    /// Number of fetch slots reserved for this host
    pub fetch_count: u64,
}

impl HostState {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            last_fetch_at: None,
            min_delay: Duration::ZERO,
            fetch_count: 0,
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns `Duration::ZERO` if a request can be made now.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Duration {
        match self.last_fetch_at {
            Some(last) => (last + min_delay).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Reserves the next fetch slot and returns how long the caller must wait
    ///
    /// The slot starts at `max(now, last_fetch_at + min_delay)` and becomes the
    /// new `last_fetch_at`, so the next caller is spaced after this one even if
    /// this one has not fetched yet.
    pub fn reserve(&mut self, min_delay: Duration, now: Instant) -> Duration {
        let wait = self.time_until_next_request(min_delay, now);
        let slot = now + wait;

        self.last_fetch_at = Some(match self.last_fetch_at {
            Some(last) if last > slot => last,
            _ => slot,
        });
        self.min_delay = min_delay;
        self.fetch_count += 1;

        wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn test_new_host_state() {
        let state = HostState::new("a.test");
        assert_eq!(state.host, "a.test");
        assert!(state.last_fetch_at.is_none());
        assert_eq!(state.fetch_count, 0);
    }

    #[test]
    fn test_first_reservation_is_immediate() {
        let mut state = HostState::new("a.test");
        let now = Instant::now();

        assert_eq!(state.reserve(DELAY, now), Duration::ZERO);
        assert_eq!(state.last_fetch_at, Some(now));
        assert_eq!(state.fetch_count, 1);
    }

    #[test]
    fn test_back_to_back_reservations_are_spaced() {
        let mut state = HostState::new("a.test");
        let now = Instant::now();

        assert_eq!(state.reserve(DELAY, now), Duration::ZERO);
        assert_eq!(state.reserve(DELAY, now), DELAY);
        assert_eq!(state.reserve(DELAY, now), DELAY * 2);
        assert_eq!(state.last_fetch_at, Some(now + DELAY * 2));
    }

    #[test]
    fn test_time_until_next_request() {
        let mut state = HostState::new("a.test");
        let now = Instant::now();

        assert_eq!(state.time_until_next_request(DELAY, now), Duration::ZERO);

        state.reserve(DELAY, now);
        let soon = now + Duration::from_millis(400);
        assert_eq!(
            state.time_until_next_request(DELAY, soon),
            Duration::from_millis(600)
        );

        let later = now + Duration::from_millis(1100);
        assert_eq!(state.time_until_next_request(DELAY, later), Duration::ZERO);
    }

    #[test]
    fn test_last_fetch_never_moves_backwards() {
        let mut state = HostState::new("a.test");
        let now = Instant::now();

        state.reserve(DELAY, now);
        state.reserve(DELAY, now);
        let reserved = state.last_fetch_at;

        // A later call with a zero delay must not pull the slot back
        state.reserve(Duration::ZERO, now);
        assert!(state.last_fetch_at >= reserved);
    }
}
