//! Fixed-capacity ring of admission timestamps.

use std::time::{Duration, Instant};

/// A circular buffer holding the timestamps of one client's last admitted
/// requests.
///
/// Writes advance a cursor that wraps in place, so the slot the cursor
/// points at always holds the admission that is exactly `capacity` requests
/// in the past (or nothing, while the ring is still filling). That single
/// slot answers the sliding-window question in O(1) time and O(capacity)
/// memory: if the capacity-old admission is older than the window, at most
/// `capacity - 1` admissions can lie inside the window and a new request
/// fits.
///
/// The ring does no locking of its own; callers serialize access per client
/// (see [`RateLimiter`](super::RateLimiter)).
#[derive(Debug, Clone)]
pub struct RequestRing {
    /// Admission timestamps; `None` marks a slot that was never written.
    slots: Vec<Option<Instant>>,
    /// Index of the next slot to overwrite.
    cursor: usize,
}

impl RequestRing {
    /// Create a ring remembering the last `capacity` admissions.
    ///
    /// A capacity below 1 is treated as 1 so the ring is always usable.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
        }
    }

    /// Number of admissions the ring remembers.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Record an admission at `at` and advance the cursor by one slot.
    ///
    /// Exactly one slot is overwritten per call, regardless of how much
    /// time passed since the previous record.
    pub fn record(&mut self, at: Instant) {
        self.slots[self.cursor] = Some(at);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// Whether a request arriving at `now` fits within the limit for
    /// `window`.
    ///
    /// Probes only the slot under the cursor, the admission `capacity`
    /// requests in the past. An empty slot means fewer than `capacity`
    /// requests were ever admitted, which is within limit no matter the
    /// timing. Otherwise the request fits iff that admission is strictly
    /// older than the window; at exactly `window` elapsed the client is
    /// still blocked.
    ///
    /// Never mutates the ring, so repeated checks at the same `now` give
    /// the same answer.
    pub fn is_within_limit(&self, now: Instant, window: Duration) -> bool {
        match self.slots[self.cursor] {
            None => true,
            // `duration_since` saturates to zero for instants ahead of
            // `now`, keeping the strict comparison total.
            Some(oldest) => now.duration_since(oldest) > window,
        }
    }

    /// Timestamp of the most recent admission, if any.
    ///
    /// Used by the idle sweeper to judge how long a client has been quiet.
    pub fn newest(&self) -> Option<Instant> {
        let last = (self.cursor + self.slots.len() - 1) % self.slots.len();
        self.slots[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n` instants spaced `step` apart, starting now.
    fn instants(n: usize, step: Duration) -> Vec<Instant> {
        let base = Instant::now();
        (0..n).map(|i| base + step * i as u32).collect()
    }

    #[test]
    fn test_capacity_below_one_is_normalized() {
        assert_eq!(RequestRing::new(0).capacity(), 1);
        assert_eq!(RequestRing::new(3).capacity(), 3);
    }

    #[test]
    fn test_partially_filled_ring_is_always_within_limit() {
        let base = Instant::now();
        let mut ring = RequestRing::new(3);
        ring.record(base);
        ring.record(base + Duration::from_secs(1));

        // Two of three slots written; any time and any window is fine,
        // including a zero-length window at the same instant.
        assert!(ring.is_within_limit(base, Duration::from_secs(3600)));
        assert!(ring.is_within_limit(base + Duration::from_secs(1), Duration::ZERO));
    }

    #[test]
    fn test_full_ring_blocks_until_strictly_past_the_window() {
        let base = Instant::now();
        let hour = Duration::from_secs(3600);
        let mut ring = RequestRing::new(2);
        ring.record(base);
        ring.record(base + Duration::from_secs(60));

        // The oldest admission is at `base`. Exactly one hour later is
        // still blocked; one hour and a second is not.
        assert!(!ring.is_within_limit(base + hour, hour));
        assert!(ring.is_within_limit(base + hour + Duration::from_secs(1), hour));
    }

    #[test]
    fn test_checks_do_not_mutate() {
        let base = Instant::now();
        let window = Duration::from_secs(10);
        let mut ring = RequestRing::new(1);
        ring.record(base);

        let probe = base + Duration::from_secs(5);
        for _ in 0..10 {
            assert!(!ring.is_within_limit(probe, window));
        }
        assert!(ring.is_within_limit(base + Duration::from_secs(11), window));
    }

    #[test]
    fn test_writes_wrap_in_place() {
        let times = instants(5, Duration::from_secs(1));
        let mut ring = RequestRing::new(3);
        for &t in &times {
            ring.record(t);
        }

        // Five writes into three slots: the fourth and fifth wrapped over
        // the first two, the third survives under the cursor.
        assert_eq!(ring.slots[0], Some(times[3]));
        assert_eq!(ring.slots[1], Some(times[4]));
        assert_eq!(ring.slots[2], Some(times[2]));
        assert_eq!(ring.cursor, 2);
    }

    #[test]
    fn test_cursor_slot_is_always_capacity_writes_old() {
        let capacity = 3;
        let times = instants(capacity * 4 + 2, Duration::from_millis(10));
        let mut ring = RequestRing::new(capacity);

        for (written, &t) in times.iter().enumerate() {
            ring.record(t);
            if written + 1 >= capacity {
                let expected = times[written + 1 - capacity];
                assert_eq!(ring.slots[ring.cursor], Some(expected));
            } else {
                assert_eq!(ring.slots[ring.cursor], None);
            }
        }
    }

    #[test]
    fn test_newest_tracks_the_last_record() {
        let times = instants(4, Duration::from_secs(1));
        let mut ring = RequestRing::new(3);

        assert_eq!(ring.newest(), None);
        for &t in &times {
            ring.record(t);
            assert_eq!(ring.newest(), Some(t));
        }
    }
}
