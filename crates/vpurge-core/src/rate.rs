//! Call budget shared by every in-flight delete.
//!
//! The vendor caps each org at a fixed number of calls per minute. All
//! workers draw from one [`RateBudget`]; the check-increment-reset sequence
//! runs under a single lock so the count can never be raced past the limit.

use crate::cancel::CancelToken;
use crate::error::{PurgeError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for budget windows and retry backoff.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block for `dur`, returning early with `true` if `cancel` trips.
    fn sleep(&self, dur: Duration, cancel: &CancelToken) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, dur: Duration, cancel: &CancelToken) -> bool {
        cancel.sleep(dur)
    }
}

// ---------------------------------------------------------------------------
// RateBudget
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Window {
    count: u32,
    start: Instant,
}

pub const MIN_WINDOW: Duration = Duration::from_secs(1);

pub struct RateBudget {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
    clock: Arc<dyn Clock>,
}

impl RateBudget {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    /// A `limit` of zero is raised to one so `acquire` can always make
    /// progress, and a window shorter than [`MIN_WINDOW`] is raised to it so
    /// the cap cannot be switched off.
    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self {
            limit: limit.max(1),
            window: window.max(MIN_WINDOW),
            state: Mutex::new(Window { count: 0, start }),
            clock,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Take one call from the current window if any remain.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        let now = self.clock.now();
        self.roll(&mut state, now);
        if state.count < self.limit {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Block until a call is permitted. Returns the start of the window the
    /// call was counted against.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<Instant> {
        loop {
            if cancel.is_cancelled() {
                return Err(PurgeError::Cancelled);
            }

            let wait = {
                let mut state = self.lock();
                let now = self.clock.now();
                self.roll(&mut state, now);
                if state.count < self.limit {
                    state.count += 1;
                    return Ok(state.start);
                }
                (state.start + self.window).saturating_duration_since(now)
            };

            tracing::info!("call limit of {} reached, waiting {:.2?}", self.limit, wait);
            if self.clock.sleep(wait, cancel) {
                return Err(PurgeError::Cancelled);
            }
        }
    }

    fn roll(&self, state: &mut Window, now: Instant) {
        if now.saturating_duration_since(state.start) >= self.window {
            state.start = now;
            state.count = 0;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RateBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateBudget")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("state", &*self.lock())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ManualClock (tests)
// ---------------------------------------------------------------------------

/// Simulated clock: `sleep` advances time instantly and records the request.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn advance(&self, dur: Duration) {
        *self.offset.lock().unwrap() += dur;
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap()
    }

    fn sleep(&self, dur: Duration, cancel: &CancelToken) -> bool {
        if cancel.is_cancelled() {
            return true;
        }
        self.sleeps.lock().unwrap().push(dur);
        self.advance(dur);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::thread;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn try_acquire_respects_limit_until_window_rolls() {
        let clock = Arc::new(ManualClock::new());
        let budget = RateBudget::with_clock(2, MINUTE, clock.clone());
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());

        clock.advance(Duration::from_secs(59));
        assert!(!budget.try_acquire());

        clock.advance(Duration::from_secs(1));
        assert!(budget.try_acquire());
    }

    #[test]
    fn acquire_waits_for_the_window_remainder() {
        let clock = Arc::new(ManualClock::new());
        let budget = RateBudget::with_clock(1, MINUTE, clock.clone());
        let cancel = CancelToken::new();

        let first = budget.acquire(&cancel).unwrap();
        clock.advance(Duration::from_secs(15));
        let second = budget.acquire(&cancel).unwrap();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(45)]);
        assert_eq!(second - first, MINUTE);
    }

    #[test]
    fn concurrent_callers_never_exceed_limit_per_window() {
        const LIMIT: u32 = 10;
        const THREADS: usize = 8;
        const CALLS: usize = 25;

        let clock = Arc::new(ManualClock::new());
        let budget = RateBudget::with_clock(LIMIT, MINUTE, clock);
        let cancel = CancelToken::new();

        let grants: Vec<Instant> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        (0..CALLS)
                            .map(|_| budget.acquire(&cancel).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert_eq!(grants.len(), THREADS * CALLS);

        let mut per_window: BTreeMap<Instant, u32> = BTreeMap::new();
        for start in grants {
            *per_window.entry(start).or_default() += 1;
        }
        assert!(per_window.values().all(|&n| n <= LIMIT));

        let starts: Vec<_> = per_window.keys().collect();
        for pair in starts.windows(2) {
            assert!(*pair[1] - *pair[0] >= MINUTE);
        }
    }

    #[test]
    fn cancelled_acquire_returns_error() {
        let clock = Arc::new(ManualClock::new());
        let budget = RateBudget::with_clock(1, MINUTE, clock);
        let cancel = CancelToken::new();
        budget.acquire(&cancel).unwrap();
        cancel.cancel();
        assert!(matches!(
            budget.acquire(&cancel),
            Err(PurgeError::Cancelled)
        ));
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let budget = RateBudget::new(0, MINUTE);
        assert_eq!(budget.limit(), 1);
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
    }

    #[test]
    fn zero_window_still_caps_calls() {
        let clock = Arc::new(ManualClock::new());
        let budget = RateBudget::with_clock(1, Duration::ZERO, clock.clone());
        let cancel = CancelToken::new();

        let starts: Vec<Instant> = (0..3).map(|_| budget.acquire(&cancel).unwrap()).collect();

        assert_eq!(clock.sleeps(), vec![MIN_WINDOW, MIN_WINDOW]);
        assert_eq!(starts[1] - starts[0], MIN_WINDOW);
        assert_eq!(starts[2] - starts[1], MIN_WINDOW);
        assert!(!budget.try_acquire());
    }
}
