//! Shared admission control for remote calls.
//!
//! Every worker acquires a [`GovernorTicket`] before issuing a call and drops
//! it when the call returns. The governor enforces two ceilings at once: the
//! number of calls outstanding and the number of call starts within a sliding
//! window. Waiters are admitted in arrival order through a fair async mutex.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

/// Ceilings enforced by a [`RateGovernor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorLimits {
    /// Maximum calls outstanding at once.
    pub max_in_flight: usize,
    /// Maximum call starts per `window`, or `None` for no rate ceiling.
    pub max_per_window: Option<u32>,
    /// Length of the sliding rate window.
    pub window: Duration,
}

#[derive(Debug, Default)]
struct GovernorState {
    in_flight: usize,
    recent_starts: VecDeque<Instant>,
}

enum Admission {
    Granted,
    WaitForRelease,
    WaitUntil(Instant),
}

#[derive(Debug)]
struct Shared {
    limits: GovernorLimits,
    turnstile: tokio::sync::Mutex<()>,
    state: Mutex<GovernorState>,
    released: Notify,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, GovernorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_admit(&self, now: Instant) -> Admission {
        let mut state = self.state();
        let window = self.limits.window;
        while let Some(oldest) = state.recent_starts.front()
            && now.saturating_duration_since(*oldest) >= window
        {
            state.recent_starts.pop_front();
        }

        if state.in_flight >= self.limits.max_in_flight {
            return Admission::WaitForRelease;
        }

        if let Some(max) = self.limits.max_per_window {
            let ceiling = usize::try_from(max).unwrap_or(usize::MAX);
            if state.recent_starts.len() >= ceiling
                && let Some(oldest) = state.recent_starts.front()
            {
                return Admission::WaitUntil(*oldest + window);
            }
        }

        state.in_flight += 1;
        state.recent_starts.push_back(now);
        Admission::Granted
    }

    fn release(&self) {
        {
            let mut state = self.state();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.released.notify_waiters();
    }
}

/// Admission controller shared by all workers of a run.
#[derive(Debug, Clone)]
pub struct RateGovernor {
    shared: Arc<Shared>,
}

impl RateGovernor {
    /// Creates a governor enforcing `limits`.
    #[must_use]
    pub fn new(limits: GovernorLimits) -> Self {
        Self {
            shared: Arc::new(Shared {
                limits,
                turnstile: tokio::sync::Mutex::new(()),
                state: Mutex::new(GovernorState::default()),
                released: Notify::new(),
            }),
        }
    }

    /// The limits this governor enforces.
    #[must_use]
    pub fn limits(&self) -> GovernorLimits {
        self.shared.limits
    }

    /// Number of tickets currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.state().in_flight
    }

    /// Waits until both ceilings allow another call, then reserves a slot.
    ///
    /// Callers are served in the order they started waiting. Dropping the
    /// returned future before it resolves gives up the place in line without
    /// reserving anything.
    pub async fn acquire(&self) -> GovernorTicket {
        let _turn = self.shared.turnstile.lock().await;
        loop {
            let notified = self.shared.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.shared.try_admit(Instant::now()) {
                Admission::Granted => {
                    return GovernorTicket {
                        shared: Arc::clone(&self.shared),
                    };
                }
                Admission::WaitForRelease => notified.await,
                Admission::WaitUntil(deadline) => tokio::time::sleep_until(deadline).await,
            }
        }
    }
}

/// A reserved in-flight slot. Dropping the ticket frees the slot.
#[derive(Debug)]
#[must_use = "dropping a ticket immediately releases its slot"]
pub struct GovernorTicket {
    shared: Arc<Shared>,
}

impl GovernorTicket {
    /// Frees the slot explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GovernorTicket {
    fn drop(&mut self) {
        self.shared.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use rstest::{fixture, rstest};
    use tokio::time::Instant;

    use super::{GovernorLimits, RateGovernor};

    #[fixture]
    fn unlimited_rate() -> GovernorLimits {
        GovernorLimits {
            max_in_flight: 1,
            max_per_window: None,
            window: Duration::from_secs(1),
        }
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn in_flight_ceiling_blocks_until_release(unlimited_rate: GovernorLimits) {
        let governor = RateGovernor::new(unlimited_rate);
        let first = governor.acquire().await;
        assert_eq!(governor.in_flight(), 1);

        let contender = governor.clone();
        let waiter = tokio::spawn(async move { contender.acquire().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished(), "second acquire should wait");

        first.release();
        let second = waiter.await.expect("waiter task should not panic");
        assert_eq!(governor.in_flight(), 1);
        drop(second);
        assert_eq!(governor.in_flight(), 0);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn rate_ceiling_spaces_starts_across_windows() {
        let governor = RateGovernor::new(GovernorLimits {
            max_in_flight: 10,
            max_per_window: Some(2),
            window: Duration::from_secs(1),
        });
        let started = Instant::now();

        let mut offsets = Vec::new();
        for _ in 0..5 {
            let ticket = governor.acquire().await;
            offsets.push(started.elapsed());
            ticket.release();
        }

        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(2),
            ]
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn waiters_are_admitted_in_arrival_order(unlimited_rate: GovernorLimits) {
        let governor = RateGovernor::new(unlimited_rate);
        let held = governor.acquire().await;
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for label in 0..3_u8 {
            let contender = governor.clone();
            let admitted = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let ticket = contender.acquire().await;
                admitted.lock().expect("order lock").push(label);
                tokio::time::sleep(Duration::from_millis(10)).await;
                drop(ticket);
            }));
            // Let each waiter queue before the next one is spawned.
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        drop(held);
        for handle in handles {
            handle.await.expect("waiter task should not panic");
        }

        assert_eq!(*order.lock().expect("order lock"), vec![0, 1, 2]);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn abandoned_acquire_reserves_nothing(unlimited_rate: GovernorLimits) {
        let governor = RateGovernor::new(unlimited_rate);
        let held = governor.acquire().await;

        let pending = tokio::time::timeout(Duration::from_millis(20), governor.acquire()).await;
        assert!(pending.is_err(), "acquire should still be waiting");

        drop(held);
        assert_eq!(governor.in_flight(), 0);
        let _ticket = governor.acquire().await;
        assert_eq!(governor.in_flight(), 1);
    }
}
