//! Shared pool of hardware timer channels
//!
//! Hardware timers are scarce: a chip offers a handful of independent
//! channels and every servo running an asynchronous motion needs one. The
//! pool is the process-wide ledger of which channels exist and which are
//! out on loan. It is seeded exactly once, on first need, from the
//! platform capability query, and is never torn down.
//!
//! Leases are affine: [`TimerPool::release`] consumes the
//! [`TimerLease`], so a channel cannot be returned twice.
//!
//! Allocation state is mutated from application code and from timer
//! callbacks (a completing motion releases its own channel), so every
//! access runs inside a critical section rather than a blocking lock.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::traits::TimerId;

/// Upper bound on timer channels any platform can register.
pub const MAX_TIMER_CHANNELS: usize = 8;

/// Errors that can occur when borrowing from the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PoolError {
    /// Every registered channel is already leased out
    NoFreeTimers,
}

/// Exclusive loan of one timer channel.
///
/// Deliberately neither `Clone` nor `Copy`: handing the lease back via
/// [`TimerPool::release`] consumes it.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerLease {
    index: usize,
    id: TimerId,
}

impl TimerLease {
    /// The leased channel's identifier.
    pub const fn id(&self) -> TimerId {
        self.id
    }
}

struct PoolState {
    channels: Vec<TimerId, MAX_TIMER_CHANNELS>,
    in_use: [bool; MAX_TIMER_CHANNELS],
    seeded: bool,
}

/// Process-wide registry of hardware timer channels.
///
/// Constructed in a `static` (the constructor is `const`) and passed by
/// shared reference to every servo instance.
pub struct TimerPool {
    state: Mutex<CriticalSectionRawMutex, RefCell<PoolState>>,
}

impl TimerPool {
    /// Create an empty, unseeded pool.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(PoolState {
                channels: Vec::new(),
                in_use: [false; MAX_TIMER_CHANNELS],
                seeded: false,
            })),
        }
    }

    /// Register the platform's timer channels.
    ///
    /// The first call fixes the channel set for the lifetime of the pool
    /// and returns `true`; later calls change nothing and return `false`.
    pub fn seed(&self, ids: &[TimerId]) -> bool {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.seeded {
                return false;
            }
            state
                .channels
                .extend_from_slice(ids)
                .expect("timer channel set exceeds pool capacity");
            state.seeded = true;
            true
        })
    }

    /// Whether [`seed`](Self::seed) has run.
    pub fn is_seeded(&self) -> bool {
        self.state.lock(|state| state.borrow().seeded)
    }

    /// Borrow the first free channel, scanning in registration order.
    pub fn acquire(&self) -> Result<TimerLease, PoolError> {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            for index in 0..state.channels.len() {
                if !state.in_use[index] {
                    state.in_use[index] = true;
                    return Ok(TimerLease {
                        index,
                        id: state.channels[index],
                    });
                }
            }
            Err(PoolError::NoFreeTimers)
        })
    }

    /// Return a leased channel to the pool.
    pub fn release(&self, lease: TimerLease) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            debug_assert!(state.in_use[lease.index]);
            state.in_use[lease.index] = false;
        });
    }

    /// Number of registered channels.
    pub fn capacity(&self) -> usize {
        self.state.lock(|state| state.borrow().channels.len())
    }

    /// Number of channels currently available to borrow.
    pub fn free_count(&self) -> usize {
        self.state.lock(|state| {
            let state = state.borrow();
            (0..state.channels.len())
                .filter(|&index| !state.in_use[index])
                .count()
        })
    }
}

impl Default for TimerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: &[TimerId] = &[TimerId(0), TimerId(1), TimerId(2), TimerId(3)];

    #[test]
    fn seed_runs_once() {
        let pool = TimerPool::new();
        assert!(!pool.is_seeded());
        assert_eq!(pool.capacity(), 0);

        assert!(pool.seed(IDS));
        assert!(pool.is_seeded());
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.free_count(), 4);

        // A second seed is ignored, whatever it carries.
        assert!(!pool.seed(&[TimerId(9)]));
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn acquire_scans_in_registration_order() {
        let pool = TimerPool::new();
        pool.seed(&[TimerId(0), TimerId(2)]);

        let first = pool.acquire().unwrap();
        assert_eq!(first.id(), TimerId(0));
        let second = pool.acquire().unwrap();
        assert_eq!(second.id(), TimerId(2));
    }

    #[test]
    fn exhaustion_is_recoverable() {
        let pool = TimerPool::new();
        pool.seed(&[TimerId(0), TimerId(1)]);

        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.acquire().unwrap_err(), PoolError::NoFreeTimers);
        assert_eq!(pool.free_count(), 0);

        pool.release(a);
        assert_eq!(pool.free_count(), 1);
        // The freed channel comes back first.
        assert_eq!(pool.acquire().unwrap().id(), TimerId(0));
    }

    #[test]
    fn unseeded_pool_has_nothing_to_lend() {
        let pool = TimerPool::new();
        assert_eq!(pool.acquire().unwrap_err(), PoolError::NoFreeTimers);
    }

    #[test]
    fn distinct_leases_for_concurrent_borrowers() {
        let pool = TimerPool::new();
        pool.seed(IDS);

        let leases: std::vec::Vec<TimerLease> =
            (0..4).map(|_| pool.acquire().unwrap()).collect();
        for (i, a) in leases.iter().enumerate() {
            for b in &leases[i + 1..] {
                assert_ne!(a.id(), b.id());
            }
        }
    }
}
