//! Host-side doubles for the hardware traits
//!
//! A recording PWM channel, a manually-fired timer source, and a counting
//! delay provider. Timer callbacks run exactly when a test calls
//! [`MockTimers::fire`], which makes the interleaving of application code
//! and "interrupt" context explicit and deterministic.

use std::boxed::Box;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::traits::{PwmChannel, TimerChannel, TimerId, TimerSource};

/// Put a fixture into static storage.
///
/// Asynchronous sweeps capture `&'static Servo`; tests get their
/// `'static` the blunt way.
pub(crate) fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

#[derive(Default)]
struct PwmState {
    frequency_hz: AtomicU32,
    powered_off: AtomicBool,
    duties: Mutex<Vec<u16>>,
}

/// PWM channel that records everything written to it.
pub(crate) struct MockPwm(Arc<PwmState>);

/// Read side of a [`MockPwm`], usable after the channel moved into a servo.
#[derive(Clone)]
pub(crate) struct PwmProbe(Arc<PwmState>);

impl MockPwm {
    pub fn new() -> (Self, PwmProbe) {
        let state = Arc::new(PwmState::default());
        (Self(Arc::clone(&state)), PwmProbe(state))
    }
}

impl PwmChannel for MockPwm {
    fn set_frequency(&mut self, hz: u32) {
        self.0.frequency_hz.store(hz, Ordering::SeqCst);
    }

    fn set_duty(&mut self, duty: u16) {
        self.0.duties.lock().unwrap().push(duty);
    }

    fn power_off(&mut self) {
        self.0.powered_off.store(true, Ordering::SeqCst);
    }
}

impl PwmProbe {
    pub fn frequency_hz(&self) -> u32 {
        self.0.frequency_hz.load(Ordering::SeqCst)
    }

    /// The most recent duty write.
    pub fn duty(&self) -> u16 {
        *self
            .0
            .duties
            .lock()
            .unwrap()
            .last()
            .expect("no duty written yet")
    }

    /// Total number of duty writes, the construction write included.
    pub fn duty_writes(&self) -> usize {
        self.0.duties.lock().unwrap().len()
    }

    pub fn powered_off(&self) -> bool {
        self.0.powered_off.load(Ordering::SeqCst)
    }
}

struct TimerSlot {
    id: TimerId,
    running: AtomicBool,
    interval_us: AtomicU32,
    callback: Mutex<Option<Box<dyn FnMut() + Send>>>,
}

/// Timer source whose channels tick only when the test says so.
pub(crate) struct MockTimers {
    ids: Vec<TimerId>,
    slots: Vec<Arc<TimerSlot>>,
}

/// One claimed channel of a [`MockTimers`].
pub(crate) struct MockTimer {
    slot: Arc<TimerSlot>,
}

impl MockTimers {
    pub fn new(ids: &[TimerId]) -> Self {
        let slots = ids
            .iter()
            .map(|&id| {
                Arc::new(TimerSlot {
                    id,
                    running: AtomicBool::new(false),
                    interval_us: AtomicU32::new(0),
                    callback: Mutex::new(None),
                })
            })
            .collect();
        Self {
            ids: ids.to_vec(),
            slots,
        }
    }

    fn slot(&self, id: TimerId) -> &Arc<TimerSlot> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .expect("unknown timer id")
    }

    pub fn running(&self, id: TimerId) -> bool {
        self.slot(id).running.load(Ordering::SeqCst)
    }

    pub fn interval_us(&self, id: TimerId) -> u32 {
        self.slot(id).interval_us.load(Ordering::SeqCst)
    }

    /// Deliver one periodic tick. Returns whether a callback ran.
    ///
    /// The callback is taken out of the slot for the duration of the call
    /// so it can cancel or restart its own channel without deadlocking,
    /// exactly as a hardware dispatcher would allow.
    pub fn fire(&self, id: TimerId) -> bool {
        let slot = self.slot(id);
        if !slot.running.load(Ordering::SeqCst) {
            return false;
        }
        let taken = slot.callback.lock().unwrap().take();
        let Some(mut callback) = taken else {
            return false;
        };
        callback();
        let mut held = slot.callback.lock().unwrap();
        if slot.running.load(Ordering::SeqCst) && held.is_none() {
            *held = Some(callback);
        }
        true
    }
}

impl TimerChannel for MockTimer {
    fn start_periodic<F>(&mut self, interval_us: u32, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        *self.slot.callback.lock().unwrap() = Some(Box::new(callback));
        self.slot.interval_us.store(interval_us, Ordering::SeqCst);
        self.slot.running.store(true, Ordering::SeqCst);
    }

    fn cancel(&mut self) {
        self.slot.running.store(false, Ordering::SeqCst);
    }
}

impl TimerSource for MockTimers {
    type Timer = MockTimer;

    fn channel_ids(&self) -> &[TimerId] {
        &self.ids
    }

    fn claim(&self, id: TimerId) -> MockTimer {
        MockTimer {
            slot: Arc::clone(self.slot(id)),
        }
    }
}

/// Delay provider that records instead of sleeping.
#[derive(Default)]
pub(crate) struct MockDelay {
    pub sleeps_us: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleeps_us.push(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.sleeps_us.push(us);
    }
}
