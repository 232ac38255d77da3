//! Servo facade
//!
//! A [`Servo`] owns one PWM channel and one calibration profile, and
//! composes the motion state machine with the shared timer pool. Moves come
//! in three flavors:
//!
//! - [`set_angle`](Servo::set_angle): instantaneous, one duty write
//! - [`sweep_blocking`](Servo::sweep_blocking): ramped, occupies the
//!   calling thread for the whole travel
//! - [`sweep`](Servo::sweep): ramped, driven by a borrowed hardware timer;
//!   returns immediately
//!
//! All mutable state sits behind a critical-section mutex because the
//! asynchronous path mutates it from timer-callback context. The callback
//! captures a `&'static Servo`, so asynchronous motion requires the servo
//! in static storage, the usual home of interrupt-facing device state.
//! At most one motion per servo is active at a time: every motion-starting
//! operation first cancels and returns any timer still held by the
//! previous one.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;

use crate::calibration::Calibration;
use crate::motion::{Motion, MotionError};
use crate::pool::{PoolError, TimerLease, TimerPool};
use crate::traits::{PwmChannel, TimerChannel, TimerSource};

/// Errors that can occur when commanding a servo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// Target angle outside the calibrated bounds
    OutOfRange,
    /// Speed of zero degrees per second
    InvalidSpeed,
    /// No hardware timer channel free for an asynchronous move
    NoFreeTimers,
}

impl From<MotionError> for ServoError {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::OutOfRange => Self::OutOfRange,
            MotionError::InvalidSpeed => Self::InvalidSpeed,
        }
    }
}

impl From<PoolError> for ServoError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::NoFreeTimers => Self::NoFreeTimers,
        }
    }
}

/// A timer borrowed from the pool, running a motion.
struct ActiveTimer<T> {
    lease: TimerLease,
    timer: T,
}

struct Inner<P, T> {
    pwm: P,
    motion: Motion,
    active: Option<ActiveTimer<T>>,
    detached: bool,
}

/// Cancel and extract the active timer, if any.
///
/// The caller releases the lease back to the pool outside the servo's
/// critical section. Taking the option inside the section is what keeps a
/// racing `stop()` and callback completion from both releasing: only one
/// of them gets `Some`.
fn take_active<P, T: TimerChannel>(inner: &mut Inner<P, T>) -> Option<ActiveTimer<T>> {
    inner.active.take().map(|mut active| {
        active.timer.cancel();
        active
    })
}

/// One hobby servo on one PWM channel.
///
/// Construction programs the PWM frequency, drives the start angle
/// immediately, and seeds the shared [`TimerPool`] from the platform's
/// capability query if no one has yet.
pub struct Servo<P: PwmChannel, S: TimerSource> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<P, S::Timer>>>,
    calibration: Calibration,
    pool: &'static TimerPool,
    timers: &'static S,
}

impl<P: PwmChannel, S: TimerSource> Servo<P, S> {
    /// Create a servo and drive it to `start_angle` immediately.
    ///
    /// `start_angle` is not validated against the calibration bounds; the
    /// first ramped move walks it inside them one degree at a time.
    ///
    /// # Panics
    ///
    /// Panics if the calibration violates its invariants
    /// (see [`Calibration::is_valid`]).
    pub fn new(
        mut pwm: P,
        calibration: Calibration,
        start_angle: i32,
        pool: &'static TimerPool,
        timers: &'static S,
    ) -> Self {
        assert!(calibration.is_valid(), "invalid servo calibration");
        pool.seed(timers.channel_ids());

        pwm.set_frequency(calibration.frequency_hz);
        pwm.set_duty(calibration.duty_for(start_angle));

        let motion = Motion::new(start_angle, calibration.min_angle, calibration.max_angle);
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                pwm,
                motion,
                active: None,
                detached: false,
            })),
            calibration,
            pool,
            timers,
        }
    }

    /// Move to `target` instantly: a single duty write, no ramp.
    pub fn set_angle(&self, target: i32) -> Result<(), ServoError> {
        let prior = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            assert!(!inner.detached, "servo used after detach");
            inner.motion.jump(target)?;
            let duty = self.calibration.duty_for(target);
            inner.pwm.set_duty(duty);
            Ok::<_, ServoError>(take_active(&mut inner))
        })?;
        if let Some(active) = prior {
            self.pool.release(active.lease);
        }
        Ok(())
    }

    /// Ramp to `target` at `speed` degrees per second, blocking the
    /// calling thread for the whole travel.
    ///
    /// Returns once the target is reached; the line stays powered at the
    /// target position.
    pub fn sweep_blocking<D: DelayNs>(
        &self,
        target: i32,
        speed: u32,
        delay: &mut D,
    ) -> Result<(), ServoError> {
        let prior = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            assert!(!inner.detached, "servo used after detach");
            inner.motion.plan(target, speed)?;
            Ok::<_, ServoError>(take_active(&mut inner))
        })?;
        if let Some(active) = prior {
            self.pool.release(active.lease);
        }

        loop {
            let stepped = self.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                let angle = inner.motion.advance()?;
                let duty = self.calibration.duty_for(angle);
                inner.pwm.set_duty(duty);
                Some(inner.motion.step_interval_us())
            });
            match stepped {
                Some(interval_us) => delay.delay_us(interval_us),
                None => return Ok(()),
            }
        }
    }

    /// Ramp to `target` at `speed` degrees per second on a borrowed
    /// hardware timer, returning immediately.
    ///
    /// Fails with [`ServoError::NoFreeTimers`] when the pool is exhausted,
    /// leaving the motion state untouched; the caller may fall back to
    /// [`sweep_blocking`](Self::sweep_blocking). When the target is
    /// reached the completing callback powers the line down and returns
    /// the timer to the pool.
    pub fn sweep(&'static self, target: i32, speed: u32) -> Result<(), ServoError>
    where
        P: Send + 'static,
        S: Sync + 'static,
        S::Timer: Send + 'static,
    {
        // Validate and wind down any previous motion before touching the
        // pool; nothing is committed yet.
        let (prior, current) = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            assert!(!inner.detached, "servo used after detach");
            inner.motion.validate(target, speed)?;
            Ok::<_, ServoError>((take_active(&mut inner), inner.motion.current_angle()))
        })?;
        if let Some(active) = prior {
            self.pool.release(active.lease);
        }

        if current == target {
            // Already there: commit the trivial plan, acquire nothing.
            self.inner.lock(|cell| {
                cell.borrow_mut().motion.commit(target, speed);
            });
            return Ok(());
        }

        let lease = self.pool.acquire()?;
        let timer = self.timers.claim(lease.id());
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            inner.motion.commit(target, speed);
            let mut active = ActiveTimer { lease, timer };
            active
                .timer
                .start_periodic(inner.motion.step_interval_us(), move || self.tick());
            inner.active = Some(active);
        });
        Ok(())
    }

    /// One asynchronous motion step, run from timer-callback context.
    fn tick(&self) {
        let finished = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            // A callback may already be in flight when stop() cancels the
            // timer; it no longer owns a motion and must not advance one.
            if inner.active.is_none() {
                return None;
            }
            match inner.motion.advance() {
                Some(angle) => {
                    let duty = self.calibration.duty_for(angle);
                    inner.pwm.set_duty(duty);
                    None
                }
                None => {
                    inner.pwm.set_duty(0);
                    take_active(&mut inner)
                }
            }
        });
        if let Some(active) = finished {
            self.pool.release(active.lease);
        }
    }

    /// Whether the commanded angle has reached the target angle.
    pub fn goal_reached(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().motion.goal_reached())
    }

    /// Abandon any motion in progress and power the signal line down.
    ///
    /// Releases a held timer back to the pool and zeroes the duty, whether
    /// or not a motion was running. The commanded and target angles are
    /// left as they were, so an abandoned motion still reports
    /// `goal_reached() == false`.
    pub fn stop(&self) {
        let prior = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let prior = take_active(&mut inner);
            inner.pwm.set_duty(0);
            prior
        });
        if let Some(active) = prior {
            self.pool.release(active.lease);
        }
    }

    /// Release the PWM peripheral entirely.
    ///
    /// Stops any motion in progress first. After detaching, the servo
    /// must not be commanded again; motion operations assert.
    pub fn detach(&self) {
        let prior = self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let prior = take_active(&mut inner);
            inner.pwm.set_duty(0);
            inner.pwm.power_off();
            inner.detached = true;
            prior
        });
        if let Some(active) = prior {
            self.pool.release(active.lease);
        }
    }

    /// Currently commanded angle in degrees
    pub fn current_angle(&self) -> i32 {
        self.inner.lock(|cell| cell.borrow().motion.current_angle())
    }

    /// Target angle in degrees
    pub fn target_angle(&self) -> i32 {
        self.inner.lock(|cell| cell.borrow().motion.target_angle())
    }

    /// The servo's calibration profile
    pub const fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}
