//! Motion state machine
//!
//! Tracks one servo's commanded angle against its target and advances it
//! one whole degree per tick. Speed is realized purely as the interval
//! between ticks (`1 / speed` seconds), never as a larger step size, so a
//! motion from `a` to `b` always takes exactly `|a - b|` ticks. The machine
//! is pure state; pushing duty values to the PWM peripheral and scheduling
//! the ticks is the facade's job.

/// Tick interval used before the first planned motion, in microseconds.
pub const DEFAULT_STEP_INTERVAL_US: u32 = 100_000;

/// Current motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Commanded angle equals the target; nothing to do
    Idle,
    /// Commanded angle is walking toward the target
    Moving,
}

/// Errors that can occur when planning a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Target angle outside the calibrated bounds
    OutOfRange,
    /// Speed of zero degrees per second
    InvalidSpeed,
}

/// Per-servo motion state machine
///
/// Angles are whole degrees. The machine never mutates state on a failed
/// plan, so callers can surface the error and retry.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motion {
    /// Currently commanded angle
    current: i32,
    /// Angle the motion is walking toward
    target: i32,
    /// Direction of travel: -1, 0 or +1
    step: i32,
    /// Microseconds between unit steps
    step_interval_us: u32,
    /// Lower angle bound (inclusive)
    min_angle: i32,
    /// Upper angle bound (inclusive)
    max_angle: i32,
}

impl Motion {
    /// Create a machine at `start` with the given angle bounds.
    ///
    /// `start` itself is not validated against the bounds; the first
    /// planned motion walks it inside them one degree at a time.
    pub const fn new(start: i32, min_angle: i32, max_angle: i32) -> Self {
        Self {
            current: start,
            target: start,
            step: 0,
            step_interval_us: DEFAULT_STEP_INTERVAL_US,
            min_angle,
            max_angle,
        }
    }

    /// Check a prospective motion without committing it.
    pub fn validate(&self, target: i32, speed: u32) -> Result<(), MotionError> {
        if !self.in_range(target) {
            return Err(MotionError::OutOfRange);
        }
        if speed == 0 {
            return Err(MotionError::InvalidSpeed);
        }
        Ok(())
    }

    /// Plan a ramped motion toward `target` at `speed` degrees per second.
    ///
    /// On success the machine is `Moving` (or already `Idle` when the
    /// target equals the current angle). On failure nothing changes.
    pub fn plan(&mut self, target: i32, speed: u32) -> Result<(), MotionError> {
        self.validate(target, speed)?;
        self.commit(target, speed);
        Ok(())
    }

    /// Commit a pre-validated plan.
    pub(crate) fn commit(&mut self, target: i32, speed: u32) {
        debug_assert!(self.validate(target, speed).is_ok());
        self.target = target;
        self.step = (target - self.current).signum();
        self.step_interval_us = 1_000_000 / speed;
    }

    /// Move to `target` instantly, with no intermediate positions.
    pub fn jump(&mut self, target: i32) -> Result<(), MotionError> {
        if !self.in_range(target) {
            return Err(MotionError::OutOfRange);
        }
        self.current = target;
        self.target = target;
        self.step = 0;
        Ok(())
    }

    /// Apply one unit step toward the target.
    ///
    /// Returns the new commanded angle, or `None` when already at the
    /// target.
    pub fn advance(&mut self) -> Option<i32> {
        if self.current == self.target {
            return None;
        }
        debug_assert!(self.step != 0);
        self.current += self.step;
        Some(self.current)
    }

    /// Check whether the commanded angle has reached the target.
    pub const fn goal_reached(&self) -> bool {
        self.current == self.target
    }

    /// Get the current motion state
    pub const fn state(&self) -> MotionState {
        if self.goal_reached() {
            MotionState::Idle
        } else {
            MotionState::Moving
        }
    }

    /// Currently commanded angle in degrees
    pub const fn current_angle(&self) -> i32 {
        self.current
    }

    /// Target angle in degrees
    pub const fn target_angle(&self) -> i32 {
        self.target
    }

    /// Direction of travel: -1, 0 or +1
    pub const fn step(&self) -> i32 {
        self.step
    }

    /// Microseconds between unit steps for the planned motion
    pub const fn step_interval_us(&self) -> u32 {
        self.step_interval_us
    }

    const fn in_range(&self, angle: i32) -> bool {
        self.min_angle <= angle && angle <= self.max_angle
    }
}
