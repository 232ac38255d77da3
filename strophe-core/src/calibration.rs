//! Servo calibration and angle-to-duty conversion
//!
//! A [`Calibration`] describes one servo's electrical envelope: the pulse
//! width bounds, the PWM frequency, and the mechanical angle range. The
//! angle-to-duty mapping is pure integer math so the same inputs always
//! produce the same duty value, on device and in host tests.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Full-scale duty value of the 10-bit PWM range the core emits.
pub const DUTY_MAX: u16 = 1023;

/// Calibration profile for a single servo.
///
/// The defaults describe the common SG90-style hobby servo: 0.5-2.5 ms
/// pulse at 50 Hz over 0..=180 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Pulse width for the low end of travel, in microseconds
    pub pulse_min_us: u32,
    /// Pulse width for the high end of travel, in microseconds
    pub pulse_max_us: u32,
    /// PWM carrier frequency in Hertz
    pub frequency_hz: u32,
    /// Minimum commandable angle in degrees (inclusive)
    pub min_angle: i32,
    /// Maximum commandable angle in degrees (inclusive)
    pub max_angle: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pulse_min_us: 500,
            pulse_max_us: 2_500,
            frequency_hz: 50,
            min_angle: 0,
            max_angle: 180,
        }
    }
}

impl Calibration {
    /// Check the profile invariants: ordered angle bounds, ordered pulse
    /// bounds, positive frequency, positive maximum angle.
    pub const fn is_valid(&self) -> bool {
        self.min_angle <= self.max_angle
            && self.pulse_min_us < self.pulse_max_us
            && self.frequency_hz > 0
            && self.max_angle > 0
    }

    /// Check whether an angle lies within the calibrated range.
    pub const fn contains(&self, angle: i32) -> bool {
        self.min_angle <= angle && angle <= self.max_angle
    }

    /// Convert an angle to a 10-bit duty value.
    ///
    /// The pulse width is interpolated between `pulse_min_us` and
    /// `pulse_max_us` by the fraction `angle / max_angle`. The fraction is
    /// deliberately taken against `max_angle` rather than the
    /// `max_angle - min_angle` span, so profiles with a non-zero
    /// `min_angle` keep the same duty curve as the full-range profile
    /// restricted to their window.
    ///
    /// The result truncates toward zero; values below zero saturate at
    /// zero. The input is not clamped to the angle bounds - range
    /// validation is the motion controller's job.
    pub fn duty_for(&self, angle: i32) -> u16 {
        let span = i64::from(self.pulse_max_us - self.pulse_min_us);
        let max_angle = i64::from(self.max_angle);
        // Pulse width in µs, scaled by max_angle so the division below is
        // a single exact truncation.
        let pulse_scaled = i64::from(self.pulse_min_us) * max_angle + i64::from(angle) * span;
        let duty = pulse_scaled * i64::from(self.frequency_hz) * i64::from(DUTY_MAX)
            / (1_000_000 * max_angle);
        duty.clamp(0, i64::from(u16::MAX)) as u16
    }
}
