//! Board-agnostic core logic for driving hobby servo motors
//!
//! This crate contains everything that does not depend on a specific chip:
//!
//! - Hardware abstraction traits (PWM channel, periodic timer, timer source)
//! - Servo calibration and angle-to-duty conversion
//! - Motion state machine (constant-speed linear ramps)
//! - Shared pool of scarce hardware timer channels
//! - The [`servo::Servo`] facade tying the pieces together
//!
//! Chip-specific implementations of the traits live in sibling crates
//! (`strophe-esp32`). The core is fully testable on the host.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod calibration;
pub mod motion;
pub mod pool;
pub mod servo;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;
