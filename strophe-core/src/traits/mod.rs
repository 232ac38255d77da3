//! Hardware abstraction traits
//!
//! These traits define the interface between the motion logic and
//! chip-specific peripheral implementations.

pub mod pwm;
pub mod timer;

pub use pwm::PwmChannel;
pub use timer::{TimerChannel, TimerId, TimerSource};
