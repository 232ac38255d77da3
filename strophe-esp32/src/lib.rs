//! ESP32-family bindings for the servo motion core
//!
//! Implements the core's hardware traits on top of the ESP-IDF
//! peripherals:
//!
//! - [`pwm::LedcPwm`] drives the servo signal from an LEDC channel
//! - [`timers::EspTimers`] hands out periodic `esp_timer` channels and
//!   carries the per-chip capability table that sizes the shared pool
//!
//! Select the target chip with a cargo feature (`esp32`, `esp32s3`,
//! `esp32c3`, `esp32c6`); without one a single timer channel is assumed.

pub mod pwm;
pub mod timers;

pub use pwm::LedcPwm;
pub use timers::{EspTimers, TIMER_CHANNELS};
