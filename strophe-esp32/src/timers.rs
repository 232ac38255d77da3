//! Periodic timer channels on `esp_timer`
//!
//! ESP-IDF's `esp_timer` service dispatches callbacks from a dedicated
//! high-priority task, multiplexed over the chip's general-purpose
//! hardware timers. [`TIMER_CHANNELS`] bounds how many periodic channels
//! may be outstanding at once to the number of independent hardware
//! timers the selected chip actually has, which is what the shared
//! [`TimerPool`](strophe_core::pool::TimerPool) enforces.

use std::time::Duration;

use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use strophe_core::traits::{TimerChannel, TimerId, TimerSource};

/// General-purpose timer channels of the selected chip.
#[cfg(feature = "esp32")]
pub const TIMER_CHANNELS: &[TimerId] = &[TimerId(0), TimerId(1), TimerId(2), TimerId(3)];

/// General-purpose timer channels of the selected chip.
#[cfg(all(feature = "esp32s3", not(feature = "esp32")))]
pub const TIMER_CHANNELS: &[TimerId] = &[TimerId(0), TimerId(1), TimerId(2), TimerId(3)];

/// General-purpose timer channels of the selected chip.
#[cfg(all(feature = "esp32c3", not(any(feature = "esp32", feature = "esp32s3"))))]
pub const TIMER_CHANNELS: &[TimerId] = &[TimerId(0), TimerId(2)];

/// General-purpose timer channels of the selected chip.
#[cfg(all(
    feature = "esp32c6",
    not(any(feature = "esp32", feature = "esp32s3", feature = "esp32c3"))
))]
pub const TIMER_CHANNELS: &[TimerId] = &[TimerId(0), TimerId(2)];

/// General-purpose timer channels of the selected chip.
#[cfg(not(any(
    feature = "esp32",
    feature = "esp32s3",
    feature = "esp32c3",
    feature = "esp32c6"
)))]
pub const TIMER_CHANNELS: &[TimerId] = &[TimerId(0)];

/// Timer source backed by the `esp_timer` service.
pub struct EspTimers {
    service: EspTaskTimerService,
}

impl EspTimers {
    /// Connect to the `esp_timer` service.
    pub fn new() -> Result<Self, EspError> {
        Ok(Self {
            service: EspTaskTimerService::new()?,
        })
    }
}

/// One claimed periodic channel.
pub struct EspTimerChannel {
    service: EspTaskTimerService,
    timer: Option<EspTimer<'static>>,
}

impl TimerChannel for EspTimerChannel {
    fn start_periodic<F>(&mut self, interval_us: u32, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        let mut timer = self.service.timer(callback).unwrap();
        timer
            .every(Duration::from_micros(u64::from(interval_us)))
            .unwrap();
        self.timer = Some(timer);
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            let _ = timer.cancel();
        }
    }
}

impl TimerSource for EspTimers {
    type Timer = EspTimerChannel;

    fn channel_ids(&self) -> &[TimerId] {
        TIMER_CHANNELS
    }

    fn claim(&self, _id: TimerId) -> EspTimerChannel {
        EspTimerChannel {
            service: self.service.clone(),
            timer: None,
        }
    }
}
