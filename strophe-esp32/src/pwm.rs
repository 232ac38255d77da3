//! LEDC-backed PWM channel
//!
//! The LEDC peripheral fixes the carrier frequency on the timer a channel
//! is bound to, so the frequency is chosen when the caller builds the
//! [`LedcDriver`] (50 Hz and 10-bit resolution for the common hobby
//! servo). The wrapper rescales the core's 10-bit duty values to whatever
//! resolution the channel was actually configured with.

use esp_idf_hal::ledc::LedcDriver;

use strophe_core::calibration::DUTY_MAX;
use strophe_core::traits::PwmChannel;

/// One LEDC channel driving a servo signal line.
pub struct LedcPwm<'d> {
    driver: LedcDriver<'d>,
    max_duty: u32,
    timer_hz: u32,
}

impl<'d> LedcPwm<'d> {
    /// Wrap a configured LEDC channel.
    ///
    /// `timer_hz` is the frequency the channel's LEDC timer was built
    /// with; it must match the servo calibration's `frequency_hz`.
    pub fn new(driver: LedcDriver<'d>, timer_hz: u32) -> Self {
        let max_duty = driver.get_max_duty();
        log::info!("ledc servo pwm: max_duty={max_duty} timer={timer_hz}Hz");
        Self {
            driver,
            max_duty,
            timer_hz,
        }
    }
}

impl PwmChannel for LedcPwm<'_> {
    fn set_frequency(&mut self, hz: u32) {
        // The carrier is fixed on the LEDC timer at construction.
        debug_assert_eq!(
            hz, self.timer_hz,
            "calibration frequency must match the LEDC timer"
        );
    }

    fn set_duty(&mut self, duty: u16) {
        let scaled = u32::from(duty) * self.max_duty / u32::from(DUTY_MAX);
        // Infallible for duty values within the channel resolution.
        self.driver.set_duty(scaled).unwrap();
    }

    fn power_off(&mut self) {
        // Drop the line low; the LEDC channel itself is released when the
        // driver is dropped.
        self.driver.set_duty(0).unwrap();
    }
}
