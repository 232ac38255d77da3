//! PWM output channel abstraction

/// One PWM output channel driving a servo signal line.
///
/// Implementations handle the actual peripheral programming for the
/// specific chip. Duty values use the core's 10-bit scale
/// (see [`crate::calibration::DUTY_MAX`]); implementations rescale to
/// their hardware resolution as needed.
pub trait PwmChannel {
    /// Program the PWM carrier frequency in Hertz.
    fn set_frequency(&mut self, hz: u32);

    /// Set the duty value for the current period.
    ///
    /// A duty of zero drops the signal line low (no pulse).
    fn set_duty(&mut self, duty: u16);

    /// Release the peripheral: stop driving the pin entirely.
    ///
    /// After power-off the channel is not expected to accept further
    /// duty updates.
    fn power_off(&mut self);
}
