//! Periodic hardware timer abstraction
//!
//! Hardware timers are a scarce platform resource. The core never talks to
//! a concrete timer peripheral: it books channel identifiers through the
//! [`crate::pool::TimerPool`] and materializes a leased identifier into a
//! running channel through a [`TimerSource`].

/// Identifier of one independent hardware timer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub u8);

/// One periodic hardware timer channel.
///
/// Callbacks run in the timer's dispatch context (interrupt or dedicated
/// task, depending on the chip), preemptively with respect to application
/// code. They must therefore be `Send` and own whatever state they touch
/// for `'static`.
pub trait TimerChannel {
    /// Start invoking `callback` every `interval_us` microseconds.
    ///
    /// Starting an already-running channel replaces the previous schedule
    /// and callback.
    fn start_periodic<F>(&mut self, interval_us: u32, callback: F)
    where
        F: FnMut() + Send + 'static;

    /// Stop the periodic schedule.
    ///
    /// A callback dispatch already in flight may still complete; no new
    /// dispatches begin after cancel returns. Safe to call from within the
    /// channel's own callback.
    fn cancel(&mut self);
}

/// Platform capability query and timer factory.
///
/// `channel_ids` sizes the shared [`crate::pool::TimerPool`] once at
/// startup; `claim` turns an identifier the pool has leased out into a
/// usable channel. Claiming an identifier that is not currently leased
/// from the pool is a programming error.
pub trait TimerSource {
    /// The channel type this source materializes.
    type Timer: TimerChannel;

    /// The independent timer channels this platform offers.
    fn channel_ids(&self) -> &[TimerId];

    /// Materialize the channel behind a leased identifier.
    fn claim(&self, id: TimerId) -> Self::Timer;
}
