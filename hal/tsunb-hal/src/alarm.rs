//! Microsecond time base and one-shot alarm
//!
//! Times are the low 32 bits of a free-running 1 MHz counter. They wrap
//! roughly every 71 minutes, so all comparisons must be done on wrapping
//! differences, never with `<` on raw values.

/// Free-running microsecond counter
pub trait TimeSource {
    /// Current counter value in microseconds (wrapping)
    fn now_us(&self) -> u32;
}

/// One-shot hardware alarm on the [`TimeSource`] counter
///
/// The alarm fires an interrupt once when the counter reaches the armed
/// deadline. Arming again replaces the previous deadline.
pub trait Alarm: TimeSource {
    /// Arm the alarm to fire at the absolute counter value `deadline_us`
    ///
    /// If the deadline is not in the future (wrapping difference to now is
    /// zero or negative) the alarm must fire as soon as possible rather than
    /// waiting for the counter to wrap around.
    fn arm_at(&mut self, deadline_us: u32);

    /// Cancel any armed deadline
    ///
    /// No interrupt fires for a cancelled deadline, except one that was
    /// already latched before the call.
    fn disarm(&mut self);
}

/// Signed distance from `now` to `deadline` in microseconds
///
/// Positive when the deadline is in the future.
#[inline]
pub fn until(deadline_us: u32, now_us: u32) -> i32 {
    deadline_us.wrapping_sub(now_us) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_until_future_and_past() {
        assert_eq!(until(1_000, 400), 600);
        assert_eq!(until(400, 1_000), -600);
        assert_eq!(until(500, 500), 0);
    }

    #[test]
    fn test_until_across_wrap() {
        // Deadline just after the counter wraps
        assert_eq!(until(10, u32::MAX - 9), 20);
        // Deadline just before the wrap, now just after
        assert_eq!(until(u32::MAX - 9, 10), -20);
    }
}
