/// Elapsed-time accumulator used for animation pacing, cooldowns and hit windows.
///
/// A timer never consumes itself: `ready()` only reports, and the caller
/// decides when to `reset()`. One rendered frame may or may not cross a
/// threshold depending on frame rate, so the owner resets after acting.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timer {
    elapsed: f32,
}

impl Timer {
    pub const fn new() -> Self {
        Timer { elapsed: 0.0 }
    }

    /// Start with time already on the clock (e.g. "last hit was long ago").
    pub const fn primed(elapsed: f32) -> Self {
        Timer { elapsed }
    }

    /// `dt` is seconds since the previous tick, always >= 0.
    #[inline]
    pub fn accumulate(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    #[inline]
    pub fn ready(&self, threshold: f32) -> bool {
        self.elapsed >= threshold
    }

    #[inline]
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    #[cfg(test)]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_does_not_consume() {
        let mut t = Timer::new();
        t.accumulate(0.05);
        assert!(!t.ready(0.075));
        t.accumulate(0.05);
        assert!(t.ready(0.075));
        assert!(t.ready(0.075));
        t.reset();
        assert!(!t.ready(0.075));
        assert_eq!(t.elapsed(), 0.0);
    }

    #[test]
    fn primed_timer_is_already_past_short_windows() {
        let t = Timer::primed(2.0);
        assert!(t.ready(0.5));
        assert!(t.ready(1.0));
        assert!(!t.ready(2.5));
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut t = Timer::primed(0.3);
        t.accumulate(0.0);
        assert_eq!(t.elapsed(), 0.3);
    }
}
