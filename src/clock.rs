/// A time update from the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Seconds since the session started.
    Absolute(f64),
    /// Seconds since the previous tick.
    Delta(f64),
}

/// Elapsed session time, advanced once per rendered frame.
///
/// Never decreases and never resets.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and return the new elapsed time.
    ///
    /// Ticks that would move the clock backwards, or are not finite,
    /// leave the time where it is but still count as a frame.
    pub fn advance(&mut self, tick: Tick) -> f32 {
        let target = match tick {
            Tick::Absolute(t) => t,
            Tick::Delta(dt) => self.elapsed + dt,
        };
        if target.is_finite() && target >= self.elapsed {
            self.elapsed = target;
        } else {
            log::warn!("ignoring clock tick {tick:?} at {:.3}s", self.elapsed);
        }
        self.frames += 1;
        self.elapsed()
    }

    /// Seconds since session start, at the precision the shaders use.
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clock = FrameClock::new();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn test_absolute_and_delta_ticks() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(Tick::Absolute(1.5)), 1.5);
        assert_eq!(clock.advance(Tick::Delta(0.25)), 1.75);
        assert_eq!(clock.advance(Tick::Absolute(3.0)), 3.0);
        assert_eq!(clock.frame_count(), 3);
    }

    #[test]
    fn test_never_goes_backwards() {
        let mut clock = FrameClock::new();
        clock.advance(Tick::Absolute(5.0));
        assert_eq!(clock.advance(Tick::Absolute(2.0)), 5.0);
        assert_eq!(clock.advance(Tick::Delta(-1.0)), 5.0);
        assert_eq!(clock.advance(Tick::Delta(f64::NAN)), 5.0);
        assert_eq!(clock.advance(Tick::Absolute(f64::INFINITY)), 5.0);
        assert_eq!(clock.frame_count(), 5);
    }

    #[test]
    fn test_monotonic_over_many_frames() {
        let mut clock = FrameClock::new();
        let mut previous = 0.0;
        for i in 0..1000 {
            let t = clock.advance(Tick::Delta(if i % 7 == 0 { -0.01 } else { 1.0 / 60.0 }));
            assert!(t >= previous);
            previous = t;
        }
    }
}
