/// Explicit per-frame animation state handed to producers.
///
/// Replaces mutable "time" uniforms: a source never reads a global clock,
/// it is told which frame it is rendering.
///
/// # Example
/// ```
/// use ax_core::clock::FrameClock;
/// let clock = FrameClock::at_frame(30, 30);
/// assert_eq!(clock.frame, 30);
/// assert!((clock.time - 1.0).abs() < 1e-6);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameClock {
    /// Index of the frame being produced.
    pub frame: u64,
    /// Elapsed time in seconds.
    pub time: f32,
}

impl FrameClock {
    /// Clock for frame `frame` of a sequence running at `fps`.
    ///
    /// An `fps` of zero freezes time at 0.
    #[must_use]
    pub fn at_frame(frame: u64, fps: u32) -> Self {
        let time = if fps == 0 {
            0.0
        } else {
            (frame as f64 / f64::from(fps)) as f32
        };
        Self { frame, time }
    }

    /// Next frame at the same rate.
    #[must_use]
    pub fn advance(self, fps: u32) -> Self {
        Self::at_frame(self.frame + 1, fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_zero_fps_is_frozen() {
        let clock = FrameClock::at_frame(120, 0);
        assert_eq!(clock.time, 0.0);
    }

    #[test]
    fn clock_advance_steps_one_frame() {
        let clock = FrameClock::default().advance(60).advance(60);
        assert_eq!(clock.frame, 2);
        assert!((clock.time - 2.0 / 60.0).abs() < 1e-6);
    }
}
