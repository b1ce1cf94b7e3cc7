/// Frame-rate estimate smoothed over sampling windows.
///
/// Frames are counted as they are rendered; each call to [`sample`] turns the
/// count since the previous window into frames per second and averages it
/// with the previous estimate.
///
/// [`sample`]: FrameRateEstimator::sample
#[derive(Debug, Default)]
pub struct FrameRateEstimator {
    estimate: u32,
    frames: u32,
    last_sample_ms: u64,
}

impl FrameRateEstimator {
    pub fn new(now_ms: u64) -> Self {
        Self {
            estimate: 0,
            frames: 0,
            last_sample_ms: now_ms,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    /// Restarts the window without touching the smoothed estimate.
    pub fn restart(&mut self, now_ms: u64) {
        self.frames = 0;
        self.last_sample_ms = now_ms;
    }

    /// Closes the current window. A window of zero elapsed milliseconds is
    /// skipped: estimate, counter and timestamp stay as they were.
    pub fn sample(&mut self, now_ms: u64) -> u32 {
        let elapsed_ms = now_ms.saturating_sub(self.last_sample_ms);
        if elapsed_ms == 0 {
            return self.estimate;
        }

        let instantaneous = (self.frames as u64 * 1000 / elapsed_ms).min(u32::MAX as u64) as u32;
        self.estimate = ((self.estimate as u64 + instantaneous as u64) / 2) as u32;

        self.frames = 0;
        self.last_sample_ms = now_ms;
        self.estimate
    }

    pub fn estimate(&self) -> u32 {
        self.estimate
    }

    pub fn frames_since_sample(&self) -> u32 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_frames(start_ms: u64, frames: u32) -> FrameRateEstimator {
        let mut est = FrameRateEstimator::new(start_ms);
        for _ in 0..frames {
            est.record_frame();
        }
        est
    }

    #[test]
    fn thirty_frames_in_a_second_from_zero() {
        let mut est = with_frames(0, 30);
        assert_eq!(est.sample(1000), 15);
        assert_eq!(est.frames_since_sample(), 0);
    }

    #[test]
    fn zero_elapsed_window_is_skipped() {
        let mut est = with_frames(500, 12);
        assert_eq!(est.sample(500), 0);
        assert_eq!(est.estimate(), 0);
        assert_eq!(est.frames_since_sample(), 12);

        // The skipped window keeps accumulating into the next one.
        assert_eq!(est.sample(1500), 6);
    }

    #[test]
    fn estimate_converges_over_windows() {
        let mut est = FrameRateEstimator::new(0);
        let mut now = 0;
        for _ in 0..10 {
            for _ in 0..20 {
                est.record_frame();
            }
            now += 1000;
            est.sample(now);
        }
        assert_eq!(est.estimate(), 19);
    }

    #[test]
    fn restart_keeps_estimate() {
        let mut est = with_frames(0, 40);
        est.sample(1000);
        est.record_frame();
        est.restart(5000);
        assert_eq!(est.estimate(), 20);
        assert_eq!(est.frames_since_sample(), 0);
        assert_eq!(est.sample(6000), 10);
    }
}
