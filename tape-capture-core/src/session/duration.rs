use std::time::Duration;

/// Active-recording time, excluding paused intervals.
///
/// Fed with readings from a monotonic `Clock`, so neither wall-clock jumps
/// nor pause/resume cycles count towards the tape length.
#[derive(Debug, Clone, Default)]
pub struct DurationTracker {
    started_at: Option<Duration>,
    paused_total: Duration,
    paused_at: Option<Duration>,
}

impl DurationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Duration) {
        self.started_at = Some(now);
        self.paused_total = Duration::ZERO;
        self.paused_at = None;
    }

    pub fn pause(&mut self, now: Duration) {
        if self.started_at.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Duration) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_sub(paused_at);
        }
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        let Some(start) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.paused_at.unwrap_or(now);
        end.saturating_sub(start).saturating_sub(self.paused_total)
    }

    pub fn elapsed_secs(&self, now: Duration) -> f64 {
        self.elapsed(now).as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn zero_before_start() {
        assert_eq!(DurationTracker::new().elapsed(secs(100)), Duration::ZERO);
    }

    #[test]
    fn counts_from_start() {
        let mut tracker = DurationTracker::new();
        tracker.start(secs(5));
        assert_eq!(tracker.elapsed(secs(30)), secs(25));
    }

    #[test]
    fn frozen_while_paused() {
        let mut tracker = DurationTracker::new();
        tracker.start(secs(0));
        tracker.pause(secs(10));
        assert_eq!(tracker.elapsed(secs(70)), secs(10));

        tracker.resume(secs(70));
        assert_eq!(tracker.elapsed(secs(85)), secs(25));
    }

    #[test]
    fn repeated_pause_keeps_first_mark() {
        let mut tracker = DurationTracker::new();
        tracker.start(secs(0));
        tracker.pause(secs(10));
        tracker.pause(secs(20));
        tracker.resume(secs(30));
        tracker.resume(secs(40));
        assert_eq!(tracker.elapsed(secs(45)), secs(25));
    }
}
