use std::time::{Duration, Instant};

/// Elapsed-time source for the lantern shader.
///
/// Produces seconds since start, scaled by `time_scale`. The returned value
/// never decreases, and time spent paused does not count.
#[derive(Debug, Clone)]
pub struct SceneClock {
    start: Instant,
    time_scale: f32,
    paused_since: Option<Instant>,
    paused_total: Duration,
    fixed: Option<f32>,
    last: f32,
}

impl SceneClock {
    /// Start a wall-clock driven clock now.
    pub fn start(time_scale: f32) -> Self {
        Self::start_at(Instant::now(), time_scale)
    }

    pub fn start_at(start: Instant, time_scale: f32) -> Self {
        Self {
            start,
            time_scale,
            paused_since: None,
            paused_total: Duration::ZERO,
            fixed: None,
            last: 0.0,
        }
    }

    /// A clock frozen at `elapsed` seconds, for headless sampling.
    pub fn fixed(elapsed: f32) -> Self {
        Self {
            fixed: Some(elapsed.max(0.0)),
            ..Self::start(1.0)
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Sample the clock. Call once per frame.
    pub fn elapsed(&mut self) -> f32 {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&mut self, now: Instant) -> f32 {
        if let Some(t) = self.fixed {
            return t;
        }
        let reference = self.paused_since.unwrap_or(now);
        let running = reference
            .saturating_duration_since(self.start)
            .saturating_sub(self.paused_total);
        let t = running.as_secs_f32() * self.time_scale;
        self.last = self.last.max(t);
        self.last
    }

    pub fn pause(&mut self) {
        self.pause_at(Instant::now());
    }

    pub fn pause_at(&mut self, now: Instant) {
        if self.paused_since.is_none() {
            self.paused_since = Some(now);
        }
    }

    pub fn resume(&mut self) {
        self.resume_at(Instant::now());
    }

    pub fn resume_at(&mut self, now: Instant) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total += now.saturating_duration_since(since);
        }
    }

    /// Flip between paused and running. Returns true if now paused.
    pub fn toggle_pause(&mut self) -> bool {
        let now = Instant::now();
        if self.is_paused() {
            self.resume_at(now);
        } else {
            self.pause_at(now);
        }
        self.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn starts_at_zero() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 1.0);
        assert_eq!(clock.elapsed_at(t0), 0.0);
    }

    #[test]
    fn tracks_wall_time() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 1.0);
        let t = clock.elapsed_at(t0 + secs(2.5));
        assert!((t - 2.5).abs() < 1e-4);
    }

    #[test]
    fn never_decreases() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 1.0);
        let later = clock.elapsed_at(t0 + secs(5.0));
        let earlier = clock.elapsed_at(t0 + secs(1.0));
        assert_eq!(earlier, later);
    }

    #[test]
    fn time_scale_applies() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 0.5);
        let t = clock.elapsed_at(t0 + secs(4.0));
        assert!((t - 2.0).abs() < 1e-4);
        assert_eq!(clock.time_scale(), 0.5);
    }

    #[test]
    fn paused_time_is_excluded() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 1.0);
        clock.pause_at(t0 + secs(1.0));
        assert!(clock.is_paused());
        let during = clock.elapsed_at(t0 + secs(3.0));
        assert!((during - 1.0).abs() < 1e-4);

        clock.resume_at(t0 + secs(3.0));
        assert!(!clock.is_paused());
        let after = clock.elapsed_at(t0 + secs(4.0));
        assert!((after - 2.0).abs() < 1e-4);
    }

    #[test]
    fn double_pause_keeps_first_instant() {
        let t0 = Instant::now();
        let mut clock = SceneClock::start_at(t0, 1.0);
        clock.pause_at(t0 + secs(1.0));
        clock.pause_at(t0 + secs(2.0));
        clock.resume_at(t0 + secs(2.0));
        let t = clock.elapsed_at(t0 + secs(2.0));
        assert!((t - 1.0).abs() < 1e-4);
    }

    #[test]
    fn toggle_pause_flips_state() {
        let mut clock = SceneClock::start(1.0);
        assert!(clock.toggle_pause());
        assert!(!clock.toggle_pause());
    }

    #[test]
    fn fixed_clock_is_constant() {
        let mut clock = SceneClock::fixed(12.0);
        assert_eq!(clock.elapsed(), 12.0);
        assert_eq!(clock.elapsed(), 12.0);
        assert_eq!(SceneClock::fixed(-3.0).elapsed(), 0.0);
    }
}
