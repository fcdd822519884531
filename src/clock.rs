use log::trace;

// Monotonic elapsed time, advanced once per frame by the frame driver.
#[derive(Debug)]
pub struct Clock {
    start: std::time::Instant,
    iteration_start: std::time::Instant,
    pub iteration_duration: std::time::Duration,
    elapsed: f32,
}

impl Clock {
    pub fn new(fps: f64) -> Clock {
        let now = std::time::Instant::now();
        Clock {
            start: now,
            iteration_start: now,
            iteration_duration: std::time::Duration::from_secs_f64(1.0 / fps.max(1.0)),
            elapsed: 0.0,
        }
    }

    // Seconds since the clock started, as of the last tick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn tick(&mut self) -> f32 {
        let now = std::time::Instant::now();
        let frame_time = now.duration_since(self.iteration_start);
        if frame_time > self.iteration_duration {
            trace!(
                "Over time budget by: {:?}",
                frame_time - self.iteration_duration
            );
        }
        self.iteration_start = now;
        // Instant is monotonic, but keep the published value from ever going backwards.
        self.elapsed = self
            .elapsed
            .max(now.duration_since(self.start).as_secs_f32());
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = Clock::new(60.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn monotonic() {
        let mut clock = Clock::new(60.0);
        let mut last = clock.elapsed();
        for _ in 0..100 {
            let t = clock.tick();
            assert!(t >= last);
            assert_eq!(t, clock.elapsed());
            last = t;
        }
    }

    #[test]
    fn advances_with_wall_time() {
        let mut clock = Clock::new(60.0);
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(clock.tick() >= 0.02);
    }
}
