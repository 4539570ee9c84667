use std::time::{Duration, Instant};

/// Stand-in for the display refresh signal of the live loop.
///
/// `wait` returns once per interval. A tick that ran late does not cause a
/// burst of catch-up ticks; the schedule restarts from now.
#[derive(Debug, Clone)]
pub struct FrameTicker {
    interval: Duration,
    next: Instant,
    ticks: u64,
}

impl FrameTicker {
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

        Self {
            interval,
            next: Instant::now() + interval,
            ticks: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn wait(&mut self) -> u64 {
        let now = Instant::now();

        if self.next > now {
            spin_sleep::sleep(self.next - now);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }

        self.ticks += 1;
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval() {
        assert_eq!(FrameTicker::new(50).interval(), Duration::from_millis(20));
        assert_eq!(FrameTicker::new(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_wait_paces_ticks() {
        let mut ticker = FrameTicker::new(100);
        let start = Instant::now();

        for expected in 1..=5 {
            assert_eq!(ticker.wait(), expected);
        }

        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
