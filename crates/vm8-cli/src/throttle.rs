use std::thread;
use std::time::{Duration, Instant};

/// Lowest accepted clock rate in MHz.
pub const MIN_MHZ: f64 = 0.01;

/// Remaining lead below which pacing does not sleep.
const MIN_SLEEP: Duration = Duration::from_micros(10);

/// Paces execution to a simulated clock, one instruction per cycle.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    start: Instant,
    hz: f64,
}

impl Throttle {
    /// Starts the clock. Rates below [`MIN_MHZ`] are raised to it.
    pub fn new(mhz: f64) -> Self {
        Self {
            start: Instant::now(),
            hz: mhz.max(MIN_MHZ) * 1_000_000.0,
        }
    }

    /// Wall time by which `executed` instructions should have completed.
    #[allow(clippy::cast_precision_loss)]
    pub fn deadline(&self, executed: u64) -> Duration {
        Duration::from_secs_f64(executed as f64 / self.hz)
    }

    /// Sleeps while execution is ahead of the simulated clock.
    pub fn pace(&self, executed: u64) {
        let ahead = self.deadline(executed).saturating_sub(self.start.elapsed());
        if ahead > MIN_SLEEP {
            thread::sleep(ahead);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Throttle, MIN_MHZ};

    #[test]
    fn deadline_scales_with_clock_rate() {
        let throttle = Throttle::new(1.0);
        assert_eq!(throttle.deadline(1_000_000), Duration::from_secs(1));
        assert_eq!(throttle.deadline(0), Duration::ZERO);
    }

    #[test]
    fn slow_rates_are_clamped() {
        let clamped = Throttle::new(0.0);
        let floor = Throttle::new(MIN_MHZ);
        assert_eq!(clamped.deadline(10_000), floor.deadline(10_000));
        assert_eq!(clamped.deadline(10_000), Duration::from_secs(1));
    }
}
