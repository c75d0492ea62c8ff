use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// A uniformly random pause between `min_secs` and `max_secs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min_secs: f64,
    max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// No pause at all.
    pub const fn none() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    pub fn is_valid(&self) -> bool {
        self.min_secs.is_finite()
            && self.max_secs.is_finite()
            && self.min_secs >= 0.0
            && self.min_secs <= self.max_secs
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if !self.is_valid() {
            return Duration::ZERO;
        }
        if self.min_secs == self.max_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        Duration::from_secs_f64(rng.random_range(self.min_secs..=self.max_secs))
    }

    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::rng())
    }

    /// Sleeps for a freshly sampled duration and returns it.
    pub async fn sleep(&self) -> Duration {
        let pause = self.sample();
        if !pause.is_zero() {
            debug!("Sleeping for {:.2}s", pause.as_secs_f64());
            tokio::time::sleep(pause).await;
        }
        pause
    }
}

impl From<[f64; 2]> for DelayRange {
    fn from([min_secs, max_secs]: [f64; 2]) -> Self {
        Self::new(min_secs, max_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_samples_stay_in_range() {
        let range = DelayRange::new(3.0, 5.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let secs = range.sample_with(&mut rng).as_secs_f64();
            assert!((3.0..=5.0).contains(&secs), "{} out of range", secs);
        }
    }

    #[test]
    fn test_fixed_and_invalid_ranges() {
        assert_eq!(DelayRange::new(1.5, 1.5).sample(), Duration::from_millis(1500));
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);

        let inverted = DelayRange::new(5.0, 3.0);
        assert!(!inverted.is_valid());
        assert_eq!(inverted.sample(), Duration::ZERO);
        assert!(!DelayRange::new(-1.0, 2.0).is_valid());
    }

    #[tokio::test]
    async fn test_sleep_none_returns_immediately() {
        assert_eq!(DelayRange::none().sleep().await, Duration::ZERO);
    }
}
