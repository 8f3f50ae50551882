//! Random per-hop latency.

use crate::priv_prelude::*;
use crate::error::ConfigError;
use rand_distr::{Distribution, Normal};

/// The distribution latency samples are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayDistribution {
    /// Always the same delay.
    Constant(Duration),
    /// Normally distributed delay in milliseconds. Note that `variance` is the variance, not
    /// the standard deviation.
    Normal {
        mean_ms: f64,
        variance: f64,
    },
    /// `min` plus an exponentially distributed extra delay with mean `mean_additional`.
    Exponential {
        min: Duration,
        mean_additional: Duration,
    },
}

enum Sampler {
    Constant(f64),
    Normal(Normal<f64>),
    Exponential {
        min: Duration,
        mean_additional: Duration,
    },
}

/// Draws latency samples from a configured distribution using its own seeded random stream.
///
/// One generator is meant to be shared by every interception point of a run so that the whole
/// run consumes a single deterministic stream: the same seed always yields the same sequence of
/// samples.
pub struct RandomDelayGenerator {
    distribution: DelayDistribution,
    sampler: Sampler,
    rng: StdRng,
}

impl fmt::Debug for RandomDelayGenerator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f
        .debug_struct("RandomDelayGenerator")
        .field("distribution", &self.distribution)
        .finish()
    }
}

impl RandomDelayGenerator {
    pub fn new(distribution: DelayDistribution, seed: u64) -> Result<RandomDelayGenerator, ConfigError> {
        let sampler = match distribution {
            DelayDistribution::Constant(delay) => Sampler::Constant(delay.as_secs_f64() * 1e3),
            DelayDistribution::Normal { mean_ms, variance } => {
                if !(variance >= 0.0) {
                    return Err(ConfigError::Invalid {
                        name: "delay variance",
                        reason: format!("{} is not a non-negative number", variance),
                    });
                }
                let normal = Normal::new(mean_ms, variance.sqrt()).map_err(|err| {
                    ConfigError::Invalid {
                        name: "delay distribution",
                        reason: err.to_string(),
                    }
                })?;
                Sampler::Normal(normal)
            },
            DelayDistribution::Exponential { min, mean_additional } => {
                Sampler::Exponential { min, mean_additional }
            },
        };
        Ok(RandomDelayGenerator {
            distribution,
            sampler,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// A generator drawing from a normal distribution with the given mean (in milliseconds)
    /// and variance.
    pub fn normal(mean_ms: f64, variance: f64, seed: u64) -> Result<RandomDelayGenerator, ConfigError> {
        RandomDelayGenerator::new(DelayDistribution::Normal { mean_ms, variance }, seed)
    }

    pub fn distribution(&self) -> DelayDistribution {
        self.distribution
    }

    /// Restart the random stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Draw the next raw sample, in milliseconds. Normal samples can be negative.
    pub fn sample(&mut self) -> f64 {
        match self.sampler {
            Sampler::Constant(millis) => millis,
            Sampler::Normal(ref normal) => normal.sample(&mut self.rng),
            Sampler::Exponential { min, mean_additional } => {
                let extra = expovariate_duration(mean_additional, &mut self.rng);
                (min + extra).as_secs_f64() * 1e3
            },
        }
    }

    /// Draw the next sample as a delay. Negative samples are clamped to zero so that a delay
    /// never moves an event into the past.
    pub fn sample_duration(&mut self) -> Duration {
        Duration::from_millis_f64_saturating(self.sample())
    }
}

pub(crate) fn expovariate_duration<R>(
    mean_duration: Duration,
    rng: &mut R,
) -> Duration
where
    R: Rng,
{
    let mean_duration = mean_duration.as_secs_f64();
    loop {
        let duration = mean_duration * -rng.gen::<f64>().ln();
        match Duration::try_from_secs_f64(duration) {
            Ok(duration) => break duration,
            Err(_) => continue,
        }
    }
}
