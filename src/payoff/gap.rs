use ndarray_rand::rand_distr::{Distribution, LogNormal, Uniform};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::PayoffError;

/// Source of strictly positive gaps between consecutive payoffs.
pub type Gap = Box<dyn Fn(&mut dyn RngCore) -> f64>;

/// Gaps drawn uniformly from `[low, high)`. Requires `0 < low < high`.
pub fn uniform(low: f64, high: f64) -> Result<impl Fn(&mut dyn RngCore) -> f64, PayoffError> {
    if !(low.is_finite() && high.is_finite() && 0. < low && low < high) {
        return Err(PayoffError::InvalidGap(format!(
            "uniform bounds must satisfy 0 < low < high, got [{low}, {high})"
        )));
    }
    let dist = Uniform::new(low, high);
    Ok(move |rng: &mut dyn RngCore| dist.sample(rng))
}

/// Gaps whose logarithm is normal with mean `mu` and deviation `sigma`.
pub fn lognormal(mu: f64, sigma: f64) -> Result<impl Fn(&mut dyn RngCore) -> f64, PayoffError> {
    if !(mu.is_finite() && sigma.is_finite() && sigma > 0.) {
        return Err(PayoffError::InvalidGap(format!(
            "lognormal needs finite mu and sigma > 0, got mu = {mu}, sigma = {sigma}"
        )));
    }
    let dist = LogNormal::new(mu, sigma).map_err(|e| PayoffError::InvalidGap(e.to_string()))?;
    Ok(move |rng: &mut dyn RngCore| dist.sample(rng))
}

/// Uniform gaps on `[0.2, 1.0)`.
pub fn default_gap() -> impl Fn(&mut dyn RngCore) -> f64 {
    let dist = Uniform::new(0.2, 1.0);
    move |rng: &mut dyn RngCore| dist.sample(rng)
}

/// Serializable description of a gap source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GapDistribution {
    Uniform { low: f64, high: f64 },
    LogNormal { mu: f64, sigma: f64 },
}

impl Default for GapDistribution {
    fn default() -> Self {
        GapDistribution::Uniform {
            low: 0.2,
            high: 1.0,
        }
    }
}

impl GapDistribution {
    pub fn sampler(&self) -> Result<Gap, PayoffError> {
        let gap: Gap = match *self {
            GapDistribution::Uniform { low, high } => Box::new(uniform(low, high)?),
            GapDistribution::LogNormal { mu, sigma } => Box::new(lognormal(mu, sigma)?),
        };
        Ok(gap)
    }
}
