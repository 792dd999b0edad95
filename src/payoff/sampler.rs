use log::debug;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{GapDistribution, PayoffError, PdPayoffs};

/// Draws of the three gaps before giving up.
pub const MAX_ATTEMPTS: usize = 10_000;

/// Sampler settings as stored in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub seed: Option<u64>,
    pub gap: GapDistribution,
    pub s_zero: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            gap: GapDistribution::default(),
            s_zero: true,
        }
    }
}

impl SamplerConfig {
    pub fn sample(&self) -> Result<PdPayoffs, PayoffError> {
        sample_pd(self.seed, self.gap.sampler()?, self.s_zero)
    }
}

/// Samples payoffs with a fresh `StdRng`, seeded from `seed` or from system
/// entropy.
pub fn sample_pd<G>(seed: Option<u64>, gap: G, s_zero: bool) -> Result<PdPayoffs, PayoffError>
where
    G: Fn(&mut dyn RngCore) -> f64,
{
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    sample_pd_with_rng(&mut rng, &gap, s_zero)
}

/// `S` is zero or a gap, then `P`, `R` and `T` each add one gap. The three
/// gaps are redrawn until the temptation gap is below the sum of the other
/// two, at most [`MAX_ATTEMPTS`] times.
pub fn sample_pd_with_rng<G>(
    rng: &mut dyn RngCore,
    gap: &G,
    s_zero: bool,
) -> Result<PdPayoffs, PayoffError>
where
    G: Fn(&mut dyn RngCore) -> f64 + ?Sized,
{
    let s = if s_zero { 0. } else { gap(&mut *rng) };

    for attempt in 1..=MAX_ATTEMPTS {
        let g_p = gap(&mut *rng);
        let g_r = gap(&mut *rng);
        let g_t = gap(&mut *rng);
        if !(g_t < g_p + g_r) {
            continue;
        }
        let p = s + g_p;
        let r = p + g_r;
        let t = r + g_t;
        let pay = PdPayoffs { r, s, t, p };
        // Non-positive draws from a custom gap would break the ordering.
        if pay.is_ordered() && t.is_finite() {
            debug!("payoffs accepted after {attempt} attempts: {pay:?}");
            return Ok(pay);
        }
    }
    Err(PayoffError::InfeasibleParameters {
        attempts: MAX_ATTEMPTS,
    })
}
