// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Random-distribution policy for honest traffic generation, kept behind
//! narrow traits so the core simulator never reads a distribution
//! directly — only [`crate::sim::schedule::Schedule`] building does.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp, LogNormal};

use crate::params::{AMOUNT_MU, AMOUNT_SIGMA, EXPECTED_EXTRA_DELAY, MIN_DELAY};

/// Draws a single honest payment amount.
pub trait AmountSampler {
	fn sample(&self, rng: &mut StdRng) -> f64;
}

/// Draws a single per-hop processing delay.
pub trait DelaySampler {
	fn sample(&self, rng: &mut StdRng) -> f64;
}

/// Draws the interval until the next honest payment event.
pub trait InterArrivalSampler {
	fn sample(&self, rng: &mut StdRng) -> f64;
}

/// `lognormal(mu=ln(50_000), sigma=0.7)`, per §6.2.
pub struct LogNormalAmountSampler {
	dist: LogNormal<f64>,
}

impl LogNormalAmountSampler {
	pub fn new(mu: f64, sigma: f64) -> Self {
		LogNormalAmountSampler { dist: LogNormal::new(mu, sigma).expect("invalid lognormal parameters") }
	}
}

impl Default for LogNormalAmountSampler {
	fn default() -> Self {
		LogNormalAmountSampler::new(AMOUNT_MU, AMOUNT_SIGMA)
	}
}

impl AmountSampler for LogNormalAmountSampler {
	fn sample(&self, rng: &mut StdRng) -> f64 {
		self.dist.sample(rng)
	}
}

/// `MIN_DELAY + Exponential(EXPECTED_EXTRA_DELAY)`, per §6.2.
pub struct ExponentialDelaySampler {
	min_delay: f64,
	dist: Exp<f64>,
}

impl ExponentialDelaySampler {
	pub fn new(min_delay: f64, expected_extra_delay: f64) -> Self {
		ExponentialDelaySampler { min_delay, dist: Exp::new(1.0 / expected_extra_delay).expect("invalid exponential rate") }
	}
}

impl Default for ExponentialDelaySampler {
	fn default() -> Self {
		ExponentialDelaySampler::new(MIN_DELAY, EXPECTED_EXTRA_DELAY)
	}
}

impl DelaySampler for ExponentialDelaySampler {
	fn sample(&self, rng: &mut StdRng) -> f64 {
		self.min_delay + self.dist.sample(rng)
	}
}

/// `Exponential(1 / honest_payments_per_second)`, per §6.2.
pub struct ExponentialInterArrivalSampler {
	dist: Exp<f64>,
}

impl ExponentialInterArrivalSampler {
	pub fn new(honest_payments_per_second: f64) -> Self {
		ExponentialInterArrivalSampler { dist: Exp::new(honest_payments_per_second).expect("invalid exponential rate") }
	}
}

impl InterArrivalSampler for ExponentialInterArrivalSampler {
	fn sample(&self, rng: &mut StdRng) -> f64 {
		self.dist.sample(rng)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;

	#[test]
	fn amount_sampler_draws_positive_values() {
		let sampler = LogNormalAmountSampler::default();
		let mut rng = StdRng::seed_from_u64(1);
		for _ in 0..20 {
			assert!(sampler.sample(&mut rng) > 0.0);
		}
	}

	#[test]
	fn delay_sampler_never_below_min_delay() {
		let sampler = ExponentialDelaySampler::default();
		let mut rng = StdRng::seed_from_u64(2);
		for _ in 0..20 {
			assert!(sampler.sample(&mut rng) >= MIN_DELAY);
		}
	}
}
