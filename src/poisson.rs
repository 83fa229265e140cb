use rand::Rng;
use rand_distr::StandardNormal;

/// Switchover point between Knuth's multiplicative sampler and the normal
/// approximation.
const NORMAL_APPROX_LAMBDA: f64 = 12.0;

/// Poisson probability mass P(X = k) for X ~ Poisson(lambda), computed in log
/// space for stability.
pub fn poisson_pmf(lambda: f64, k: i64) -> f64 {
    if k < 0 {
        return 0.0;
    }
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    let log_prob = k as f64 * lambda.ln() - lambda - log_factorial(k);
    log_prob.exp()
}

/// log(n!) by direct summation; callers only ever pass small goal counts.
pub fn log_factorial(n: i64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    (2..=n).map(|i| (i as f64).ln()).sum()
}

/// Draws one Poisson variate. Knuth's multiplicative method below the
/// switchover, rounded normal approximation above it. Non-positive lambda
/// yields 0.
pub fn poisson_sample<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u32 {
    if lambda <= 0.0 {
        return 0;
    }

    if lambda < NORMAL_APPROX_LAMBDA {
        let limit = (-lambda).exp();
        let mut k = 0u32;
        let mut product = 1.0f64;
        loop {
            k += 1;
            product *= rng.gen_range(0.0..1.0f64);
            if product <= limit {
                return k - 1;
            }
        }
    }

    let z: f64 = rng.sample(StandardNormal);
    (z * lambda.sqrt() + lambda + 0.5).max(0.0) as u32
}
