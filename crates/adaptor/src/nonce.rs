//! Even-y nonce sampling for adaptor pre-signatures.
//!
//! BIP340 requires the public nonce of a completed signature to have an even
//! y-coordinate. For an adaptor signature that nonce is `R + T`, which the
//! signer only controls through `R`, so sampling is retried until both `R`
//! and `R + T` are even.

use tracing::trace;

use crate::{AdaptorError, EngineConfig, Point, Result, Scalar};

/// A sampled nonce whose point and adapted point both have even y.
#[derive(Clone, Copy, Debug)]
pub struct AdaptorNonce {
    /// Secret nonce `r` (already sign-normalized).
    pub secret: Scalar,
    /// `R = r·G`, even y.
    pub point: Point,
    /// `R + T`, even y.
    pub adapted: Point,
    /// Samples drawn before both parities came out even.
    pub attempts: usize,
}

/// Runs `attempt` up to `attempts` times, returning the first `Some`.
///
/// # Errors
///
/// Returns `AdaptorError::NonceExhausted` if every attempt yields `None`.
pub fn try_n_times<T, F>(attempts: usize, mut attempt: F) -> Result<T>
where
    F: FnMut(usize) -> Option<T>,
{
    for i in 0..attempts {
        if let Some(value) = attempt(i) {
            return Ok(value);
        }
    }
    Err(AdaptorError::NonceExhausted { attempts })
}

/// Samples `r` such that `r·G` and `r·G + T` both have even y.
///
/// # Errors
///
/// Returns `AdaptorError::NonceExhausted` if the attempt budget of `config`
/// runs out.
pub fn sample_adaptor_nonce(adaptor_point: &Point, config: &EngineConfig) -> Result<AdaptorNonce> {
    try_n_times(config.max_nonce_attempts, |i| {
        let (secret, point) = Scalar::random().normalize_even().ok()?;
        let adapted = point.add(adaptor_point).ok()?;
        if adapted.has_even_y() {
            trace!(attempts = i + 1, "sampled even-y adaptor nonce");
            Some(AdaptorNonce {
                secret,
                point,
                adapted,
                attempts: i + 1,
            })
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_n_times_returns_first_success() {
        let mut calls = 0;
        let value = try_n_times(10, |i| {
            calls += 1;
            (i == 3).then_some(i)
        })
        .expect("fourth attempt succeeds");
        assert_eq!(value, 3);
        assert_eq!(calls, 4);
    }

    #[test]
    fn try_n_times_reports_exhaustion() {
        let result: Result<()> = try_n_times(5, |_| None);
        assert!(matches!(
            result,
            Err(AdaptorError::NonceExhausted { attempts: 5 })
        ));
    }

    #[test]
    fn sampled_nonce_is_even_and_consistent() {
        let t = Point::mul_base(&Scalar::random()).expect("non-zero");
        let nonce = sample_adaptor_nonce(&t, &EngineConfig::default()).expect("sampling succeeds");

        assert!(nonce.point.has_even_y());
        assert!(nonce.adapted.has_even_y());
        assert_eq!(Point::mul_base(&nonce.secret).expect("non-zero"), nonce.point);
        assert_eq!(nonce.point.add(&t).expect("non-infinity"), nonce.adapted);
    }

    #[test]
    fn even_y_retry_terminates_within_small_bound() {
        let t = Point::mul_base(&Scalar::random()).expect("non-zero");
        let config = EngineConfig::default();
        let mut worst = 0;
        let mut total = 0;
        for _ in 0..10_000 {
            let nonce = sample_adaptor_nonce(&t, &config).expect("sampling succeeds");
            assert!(nonce.adapted.has_even_y());
            worst = worst.max(nonce.attempts);
            total += nonce.attempts;
        }
        // Each attempt succeeds with probability 1/2.
        assert!(worst <= 40, "worst case was {worst} attempts");
        assert!(total < 10_000 * 3, "mean of {} attempts", total / 10_000);
    }

    #[test]
    fn single_attempt_budget_fails_about_half_the_time() {
        let t = Point::mul_base(&Scalar::random()).expect("non-zero");
        let config = EngineConfig {
            max_nonce_attempts: 1,
        };
        let failures = (0..400)
            .filter(|_| {
                matches!(
                    sample_adaptor_nonce(&t, &config),
                    Err(AdaptorError::NonceExhausted { attempts: 1 })
                )
            })
            .count();
        assert!((100..=300).contains(&failures), "{failures} of 400 failed");
    }
}
