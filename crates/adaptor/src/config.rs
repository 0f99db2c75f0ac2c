//! Engine tuning knobs.

/// Environment variable overriding [`EngineConfig::max_nonce_attempts`].
pub const MAX_NONCE_ATTEMPTS_ENV: &str = "SIGSWAP_MAX_NONCE_ATTEMPTS";

/// Configuration of the adaptor engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on even-y nonce sampling attempts per adaptor.
    ///
    /// Each attempt succeeds with probability 1/2, so the default leaves a
    /// failure probability of 2^-256.
    pub max_nonce_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_nonce_attempts: 256,
        }
    }
}

impl EngineConfig {
    /// Reads overrides from the environment, falling back to defaults on
    /// absent or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        let max_nonce_attempts = std::env::var(MAX_NONCE_ATTEMPTS_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .filter(|attempts: &usize| *attempts > 0)
            .unwrap_or(default.max_nonce_attempts);
        Self { max_nonce_attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_generous() {
        assert_eq!(EngineConfig::default().max_nonce_attempts, 256);
    }

    #[test]
    fn from_env_without_override_uses_default() {
        if std::env::var(MAX_NONCE_ATTEMPTS_ENV).is_err() {
            assert_eq!(EngineConfig::from_env(), EngineConfig::default());
        }
    }
}
