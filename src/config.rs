//! Ambient configuration: resolver and catalog settings, loaded from a `.env`
//! file and environment variables over struct defaults and validated before
//! use.
//!
//! Mirrors this codebase's established config shape: every field has a
//! documented default, `validate()` checks cross-field invariants, and
//! construction never panics. Environment loading goes through the `config`
//! crate rather than hand-rolled `std::env::var` reads, same as this
//! codebase's server settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_PREFIX: &str = "SVCFP";

/// Settings governing resolver behavior: confidence thresholds and the
/// scoring constants used by [`crate::resolver::RuleResolver`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverSettings {
    /// Minimum confidence a candidate must reach to survive. Default: `0.50`.
    pub min_confidence: f32,
    /// Penalty subtracted per matching soft-exclude pattern. Default: `0.20`.
    pub soft_exclude_penalty: f32,
    /// Bonus added when the observed port is in a rule's bonus-port set. Default: `0.10`.
    pub port_bonus: f32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self { min_confidence: 0.50, soft_exclude_penalty: 0.20, port_bonus: 0.10 }
    }
}

impl ResolverSettings {
    /// Check that every tunable lies in `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("min_confidence", self.min_confidence),
            ("soft_exclude_penalty", self.soft_exclude_penalty),
            ("port_bonus", self.port_bonus),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        Ok(())
    }

    /// Overlay environment variables (`SVCFP__MIN_CONFIDENCE`, etc.) on top of
    /// [`ResolverSettings::default`] via the `config` crate. Unset variables
    /// are left at their default value; a malformed one fails the load.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_overlay(Self::default())
    }
}

/// Settings governing catalog loading: external override paths and the
/// validation harness's worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSettings {
    /// Directory `warm_with_external`/`warm_probe_catalog_with_external` read
    /// from. Default: `"."`.
    pub cache_dir: String,
    /// Bound on validation harness worker threads. Default: `4`.
    pub worker_threads: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { cache_dir: ".".into(), worker_threads: 4 }
    }
}

impl CatalogSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads < 1 {
            return Err(ConfigError::NotPositive {
                field: "worker_threads",
                value: self.worker_threads as i64,
            });
        }
        Ok(())
    }

    /// Overlay environment variables (`SVCFP__CACHE_DIR`, `SVCFP__WORKER_THREADS`)
    /// on top of [`CatalogSettings::default`] via the `config` crate.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_overlay(Self::default())
    }
}

/// Load a `.env` file (if present) and the `SVCFP__`-prefixed environment
/// overlay on top of `defaults`, the way `ServerConfig::load` layers
/// environment variables over struct defaults.
fn load_overlay<T>(defaults: T) -> Result<T, ConfigError>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let _ = dotenvy::dotenv();

    let defaults_source =
        config::Config::try_from(&defaults).map_err(|e| ConfigError::Load(e.to_string()))?;

    config::Config::builder()
        .add_source(defaults_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ConfigError::Load(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ResolverSettings::default().validate().is_ok());
        assert!(CatalogSettings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let settings = ResolverSettings { min_confidence: 1.5, ..Default::default() };
        assert!(matches!(settings.validate(), Err(ConfigError::OutOfUnitRange { .. })));
    }

    #[test]
    fn zero_worker_threads_is_rejected() {
        let settings = CatalogSettings { worker_threads: 0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(ConfigError::NotPositive { .. })));
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        std::env::remove_var("SVCFP__MIN_CONFIDENCE");
        let settings = ResolverSettings::from_env().unwrap();
        assert_eq!(settings.min_confidence, 0.50);
    }

    #[test]
    fn from_env_overlay_applies_a_prefixed_override() {
        std::env::set_var("SVCFP__MIN_CONFIDENCE", "0.75");
        let settings = ResolverSettings::from_env().unwrap();
        assert_eq!(settings.min_confidence, 0.75);
        std::env::remove_var("SVCFP__MIN_CONFIDENCE");
    }
}
