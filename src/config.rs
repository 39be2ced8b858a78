//! Resampling configuration

use crate::error::{ResampleError, Result};
use crate::synthetic::{Sampler, SelectionStrategy, Variant, VariantRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one resampling run.
///
/// Loaded from JSON (missing fields take their defaults) and optionally
/// overridden by `RESAMPLE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Oversampling algorithm
    pub variant: Variant,

    /// Number of nearest neighbors
    pub k_neighbors: usize,

    /// Seed for every random draw of a call
    pub random_state: u64,

    /// G-SMOTE partner filter
    pub selection_strategy: SelectionStrategy,

    /// G-SMOTE bound on |alpha|
    pub truncation_factor: f64,

    /// Neighbors used for danger detection (Borderline-SMOTE, SVM-SMOTE)
    pub m_neighbors: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            variant: Variant::SmobdSmote,
            k_neighbors: 5,
            random_state: 42,
            selection_strategy: SelectionStrategy::Combined,
            truncation_factor: 1.0,
            m_neighbors: 10,
        }
    }
}

impl ResampleConfig {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_selection_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.selection_strategy = strategy;
        self
    }

    pub fn with_truncation_factor(mut self, factor: f64) -> Self {
        self.truncation_factor = factor;
        self
    }

    /// Read a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the environment
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `RESAMPLE_VARIANT`, `RESAMPLE_K_NEIGHBORS`, `RESAMPLE_RANDOM_STATE`,
    /// `RESAMPLE_SELECTION_STRATEGY` and `RESAMPLE_TRUNCATION_FACTOR` when set
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = std::env::var("RESAMPLE_VARIANT") {
            self.variant = v.parse()?;
        }
        if let Ok(v) = std::env::var("RESAMPLE_K_NEIGHBORS") {
            self.k_neighbors = parse_env("RESAMPLE_K_NEIGHBORS", &v)?;
        }
        if let Ok(v) = std::env::var("RESAMPLE_RANDOM_STATE") {
            self.random_state = parse_env("RESAMPLE_RANDOM_STATE", &v)?;
        }
        if let Ok(v) = std::env::var("RESAMPLE_SELECTION_STRATEGY") {
            self.selection_strategy = v.parse()?;
        }
        if let Ok(v) = std::env::var("RESAMPLE_TRUNCATION_FACTOR") {
            self.truncation_factor = parse_env("RESAMPLE_TRUNCATION_FACTOR", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k_neighbors == 0 {
            return Err(invalid("k_neighbors", &self.k_neighbors, "must be at least 1"));
        }
        if self.m_neighbors == 0 {
            return Err(invalid("m_neighbors", &self.m_neighbors, "must be at least 1"));
        }
        if !(self.truncation_factor > 0.0 && self.truncation_factor.is_finite()) {
            return Err(invalid(
                "truncation_factor",
                &self.truncation_factor,
                "must be a positive finite number",
            ));
        }
        Ok(())
    }

    /// Sampler described by this config
    pub fn build(&self) -> Result<Box<dyn Sampler>> {
        VariantRegistry::from_config(self)
    }
}

fn invalid(name: &str, value: &dyn std::fmt::Display, reason: &str) -> ResampleError {
    ResampleError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ResampleError::ConfigError(format!("{} has invalid value {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ResampleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.variant, Variant::SmobdSmote);
        assert_eq!(config.k_neighbors, 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ResampleConfig =
            serde_json::from_str(r#"{"variant": "g_smote", "truncation_factor": 0.5}"#).unwrap();
        assert_eq!(config.variant, Variant::GSmote);
        assert_eq!(config.truncation_factor, 0.5);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.selection_strategy, SelectionStrategy::Combined);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"variant": "adasyn", "k_neighbors": 3, "random_state": 7}}"#).unwrap();

        let config = ResampleConfig::from_file(file.path()).unwrap();
        assert_eq!(config.variant, Variant::Adasyn);
        assert_eq!(config.k_neighbors, 3);
        assert_eq!(config.build().unwrap().name(), "adasyn");
    }

    #[test]
    fn test_from_file_rejects_unknown_variant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"variant": "foo_smote"}}"#).unwrap();
        assert!(matches!(
            ResampleConfig::from_file(file.path()),
            Err(ResampleError::SerializationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_k() {
        let config = ResampleConfig::default().with_k_neighbors(0);
        assert!(config.validate().is_err());
    }
}
