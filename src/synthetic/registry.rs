//! Name-based sampler lookup

use crate::config::ResampleConfig;
use crate::error::{ResampleError, Result};
use crate::synthetic::{
    Adasyn, BorderlineDensityOversampler, BorderlineSmote, GeometricOversampler, Sampler, Smote,
    SmoteTomek, SvmSmote,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Oversampling algorithms reachable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Smote,
    BorderlineSmote,
    SvmSmote,
    Adasyn,
    SmoteTomek,
    SmobdSmote,
    GSmote,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Smote,
        Variant::BorderlineSmote,
        Variant::SvmSmote,
        Variant::Adasyn,
        Variant::SmoteTomek,
        Variant::SmobdSmote,
        Variant::GSmote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Smote => "smote",
            Variant::BorderlineSmote => "borderline_smote",
            Variant::SvmSmote => "svm_smote",
            Variant::Adasyn => "adasyn",
            Variant::SmoteTomek => "smote_tomek",
            Variant::SmobdSmote => "smobd_smote",
            Variant::GSmote => "g_smote",
        }
    }

    /// All recognized names, in registry order
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Variant::as_str).collect()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ResampleError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| ResampleError::UnknownVariant {
                name: s.to_string(),
                available: Self::names(),
            })
    }
}

/// Builds configured samplers from variant names
pub struct VariantRegistry;

impl VariantRegistry {
    /// Sampler for `name` with default parameters, seeded with `random_state`
    pub fn get_variant(name: &str, random_state: u64) -> Result<Box<dyn Sampler>> {
        let variant: Variant = name.parse()?;
        Ok(Self::build(variant, &ResampleConfig {
            variant,
            random_state,
            ..ResampleConfig::default()
        }))
    }

    /// Sampler described by a full configuration
    pub fn from_config(config: &ResampleConfig) -> Result<Box<dyn Sampler>> {
        config.validate()?;
        Ok(Self::build(config.variant, config))
    }

    pub fn names() -> Vec<&'static str> {
        Variant::names()
    }

    fn build(variant: Variant, config: &ResampleConfig) -> Box<dyn Sampler> {
        let k = config.k_neighbors;
        let seed = config.random_state;
        match variant {
            Variant::Smote => Box::new(Smote::new().with_k_neighbors(k).with_seed(seed)),
            Variant::BorderlineSmote => Box::new(
                BorderlineSmote::new()
                    .with_k_neighbors(k)
                    .with_m_neighbors(config.m_neighbors)
                    .with_seed(seed),
            ),
            Variant::SvmSmote => Box::new(
                SvmSmote::new()
                    .with_k_neighbors(k)
                    .with_m_neighbors(config.m_neighbors)
                    .with_seed(seed),
            ),
            Variant::Adasyn => Box::new(Adasyn::new().with_k_neighbors(k).with_seed(seed)),
            Variant::SmoteTomek => Box::new(SmoteTomek::new().with_k_neighbors(k).with_seed(seed)),
            Variant::SmobdSmote => Box::new(
                BorderlineDensityOversampler::new()
                    .with_k_neighbors(k)
                    .with_seed(seed),
            ),
            Variant::GSmote => Box::new(
                GeometricOversampler::new()
                    .with_k_neighbors(k)
                    .with_selection_strategy(config.selection_strategy)
                    .with_truncation_factor(config.truncation_factor)
                    .with_seed(seed),
            ),
        }
    }
}
