//! JobGuard resampling - minority-class oversampling for imbalanced binary data
//!
//! Fraudulent job postings are a small fraction of any scraped corpus. This
//! crate rebalances the training features before a classifier sees them.
//!
//! # Modules
//!
//! - [`synthetic`] - Oversamplers (SMOBD, G-SMOTE and the standard SMOTE family),
//!   the neighbor index they share, and the name-based [`VariantRegistry`]
//! - [`config`] - JSON and environment configuration
//! - [`utils`] - CSV loading and saving
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use jobguard_resample::prelude::*;
//! use ndarray::{Array1, Array2};
//!
//! # fn run(x: Array2<f64>, y: Array1<i64>) -> jobguard_resample::Result<()> {
//! let sampler = VariantRegistry::get_variant("g_smote", 42)?;
//! let result = sampler.fit_resample(&x, &y)?;
//! println!("{} synthetic rows", result.n_synthetic);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;
pub mod synthetic;
pub mod utils;

// Services
pub mod cli;

pub use error::{ResampleError, Result};
pub use synthetic::VariantRegistry;

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ResampleError, Result};

    // Configuration
    pub use crate::config::ResampleConfig;

    // Samplers
    pub use crate::synthetic::{
        Adasyn, BorderlineDensityOversampler, BorderlineSmote, GeometricOversampler,
        ResampleResult, SampleOrigin, Sampler, SelectionStrategy, Smote, SmoteTomek, SvmSmote,
        TomekLinks, Variant, VariantRegistry,
    };

    // Neighbor search
    pub use crate::synthetic::{NearestNeighborIndex, Neighbor};

    // Data
    pub use crate::utils::{DataLoader, DataSaver, LabeledData};
}
