//! Utility functions and types

pub mod data_loader;

pub use data_loader::{split_features_target, DataLoader, DataSaver, LabeledData};
