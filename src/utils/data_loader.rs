//! Data loading utilities

use crate::error::{ResampleError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Feature matrix and binary labels read from a table
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub x: Array2<f64>,
    pub y: Array1<i64>,
    pub feature_names: Vec<String>,
    pub target: String,
}

/// Data loader for CSV files
pub struct DataLoader {
    /// Rows used for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self { infer_schema_length: 100 }
    }

    /// Set the number of rows used to infer column types
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file);

        reader.finish().map_err(|e| ResampleError::DataError(e.to_string()))
    }

    /// Load a CSV file and split it into numeric features and the target column
    pub fn load_labeled(&self, path: impl AsRef<Path>, target: &str) -> Result<LabeledData> {
        let df = self.load_csv(path)?;
        split_features_target(&df, target)
    }
}

/// Every column except `target` becomes a feature; all must be numeric
/// and free of nulls.
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<LabeledData> {
    let target_col = df
        .column(target)
        .map_err(|_| ResampleError::DataError(format!("Target column '{}' not found", target)))?;

    let labels = target_col.as_materialized_series().cast(&DataType::Int64)?;
    let y: Array1<i64> = labels
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| ResampleError::DataError(format!("Missing target value in row {}", row)))
        })
        .collect::<Result<Vec<i64>>>()?
        .into();

    let mut feature_names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for col in df.get_columns() {
        let name = col.name().to_string();
        if name == target {
            continue;
        }
        let values = col.as_materialized_series().cast(&DataType::Float64).map_err(|e| {
            ResampleError::DataError(format!("Feature column '{}' is not numeric: {}", name, e))
        })?;
        let values = values
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    ResampleError::DataError(format!("Missing value in column '{}', row {}", name, row))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        feature_names.push(name);
        columns.push(values);
    }

    if columns.is_empty() {
        return Err(ResampleError::DataError("No feature columns besides the target".to_string()));
    }

    let x = Array2::from_shape_fn((df.height(), columns.len()), |(i, j)| columns[j][i]);
    Ok(LabeledData {
        x,
        y,
        feature_names,
        target: target.to_string(),
    })
}

/// Data saver
pub struct DataSaver;

impl DataSaver {
    /// Write features and labels as CSV with a header row
    pub fn save_csv(data: &LabeledData, path: impl AsRef<Path>) -> Result<()> {
        if data.feature_names.len() != data.x.ncols() || data.x.nrows() != data.y.len() {
            return Err(ResampleError::ShapeError {
                expected: format!("{} columns and {} labels", data.feature_names.len(), data.x.nrows()),
                actual: format!("{} columns and {} labels", data.x.ncols(), data.y.len()),
            });
        }

        let mut columns: Vec<Column> = data
            .feature_names
            .iter()
            .zip(data.x.columns())
            .map(|(name, values)| Column::new(name.as_str().into(), values.to_vec()))
            .collect();
        columns.push(Column::new(data.target.as_str().into(), data.y.to_vec()));

        let mut df = DataFrame::new(columns)?;
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| ResampleError::DataError(e.to_string()))
    }
}
