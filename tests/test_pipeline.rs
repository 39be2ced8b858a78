//! End-to-end tests: CSV in, resampled CSV out

use jobguard_resample::cli::{cmd_resample, resolve_config};
use jobguard_resample::prelude::*;
use jobguard_resample::synthetic::class_counts;
use std::io::Write;

fn write_jobs_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "salary_missing,desc_len,has_logo,fraudulent").unwrap();
    for i in 0..12 {
        writeln!(file, "0,{},1,0", 100 + i * 7).unwrap();
    }
    for i in 0..4 {
        writeln!(file, "1,{},0,1", 20 + i * 3).unwrap();
    }
    file
}

#[test]
fn test_resample_command_writes_balanced_csv() {
    let input = write_jobs_csv();
    let output = tempfile::NamedTempFile::new().unwrap();

    let config = ResampleConfig::new(Variant::GSmote).with_k_neighbors(3);
    cmd_resample(input.path(), "fraudulent", &config, Some(output.path())).unwrap();

    let data = DataLoader::new().load_labeled(output.path(), "fraudulent").unwrap();
    assert_eq!(data.feature_names, vec!["salary_missing", "desc_len", "has_logo"]);
    let counts = class_counts(&data.y);
    assert_eq!(counts[&0], 12);
    assert_eq!(counts[&1], 12);
}

#[test]
fn test_config_file_drives_sampler() {
    let mut cfg = tempfile::NamedTempFile::new().unwrap();
    write!(
        cfg,
        r#"{{"variant": "g_smote", "k_neighbors": 2, "selection_strategy": "minority", "truncation_factor": 0.25}}"#
    )
    .unwrap();

    let config = resolve_config(Some(cfg.path()), None, Some(5), None).unwrap();
    assert_eq!(config.selection_strategy, SelectionStrategy::Minority);

    let data = DataLoader::new().load_labeled(write_jobs_csv().path(), "fraudulent").unwrap();
    let result = config.build().unwrap().fit_resample(&data.x, &data.y).unwrap();
    for origin in &result.origins {
        assert!(origin.alpha.abs() <= 0.25);
        assert_eq!(data.y[origin.neighbor], 1);
    }
}

#[test]
fn test_missing_target_column_fails() {
    let input = write_jobs_csv();
    let config = ResampleConfig::default();
    assert!(cmd_resample(input.path(), "label", &config, None).is_err());
}
