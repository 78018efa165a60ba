use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use echelon::sweep::{
    run_sweep, run_sweep_with_progress, run_trial, run_trials, run_trials_parallel,
    write_sweep_csv, SweepConfig, SweepError, TrialConfig,
};

fn unique_temp_path(name: &str, extension: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("echelon-{name}-{stamp}.{extension}"))
}

fn small_config(bias: f64) -> TrialConfig {
    TrialConfig {
        capacities: vec![2, 4, 8, 16],
        bias,
        attrition_probability: 0.2,
        rounds: 30,
    }
}

#[test]
fn trial_reports_one_ratio_per_level() {
    let result = run_trial(&small_config(1.2), 7).unwrap();
    assert_eq!(result.level_ratios.len(), 4);
    for ratio in &result.level_ratios {
        assert!((0.0..=1.0).contains(ratio), "ratio out of range: {ratio}");
    }
}

#[test]
fn sequential_and_parallel_trials_agree() {
    let config = small_config(1.3);
    let sequential = run_trials(&config, 16, 11).unwrap();
    let parallel = run_trials_parallel(&config, 16, 11).unwrap();
    assert_eq!(sequential.level_ratios, parallel.level_ratios);
}

#[test]
fn trials_reject_invalid_configuration() {
    let mut config = small_config(0.5);
    assert!(run_trials(&config, 4, 1).is_err());
    config.bias = 1.2;
    config.attrition_probability = 1.5;
    assert!(run_trials(&config, 4, 1).is_err());
}

#[test]
fn stronger_bias_raises_the_top_tier_share() {
    let trials = 40;
    let seed = 1234;
    let low = run_trials(&small_config(1.0), trials, seed).unwrap();
    let high = run_trials(&small_config(1.5), trials, seed).unwrap();
    let low_top = *low.level_ratios.last().unwrap();
    let high_top = *high.level_ratios.last().unwrap();
    assert!(
        high_top > low_top + 0.1,
        "expected a clear separation, got {low_top} vs {high_top}"
    );
}

fn tiny_sweep() -> SweepConfig {
    SweepConfig {
        bias_start: 1.0,
        bias_step: 0.25,
        bias_steps: 3,
        trials: 3,
        rounds_per_trial: 10,
        capacities: vec![2, 4, 8],
        attrition_probability: 0.2,
        seed: 5,
    }
}

#[test]
fn sweep_covers_the_bias_grid() {
    let rows = run_sweep(&tiny_sweep()).unwrap();
    assert_eq!(rows.len(), 3);
    let biases: Vec<f64> = rows.iter().map(|row| row.bias).collect();
    assert!((biases[0] - 1.0).abs() < 1e-12);
    assert!((biases[1] - 1.25).abs() < 1e-12);
    assert!((biases[2] - 1.5).abs() < 1e-12);
    for row in &rows {
        assert_eq!(row.level_ratios.len(), 3);
        for ratio in &row.level_ratios {
            assert!((0.0..=1.0).contains(ratio));
        }
    }
}

#[test]
fn sweep_is_deterministic_for_a_fixed_seed() {
    let config = tiny_sweep();
    let first = run_sweep(&config).unwrap();
    let second = run_sweep(&config).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.level_ratios, b.level_ratios);
    }
}

#[test]
fn sweep_progress_is_monotonic_and_complete() {
    let mut reports: Vec<(usize, usize)> = Vec::new();
    run_sweep_with_progress(&tiny_sweep(), |done, total| reports.push((done, total))).unwrap();
    assert_eq!(reports.first(), Some(&(0, 3)));
    assert_eq!(reports.last(), Some(&(3, 3)));
    for pair in reports.windows(2) {
        assert!(pair[0].0 <= pair[1].0);
        assert_eq!(pair[0].1, pair[1].1);
    }
}

#[test]
fn sweep_rejects_invalid_configuration() {
    let mut config = tiny_sweep();
    config.capacities.clear();
    assert!(matches!(
        run_sweep(&config),
        Err(SweepError::Engine(_))
    ));
}

#[test]
fn sweep_csv_has_header_and_one_row_per_bias() {
    let rows = run_sweep(&tiny_sweep()).unwrap();
    let path = unique_temp_path("sweep", "csv");
    write_sweep_csv(&path, &rows).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "bias,level0,level1,level2");
    assert!(lines[1].starts_with("1.000000,"));
    assert!(lines[3].starts_with("1.500000,"));

    let _ = fs::remove_file(&path);
}

#[test]
fn config_loads_partial_json_with_defaults() {
    let path = unique_temp_path("config", "json");
    fs::write(&path, r#"{"bias_steps": 2, "trials": 1, "seed": 42}"#).unwrap();

    let config = SweepConfig::load(&path).unwrap();
    assert_eq!(config.bias_steps, 2);
    assert_eq!(config.trials, 1);
    assert_eq!(config.seed, 42);
    // Unspecified fields keep the reference defaults.
    assert_eq!(config.rounds_per_trial, 100);
    assert_eq!(config.capacities.len(), 9);

    let _ = fs::remove_file(&path);
}

#[test]
fn config_load_reports_missing_file() {
    let path = unique_temp_path("absent", "json");
    assert!(matches!(
        SweepConfig::load(&path),
        Err(SweepError::ConfigRead { .. })
    ));
}

#[test]
fn config_load_reports_malformed_json() {
    let path = unique_temp_path("malformed", "json");
    fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        SweepConfig::load(&path),
        Err(SweepError::ConfigParse { .. })
    ));
    let _ = fs::remove_file(&path);
}
