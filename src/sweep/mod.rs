//! Bias sweep orchestration: repeat trials over a grid of bias values and
//! average the favored-group share per level.
//!
//! The engine stays strictly sequential inside one run; the sweep
//! parallelizes across bias points, which share nothing.

pub mod export_csv;
pub mod trial;

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use export_csv::{sweep_header, write_sweep_csv};
pub use trial::{run_trial, run_trials, run_trials_parallel, TrialConfig, TrialResult};

use crate::engine::EngineError;

/// Progress-batch count for sweeps with progress reporting.
const SWEEP_PROGRESS_BATCH_COUNT: usize = 40;

/// Sweep parameters. The defaults mirror the reference study: bias
/// 1.0..1.5 in 501 steps, 100 trials of 100 rounds each, nine tiers
/// doubling from 4 at the top to 1024 at the bottom, attrition 0.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub bias_start: f64,
    pub bias_step: f64,
    pub bias_steps: usize,
    pub trials: usize,
    pub rounds_per_trial: usize,
    /// Highest tier first, like [crate::engine::Hierarchy::build].
    pub capacities: Vec<usize>,
    pub attrition_probability: f64,
    /// Base seed; per-bias and per-trial seeds derive from it.
    pub seed: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            bias_start: 1.0,
            bias_step: 0.001,
            bias_steps: 501,
            trials: 100,
            rounds_per_trial: 100,
            capacities: (0..9).map(|tier| 4usize << tier).collect(),
            attrition_probability: 0.2,
            seed: 7,
        }
    }
}

impl SweepConfig {
    /// Load a sweep configuration from a JSON file. Missing fields fall
    /// back to the reference defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SweepError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The bias grid, lowest value first.
    pub fn bias_values(&self) -> Vec<f64> {
        (0..self.bias_steps)
            .map(|step| self.bias_start + step as f64 * self.bias_step)
            .collect()
    }

    /// Fail fast on any parameter the engine would reject, checking both
    /// ends of the bias grid.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.trial_config(self.bias_start).validate()?;
        if let Some(&last) = self.bias_values().last() {
            crate::engine::validate_bias(last)?;
        }
        Ok(())
    }

    fn trial_config(&self, bias: f64) -> TrialConfig {
        TrialConfig {
            capacities: self.capacities.clone(),
            bias,
            attrition_probability: self.attrition_probability,
            rounds: self.rounds_per_trial,
        }
    }
}

/// Averaged favored-group share per level for one bias value.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRow {
    pub bias: f64,
    /// `level_ratios[k]` is engine level k; level 0 is the lowest tier.
    pub level_ratios: Vec<f64>,
}

/// Errors from the orchestration layer. Engine configuration errors pass
/// through unchanged; file and serialization failures carry their path.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to read sweep config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse sweep config {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("sweep row for bias {bias} has {got} levels, expected {expected}")]
    InconsistentRow {
        bias: f64,
        expected: usize,
        got: usize,
    },

    #[error("failed to write sweep csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write sweep csv: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the full sweep without progress reporting.
pub fn run_sweep(config: &SweepConfig) -> Result<Vec<SweepRow>, SweepError> {
    run_sweep_with_progress(config, |_, _| {})
}

/// Run the full sweep, invoking `on_progress(done, total)` in bias points
/// between progress batches. Bias points within a batch run in parallel;
/// each point runs its trials sequentially on its worker.
pub fn run_sweep_with_progress<F>(
    config: &SweepConfig,
    mut on_progress: F,
) -> Result<Vec<SweepRow>, SweepError>
where
    F: FnMut(usize, usize),
{
    config.validate()?;
    let bias_values = config.bias_values();
    let total = bias_values.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    // Report the total immediately so callers can show "0 / total" while
    // the first batch runs.
    on_progress(0, total);

    let batch_size = total.div_ceil(SWEEP_PROGRESS_BATCH_COUNT.min(total));
    let mut rows = Vec::with_capacity(total);
    for batch in bias_values.chunks(batch_size) {
        let offset = rows.len();
        let batch_rows: Result<Vec<SweepRow>, SweepError> = batch
            .par_iter()
            .enumerate()
            .map(|(index, &bias)| {
                let averaged = trial::run_trials(
                    &config.trial_config(bias),
                    config.trials,
                    bias_seed(config.seed, (offset + index) as u64),
                )?;
                Ok(SweepRow {
                    bias,
                    level_ratios: averaged.level_ratios,
                })
            })
            .collect();
        rows.extend(batch_rows?);
        on_progress(rows.len(), total);
    }
    Ok(rows)
}

/// Seed for one bias point's block of trials, derived from the sweep
/// seed. Stable in the bias index, not in batch layout.
fn bias_seed(base_seed: u64, step: u64) -> u64 {
    trial::trial_seed(base_seed ^ 0x94d0_49bb_1331_11eb, step)
}
