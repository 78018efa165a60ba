//! Single-trial runner and trial repetition with averaging.
//!
//! Each trial owns its random stream and its hierarchy; trials share no
//! state, so repetition distributes across cores cleanly.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{Group, Hierarchy, Rng};
use crate::engine::{validate_attrition, validate_bias, validate_schedule, EngineError};

/// Parameters of one simulated hierarchy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Tier capacities ordered highest tier first, the construction order
    /// of [Hierarchy::build].
    pub capacities: Vec<usize>,
    /// Rating multiplier for the favored group, at least 1.0.
    pub bias: f64,
    /// Per-member removal probability applied every round.
    pub attrition_probability: f64,
    /// Attrition+promotion cycles per trial.
    pub rounds: usize,
}

impl TrialConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        validate_schedule(&self.capacities)?;
        validate_bias(self.bias)?;
        validate_attrition(self.attrition_probability)
    }
}

/// Favored-group share of each tier after the final round, lowest level
/// first.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResult {
    pub level_ratios: Vec<f64>,
}

/// Run one trial: build a fresh hierarchy, run the configured number of
/// rounds, then read the per-tier favored-group ratio.
pub fn run_trial(config: &TrialConfig, seed: u64) -> Result<TrialResult, EngineError> {
    let mut rng = Rng::new(seed);
    let mut hierarchy = Hierarchy::build(&config.capacities, config.bias, &mut rng)?;
    for _ in 0..config.rounds {
        hierarchy.run_round(config.attrition_probability, &mut rng)?;
    }
    let level_ratios = hierarchy
        .tiers()
        .iter()
        .map(|tier| tier.group_ratio(Group::Favored))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TrialResult { level_ratios })
}

/// Mean per-level favored ratio across `trials` independent runs.
pub fn run_trials(
    config: &TrialConfig,
    trials: usize,
    base_seed: u64,
) -> Result<TrialResult, EngineError> {
    run_trials_with_parallelism(config, trials, base_seed, false)
}

/// Like [run_trials] but distributes trials across all CPU cores via
/// Rayon. Per-trial seeds derive from the base seed, so results match the
/// sequential variant exactly.
pub fn run_trials_parallel(
    config: &TrialConfig,
    trials: usize,
    base_seed: u64,
) -> Result<TrialResult, EngineError> {
    run_trials_with_parallelism(config, trials, base_seed, true)
}

fn run_trials_with_parallelism(
    config: &TrialConfig,
    trials: usize,
    base_seed: u64,
    parallel: bool,
) -> Result<TrialResult, EngineError> {
    config.validate()?;
    let run_one = |trial: usize| run_trial(config, trial_seed(base_seed, trial as u64));
    let results: Result<Vec<TrialResult>, EngineError> = if parallel {
        (0..trials).into_par_iter().map(run_one).collect()
    } else {
        (0..trials).map(run_one).collect()
    };
    Ok(TrialResult {
        level_ratios: mean_ratios(&results?, config.capacities.len()),
    })
}

/// Column-wise mean of per-level ratios; zero trials yield zeros.
fn mean_ratios(results: &[TrialResult], levels: usize) -> Vec<f64> {
    if results.is_empty() {
        return vec![0.0; levels];
    }
    let mut sums = vec![0.0; levels];
    for result in results {
        for (sum, ratio) in sums.iter_mut().zip(&result.level_ratios) {
            *sum += ratio;
        }
    }
    let count = results.len() as f64;
    sums.iter().map(|sum| sum / count).collect()
}

/// Derive the seed for one trial from the base seed. The mixing keeps
/// neighboring trials' streams apart, and the mapping is stable so
/// parallel and sequential execution agree.
pub(crate) fn trial_seed(base_seed: u64, trial: u64) -> u64 {
    base_seed
        .wrapping_add(trial.wrapping_mul(0x9e37_79b9_7f4a_7c15))
        .rotate_left(17)
        .wrapping_mul(0xbf58_476d_1ce4_e5b9)
}
