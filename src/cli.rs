use std::env;

use serde::Serialize;

use crate::engine::{Group, Hierarchy, Rng};
use crate::parallel::WorkerPool;
use crate::sweep::{
    run_sweep_with_progress, run_trials_parallel, write_sweep_csv, SweepConfig, TrialConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Trials,
    Sweep,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("trials") => Some(Command::Trials),
        Some("sweep") => Some(Command::Sweep),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Simulate) => handle_simulate(args),
        Some(Command::Trials) => handle_trials(args),
        Some(Command::Sweep) => handle_sweep(args),
        None => {
            eprintln!("usage: echelon <simulate|trials|sweep>");
            2
        }
    }
}

/// Entry point used by `src/main.rs`.
pub fn run() -> i32 {
    let args: Vec<String> = env::args().collect();
    run_with_args(&args)
}

#[derive(Debug, Serialize)]
struct TierReport {
    level: usize,
    capacity: usize,
    favored: usize,
    unfavored: usize,
    favored_ratio: f64,
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    bias: f64,
    rounds: usize,
    seed: u64,
    tiers: Vec<TierReport>,
}

fn handle_simulate(args: &[String]) -> i32 {
    let positional = positional_args(args);
    let bias = parse_f64_arg(positional.first().copied(), "bias", 1.2);
    let rounds = parse_usize_arg(positional.get(1).copied(), "rounds", 100);
    let seed = parse_seed_arg(positional.get(2).copied());
    let as_table = args.iter().any(|arg| arg == "--table");

    let defaults = SweepConfig::default();
    let mut rng = Rng::new(seed);
    let mut hierarchy = match Hierarchy::build(&defaults.capacities, bias, &mut rng) {
        Ok(hierarchy) => hierarchy,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return 1;
        }
    };
    for _ in 0..rounds {
        if let Err(err) = hierarchy.run_round(defaults.attrition_probability, &mut rng) {
            eprintln!("round failed: {err}");
            return 1;
        }
    }

    let mut tiers = Vec::with_capacity(hierarchy.levels());
    for tier in hierarchy.tiers() {
        let favored_ratio = match tier.group_ratio(Group::Favored) {
            Ok(ratio) => ratio,
            Err(err) => {
                eprintln!("report failed: {err}");
                return 1;
            }
        };
        tiers.push(TierReport {
            level: tier.level(),
            capacity: tier.capacity(),
            favored: tier.group_count(Group::Favored),
            unfavored: tier.group_count(Group::Unfavored),
            favored_ratio,
        });
    }
    let report = SimulateReport {
        bias,
        rounds,
        seed,
        tiers,
    };

    if as_table {
        println!("level\tcapacity\tfavored\tunfavored\tfavored_ratio");
        for tier in &report.tiers {
            println!(
                "{}\t{}\t{}\t{}\t{:.4}",
                tier.level, tier.capacity, tier.favored, tier.unfavored, tier.favored_ratio
            );
        }
    } else {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize simulation report: {err}");
                return 1;
            }
        }
    }

    0
}

#[derive(Debug, Serialize)]
struct TrialsReport {
    bias: f64,
    trials: usize,
    rounds: usize,
    seed: u64,
    level_ratios: Vec<f64>,
}

fn handle_trials(args: &[String]) -> i32 {
    let positional = positional_args(args);
    let bias = parse_f64_arg(positional.first().copied(), "bias", 1.2);
    let trials = parse_usize_arg(positional.get(1).copied(), "trials", 100);
    let rounds = parse_usize_arg(positional.get(2).copied(), "rounds", 100);
    let seed = parse_seed_arg(positional.get(3).copied());

    let defaults = SweepConfig::default();
    let config = TrialConfig {
        capacities: defaults.capacities,
        bias,
        attrition_probability: defaults.attrition_probability,
        rounds,
    };

    match run_trials_parallel(&config, trials, seed) {
        Ok(averaged) => {
            let report = TrialsReport {
                bias,
                trials,
                rounds,
                seed,
                level_ratios: averaged.level_ratios,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(payload) => {
                    println!("{payload}");
                    0
                }
                Err(err) => {
                    eprintln!("failed to serialize trials report: {err}");
                    1
                }
            }
        }
        Err(err) => {
            eprintln!("trials failed: {err}");
            1
        }
    }
}

fn handle_sweep(args: &[String]) -> i32 {
    let mut config = match flag_value(args, "--config") {
        Some(path) => match SweepConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        },
        None => SweepConfig::default(),
    };
    if let Some(raw) = flag_value(args, "--steps") {
        config.bias_steps = parse_usize_arg(Some(raw), "steps", config.bias_steps);
    }
    if let Some(raw) = flag_value(args, "--trials") {
        config.trials = parse_usize_arg(Some(raw), "trials", config.trials);
    }
    if let Some(raw) = flag_value(args, "--rounds") {
        config.rounds_per_trial = parse_usize_arg(Some(raw), "rounds", config.rounds_per_trial);
    }
    if let Some(raw) = flag_value(args, "--seed") {
        config.seed = parse_u64_arg(Some(raw), "seed", config.seed);
    }
    let out = flag_value(args, "--out")
        .map(String::as_str)
        .unwrap_or("data.csv");
    let pool = match flag_value(args, "--workers") {
        Some(raw) => WorkerPool::with_workers(parse_usize_arg(Some(raw), "workers", 0)),
        None => WorkerPool::from_env(),
    };

    println!(
        "sweep: {} bias points x {} trials x {} rounds, seed {}",
        config.bias_steps, config.trials, config.rounds_per_trial, config.seed
    );
    let rows = pool.install(|| {
        run_sweep_with_progress(&config, |done, total| {
            println!("bias points {done}/{total}");
        })
    });
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => {
            eprintln!("sweep failed: {err}");
            return 1;
        }
    };
    if let Err(err) = write_sweep_csv(out, &rows) {
        eprintln!("{err}");
        return 1;
    }
    println!("wrote {} rows to {out}", rows.len());
    0
}

/// Arguments after the command name that are not `--` flags.
fn positional_args(args: &[String]) -> Vec<&String> {
    args.iter()
        .skip(2)
        .filter(|arg| !arg.starts_with("--"))
        .collect()
}

/// Value following a `--flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
}

fn parse_usize_arg(raw: Option<&String>, name: &str, default: usize) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_f64_arg(raw: Option<&String>, name: &str, default: f64) -> f64 {
    raw.and_then(|value| value.parse::<f64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

/// Explicit seed when given; otherwise OS entropy, so ad-hoc runs
/// differ. Every report echoes the seed actually used.
fn parse_seed_arg(raw: Option<&String>) -> u64 {
    match raw {
        Some(value) => parse_u64_arg(Some(value), "seed", 7),
        None => entropy_seed(),
    }
}

fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::fill(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            eprintln!("entropy unavailable ({err}), falling back to fixed seed");
            7
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(
            parse_command(&args(&["echelon", "simulate"])),
            Some(Command::Simulate)
        );
        assert_eq!(
            parse_command(&args(&["echelon", "trials"])),
            Some(Command::Trials)
        );
        assert_eq!(
            parse_command(&args(&["echelon", "sweep"])),
            Some(Command::Sweep)
        );
        assert_eq!(parse_command(&args(&["echelon", "bogus"])), None);
        assert_eq!(parse_command(&args(&["echelon"])), None);
    }

    #[test]
    fn positional_args_skip_flags() {
        let argv = args(&["echelon", "simulate", "1.3", "--table", "50"]);
        let positional = positional_args(&argv);
        assert_eq!(positional, [&"1.3".to_string(), &"50".to_string()]);
    }

    #[test]
    fn flag_value_returns_following_argument() {
        let argv = args(&["echelon", "sweep", "--out", "run.csv", "--steps", "5"]);
        assert_eq!(flag_value(&argv, "--out"), Some(&"run.csv".to_string()));
        assert_eq!(flag_value(&argv, "--steps"), Some(&"5".to_string()));
        assert_eq!(flag_value(&argv, "--seed"), None);
    }
}
