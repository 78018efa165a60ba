//! Run the round driver in a tight loop and optionally append one line to
//! a log file for trend tracking.
//!
//! Usage:
//!   cargo run --release --bin benchmark_rounds
//!   cargo run --release --bin benchmark_rounds -- --log
//!
//! --log  Append one row to round_benchmark_log.csv (date, rounds_per_sec, members, levels).

use std::fs::OpenOptions;
use std::io::Write;
use std::time::Instant;

use echelon::engine::{Hierarchy, Rng};
use echelon::sweep::SweepConfig;

fn main() {
    let log = std::env::args().any(|a| a == "--log");

    let config = SweepConfig::default();
    let members: usize = config.capacities.iter().sum();
    let mut rng = Rng::new(7);
    let mut hierarchy = Hierarchy::build(&config.capacities, 1.2, &mut rng)
        .expect("reference capacities are valid");

    // Run for at least this long or this many rounds
    const MIN_DURATION_MS: u64 = 2000;
    const MIN_ROUNDS: u32 = 500;

    let start = Instant::now();
    let mut rounds: u32 = 0;
    while start.elapsed().as_millis() < MIN_DURATION_MS as u128 || rounds < MIN_ROUNDS {
        hierarchy
            .run_round(config.attrition_probability, &mut rng)
            .expect("reference attrition probability is valid");
        rounds += 1;
    }
    let elapsed_secs = start.elapsed().as_secs_f64();
    let rounds_per_sec = rounds as f64 / elapsed_secs;

    println!(
        "Round benchmark ({} levels, {} members):",
        config.capacities.len(),
        members
    );
    println!("  Rounds:    {}", rounds);
    println!("  Duration:  {:.2} s", elapsed_secs);
    println!("  Rounds/s:  {:.2}", rounds_per_sec);

    if log {
        let date = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!(
            "{},{:.4},{},{}\n",
            date,
            rounds_per_sec,
            members,
            config.capacities.len()
        );
        let path = "round_benchmark_log.csv";
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open round_benchmark_log.csv for append");
        if file.metadata().map(|m| m.len() == 0).unwrap_or(true) {
            let _ = file.write_all(b"date,rounds_per_sec,members,levels\n");
        }
        file.write_all(line.as_bytes())
            .expect("write round_benchmark_log.csv");
        file.flush().expect("flush round_benchmark_log.csv");
        println!("Appended to {}", path);
    }
}
