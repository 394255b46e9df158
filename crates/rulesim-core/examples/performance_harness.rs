//! Performance harness for rulesim-core benchmarking.
//!
//! Measures cycle and rule throughput for each commit strategy.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p rulesim-core --release --example performance_harness
//! ```
//!
//! ## Metrics
//!
//! - Cycles per second
//! - Rule firings per second
//! - Abort ratio
//!
//! The benchmark runs one independent simulation per thread.

#![allow(clippy::pedantic)]

use num_bigint as _;
use proptest as _;
use rstest as _;
use rulesim_core::{register_file, Bits, Footprint, Rule, Simulation};
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;
use tracing as _;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const NUM_THREADS: usize = 4;
const CYCLES_PER_BATCH: u64 = 1_000;

register_file! {
    mod pipeline {
        plain pc: Bits<32> = Bits::new(0),
        wire fetched: Bits<32> = Bits::zero(),
        ehr r0: Bits<64> = Bits::new(1),
        ehr r1: Bits<64> = Bits::new(1),
        plain regs: [Bits<16>; 8] = [Bits::zero(); 8],
    }
}

use pipeline::{reg, Design, Field};

const ALL_FIELDS: &[Field] = &[Field::pc, Field::fetched, Field::r0, Field::r1, Field::regs];

fn rules(footprint: Footprint<Field>) -> Vec<Rule<Design>> {
    vec![
        Rule::<Design>::new("fetch", |tx| {
            let pc = tx.read0(reg::pc)?;
            tx.write0(reg::fetched, pc ^ Bits::new(0x9E37_79B9))?;
            tx.write0(reg::pc, pc + Bits::new(4))
        })
        .with_footprint(footprint),
        Rule::<Design>::new("fib", |tx| {
            let a = tx.read0(reg::r0)?;
            let b = tx.read0(reg::r1)?;
            tx.write0(reg::r0, b)?;
            tx.write0(reg::r1, a + b)
        })
        .with_footprint(footprint),
        Rule::<Design>::new("retire", |tx| {
            let word = tx.read1(reg::fetched)?;
            let sum = tx.read1(reg::r1)?;
            let mut regs = tx.read0(reg::regs)?;
            let slot = (word.to_u64() % 8) as usize;
            regs[slot] = sum.truncate::<16>() ^ word.truncate();
            tx.write0(reg::regs, regs)
        })
        .with_footprint(footprint),
        Rule::<Design>::new("stall", |tx| tx.write0(reg::pc, Bits::zero())).with_footprint(footprint),
    ]
}

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    cycles_per_second: f64,
    firings_per_second: f64,
    abort_ratio: f64,
}

fn benchmark(name: &'static str, footprint: Footprint<Field>, duration: Duration) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut sim = Simulation::new(rules(footprint));
                let start = Instant::now();
                while start.elapsed() < duration {
                    for _ in 0..CYCLES_PER_BATCH {
                        sim.step();
                    }
                }
                let (commits, aborts) = sim
                    .stats()
                    .fold((0u64, 0u64), |(c, a), (_, stats)| (c + stats.commits, a + stats.aborts));
                tx.send((sim.cycle(), commits, aborts)).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }

    drop(tx);

    let mut total_cycles = 0u64;
    let mut total_commits = 0u64;
    let mut total_aborts = 0u64;
    for (cycles, commits, aborts) in rx {
        total_cycles += cycles;
        total_commits += commits;
        total_aborts += aborts;
    }

    let elapsed_secs = duration.as_secs_f64();
    let firings = total_commits + total_aborts;
    BenchmarkResult {
        name,
        cycles_per_second: total_cycles as f64 / elapsed_secs,
        firings_per_second: firings as f64 / elapsed_secs,
        abort_ratio: if firings == 0 { 0.0 } else { total_aborts as f64 / firings as f64 },
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!("\n╔═══════════════════════════════════════════════════════════╗");
    println!("║               RULESIM-CORE PERFORMANCE HARNESS            ║");
    println!("╠═══════════════════════════════════════════════════════════╣");
    println!("║   Threads: {:>5}                                          ║", NUM_THREADS);
    println!("╠═══════════════════════════════════════════════════════════╣");
    println!("║ {:12} │ {:>14} │ {:>14} │ {:>9} ║", "Footprint", "Cycles/sec", "Firings/sec", "Aborts");
    println!("╟──────────────┼────────────────┼────────────────┼───────────╢");

    for result in results {
        println!(
            "║ {:12} │ {:>14} │ {:>14} │ {:>8.1}% ║",
            result.name,
            format_number(result.cycles_per_second),
            format_number(result.firings_per_second),
            result.abort_ratio * 100.0
        );
    }

    println!("╚═══════════════════════════════════════════════════════════╝");
}

fn main() {
    let warmup = Duration::from_millis(500);
    let benchmark_duration = Duration::from_secs(3);

    println!("Running warmup for {:?}...", warmup);
    let _ = benchmark("warmup", Footprint::Whole, warmup);

    println!("Running benchmarks for {:?} each...\n", benchmark_duration);

    let whole = benchmark("whole", Footprint::Whole, benchmark_duration);
    let declared = benchmark("declared", Footprint::Static(ALL_FIELDS), benchmark_duration);
    let journaled = benchmark("journaled", Footprint::Dynamic, benchmark_duration);

    print_results(&[whole, declared, journaled]);
}
