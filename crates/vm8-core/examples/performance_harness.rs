//! Performance harness for vm8-core stepping throughput.
//!
//! Runs three workloads to completion many times, in both program encodings,
//! and reports instructions per second.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --release -p vm8-core --example performance_harness
//! ```
//!
//! ## Workloads
//!
//! - `countdown`: decrement a memory counter until zero
//! - `fibonacci`: ten Fibonacci steps through memory temporaries
//! - `arithmetic`: add/rotate/xor/store plus a push-pop pair per iteration

#![allow(clippy::pedantic)]

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::time::{Duration, Instant};

use vm8_core::{run, CpuState, Encoding, HaltCause};

#[path = "../tests/common/mod.rs"]
mod common;

use common::{workloads, Workload};

const ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    encoding: Encoding,
    instructions: u64,
    elapsed: Duration,
}

impl BenchmarkResult {
    fn instructions_per_second(&self) -> f64 {
        self.instructions as f64 / self.elapsed.as_secs_f64()
    }
}

fn benchmark(workload: &Workload, encoding: Encoding) -> BenchmarkResult {
    let image = workload.image(encoding).unwrap_or_default();
    let step_fn = encoding.step_fn();
    let mut state = CpuState::default();
    let mut instructions = 0u64;

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        state.reset();
        if state.load_program(&image).is_err() {
            break;
        }
        for &(addr, value) in &workload.data {
            state.write(addr, value);
        }
        let outcome = run(&mut state, step_fn);
        if outcome.cause != HaltCause::Halt {
            eprintln!("{}: stopped with {}", workload.name, outcome.cause);
            break;
        }
        instructions += outcome.steps + 1;
    }

    BenchmarkResult {
        name: workload.name,
        encoding,
        instructions,
        elapsed: start.elapsed(),
    }
}

fn main() {
    println!("vm8-core performance harness ({ITERATIONS} runs per workload)");
    println!();

    for workload in workloads() {
        for encoding in [Encoding::Verbatim, Encoding::Packed] {
            let result = benchmark(&workload, encoding);
            println!(
                "{:<12} {:<9} {:>12} instr  {:>10.3} ms  {:>8.2} MIPS",
                result.name,
                result.encoding.name(),
                result.instructions,
                result.elapsed.as_secs_f64() * 1000.0,
                result.instructions_per_second() / 1_000_000.0,
            );
        }
    }
}
