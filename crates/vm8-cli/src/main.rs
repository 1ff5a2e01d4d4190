//! CLI entry point for the cpuVM8 virtual CPU.

mod errors;
mod throttle;

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vm8_core::{
    disassemble, run, validate_program, CoreConfig, CpuDump, CpuState, Encoding, HaltCause,
    MemoryLayout, DEFAULT_STACK_SIZE,
};

#[cfg(test)]
use tempfile as _;

use crate::errors::CliError;
use crate::throttle::Throttle;

/// Exit status for failures outside the CPU.
const EXIT_USAGE: i32 = 2;

/// Runs, benchmarks and disassembles cpuVM8 program images.
#[derive(Debug, Parser)]
#[command(name = "cpuvm8", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an image and run it until the CPU halts
    Run {
        /// Program image loaded at address 0
        image: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
        /// State dump printed after the run
        #[arg(long, value_enum, default_value_t = DumpFormat::Text)]
        dump: DumpFormat,
    },
    /// Execute a fixed number of steps, restarting the image after each halt
    Bench {
        /// Program image loaded at address 0
        image: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
        /// Number of instructions to execute
        #[arg(long, default_value_t = 10_000_000)]
        steps: u64,
    },
    /// Print the disassembly of an image
    Disasm {
        /// Program image to disassemble
        image: PathBuf,
        /// Decode the two-byte packed encoding
        #[arg(short, long)]
        packed: bool,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct MachineArgs {
    /// Decode the two-byte packed encoding
    #[arg(short, long)]
    packed: bool,
    /// Throttle to this clock rate in MHz (minimum 0.01)
    #[arg(long)]
    mhz: Option<f64>,
    /// Bytes reserved for the stack at the top of memory
    #[arg(long, default_value_t = DEFAULT_STACK_SIZE)]
    stack_size: u8,
}

impl MachineArgs {
    const fn encoding(&self) -> Encoding {
        if self.packed {
            Encoding::Packed
        } else {
            Encoding::Verbatim
        }
    }

    fn config(&self) -> Result<CoreConfig, CliError> {
        Ok(CoreConfig {
            layout: MemoryLayout::new(self.stack_size)?,
            encoding: self.encoding(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    Text,
    Json,
    None,
}

fn read_image(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::ReadImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds a state with `image` loaded, warning about undecodable instructions.
fn prepare(image: &[u8], config: &CoreConfig) -> Result<CpuState, CliError> {
    let mut state = CpuState::with_config(config);
    state.load_program(image)?;
    for row in validate_program(&state.memory, image.len(), config.encoding) {
        tracing::warn!(addr = row.addr, "{row}");
    }
    Ok(state)
}

fn run_image(path: &Path, machine: &MachineArgs, dump: DumpFormat) -> Result<HaltCause, CliError> {
    let config = machine.config()?;
    let image = read_image(path)?;
    let mut state = prepare(&image, &config)?;
    let step_fn = config.step_fn();

    tracing::debug!(
        image = %path.display(),
        len = image.len(),
        encoding = config.encoding.name(),
        "loaded program"
    );

    let outcome = match machine.mhz {
        Some(mhz) => {
            let throttle = Throttle::new(mhz);
            let mut executed = 0_u64;
            run(&mut state, |cpu| {
                let status = step_fn(cpu);
                executed += 1;
                throttle.pace(executed);
                status
            })
        }
        None => run(&mut state, step_fn),
    };

    match dump {
        DumpFormat::Text => print!("{}", CpuDump::new(&state)),
        DumpFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        DumpFormat::None => {}
    }

    Ok(outcome.cause)
}

#[allow(clippy::cast_precision_loss)]
fn bench_image(path: &Path, machine: &MachineArgs, steps: u64) -> Result<(), CliError> {
    let config = machine.config()?;
    let image = read_image(path)?;
    let mut state = prepare(&image, &config)?;
    let step_fn = config.step_fn();
    let throttle = machine.mhz.map(Throttle::new);
    let mut restarts = 0_u64;

    let start = Instant::now();
    for executed in 1..=steps {
        if step_fn(&mut state).is_halted() {
            state.reset();
            state.load_program(&image)?;
            restarts += 1;
        }
        if let Some(throttle) = &throttle {
            throttle.pace(executed);
        }
    }
    let seconds = start.elapsed().as_secs_f64();

    println!("Executed {steps} instructions in {seconds:.5} seconds");
    println!(
        "Performance: {:.2} MIPS",
        steps as f64 / seconds.max(f64::EPSILON) / 1_000_000.0
    );
    println!("Restarts after halt: {restarts}");
    Ok(())
}

fn disasm_image(path: &Path, packed: bool) -> Result<(), CliError> {
    let encoding = if packed {
        Encoding::Packed
    } else {
        Encoding::Verbatim
    };
    let image = read_image(path)?;
    let mut state = CpuState::default();
    state.load_program(&image)?;

    let count = image.len().div_ceil(usize::from(encoding.width()));
    for row in disassemble(&state.memory, 0, count, encoding) {
        println!("{row}");
    }
    Ok(())
}

fn execute(command: &Command) -> Result<i32, CliError> {
    match command {
        Command::Run {
            image,
            machine,
            dump,
        } => {
            let cause = run_image(image, machine, *dump)?;
            Ok(i32::from(cause.is_error()))
        }
        Command::Bench {
            image,
            machine,
            steps,
        } => bench_image(image, machine, *steps).map(|()| 0),
        Command::Disasm { image, packed } => disasm_image(image, *packed).map(|()| 0),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let exit_code = match execute(&cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            EXIT_USAGE
        }
    };

    process::exit(exit_code);
}
