use std::error::Error;
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use clap::ArgAction::{Set, SetTrue};
use clap::{Parser, ValueEnum};
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use assembler::{assemble_file, AssemblerFailure, AssemblerOptions, Assembly, OutputOptions};
use base::prelude::CpuVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Cpu {
    Pdp8,
    Hm6120,
    Im6100,
}

impl From<Cpu> for CpuVariant {
    fn from(cpu: Cpu) -> CpuVariant {
        match cpu {
            Cpu::Pdp8 => CpuVariant::Pdp8,
            Cpu::Hm6120 => CpuVariant::Hm6120,
            Cpu::Im6100 => CpuVariant::Im6100,
        }
    }
}

/// Cross-assembler for the PDP-8 family (including the HM6120 and
/// IM6100)
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// File from which assembly source is read.
    #[clap(action = Set)]
    input: OsString,

    /// File to which the BIN format tape is written (by default, the
    /// input file name with the extension ".bin").
    #[clap(action = Set, short = 'o', long)]
    output: Option<PathBuf>,

    /// When set, write a listing on standard output.
    #[clap(action = SetTrue, long)]
    list: bool,

    /// The processor whose instructions are available before any
    /// .HM6120 or .IM6100 directive.
    #[clap(long, value_enum, default_value_t = Cpu::Pdp8)]
    cpu: Cpu,

    /// Log more detail (equivalent to RUST_LOG=debug).
    #[clap(action = SetTrue, short = 'v', long)]
    verbose: bool,
}

#[derive(Debug)]
enum Fail {
    /// We initialised the assembler but then it failed.
    AsmFail(AssemblerFailure),
    /// The program was assembled, but it has errors.
    ProgramErrors(usize),
    /// We were not able to correctly initialise the assembler.
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::AsmFail(assembler_failure) => assembler_failure.fmt(f),
            Fail::ProgramErrors(1) => f.write_str("the program has 1 error"),
            Fail::ProgramErrors(n) => write!(f, "the program has {n} errors"),
            Fail::InitialisationFailure(msg) => f.write_str(msg.as_str()),
        }
    }
}

impl Error for Fail {}

fn report_diagnostics(input: &OsString, assembly: &Assembly) {
    let name = input.to_string_lossy();
    for diagnostic in &assembly.diagnostics {
        eprintln!("{name}:{diagnostic}");
    }
}

fn run_assembler() -> Result<(), Fail> {
    let cli = Cli::parse();

    // RUST_LOG selects which trace messages get printed; see
    // https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
    {
        Err(e) => {
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "pdp8as", input=?cli.input, output=?cli.output);
    let _enter = span.enter();
    let options = AssemblerOptions {
        cpu: CpuVariant::from(cli.cpu),
    };
    let output_options = OutputOptions { list: cli.list };
    let assembly = assemble_file(&cli.input, cli.output.as_deref(), &options, output_options)
        .map_err(Fail::AsmFail)?;
    report_diagnostics(&cli.input, &assembly);
    let errors = assembly.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        event!(Level::ERROR, "assembly produced {errors} errors");
        Err(Fail::ProgramErrors(errors))
    } else {
        event!(Level::INFO, "assembly succeeded");
        Ok(())
    }
}

fn main() {
    unsafe { backtrace_on_stack_overflow::enable() };

    match run_assembler() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
