//! List the packages of an `.hpkr` repository index, one per line.

use clap::Parser;
use hpkg_stream::{FileType, HpkError, HpkrFileExtractor, PkgWriter, Result};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hpk-pkg-dump")]
#[command(version, about = "Print a summary line for each package in a Haiku repository file")]
struct Args {
    /// Repository (.hpkr) file
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(count) => {
            debug!(count, "listed packages");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("hpk-pkg-dump: {}: {e}", args.file.display());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<usize> {
    if FileType::detect(&args.file)? != FileType::Hpkr {
        return Err(HpkError::Precondition(
            "package summaries can only be listed from an hpkr file".to_string(),
        ));
    }
    let extractor = HpkrFileExtractor::open(&args.file)?;
    let stdout = io::stdout();
    PkgWriter::new(BufWriter::new(stdout.lock())).write_packages(extractor.packages())
}
