//! Dump the attribute trees of an `.hpkg` or `.hpkr` file.

use clap::Parser;
use hpkg_stream::{AttributeWriter, FileType, HpkgFileExtractor, HpkrFileExtractor, Result};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hpk-attribute-dump")]
#[command(version, about = "Print the attributes stored in a Haiku package or repository file")]
struct Args {
    /// Package (.hpkg) or repository (.hpkr) file
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
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hpk-attribute-dump: {}: {e}", args.file.display());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = AttributeWriter::new(BufWriter::new(stdout.lock()));

    match FileType::detect(&args.file)? {
        FileType::Hpkg => {
            let extractor = HpkgFileExtractor::open(&args.file)?;
            writer.write_heading("package attributes")?;
            writer.write_attributes(extractor.package_attributes_iterator())?;
            writer.write_heading("toc")?;
            writer.write_attributes(extractor.toc_iterator())?;
        }
        FileType::Hpkr => {
            let extractor = HpkrFileExtractor::open(&args.file)?;
            writer.write_attributes(extractor.package_attributes_iterator())?;
        }
    }

    writer.flush()
}
