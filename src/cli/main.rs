use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tinymeta_io::{replace_file, JpegMetaManager, MediaType, MetaRequest, VendorRegistry};

#[derive(Parser, Debug)]
#[command(
    name = "tinymeta",
    version,
    about = "Read and update vendor metadata fields embedded in JPEG files"
)]
struct Cli {
    /// Input files (repeatable)
    #[arg(short, long = "input", value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Fields to read (`name`) or update (`name=value`), comma separated
    #[arg(short, long, value_name = "SPEC", value_delimiter = ',')]
    meta: Vec<String>,

    /// Metadata vendor, e.g. tinymeta or tinymetagzip
    #[arg(long = "mv", alias = "vendor", value_name = "VENDOR")]
    vendor: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::error!("{failed} of {} file(s) failed", cli.inputs.len());
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Process every input, returning the number of files that failed
fn run(cli: &Cli) -> Result<usize> {
    let request = MetaRequest::parse(&cli.meta);
    if request.is_empty() {
        return Ok(0);
    }
    let Some(vendor) = cli.vendor.as_deref() else {
        anyhow::bail!("--mv is required when -m is used");
    };

    let registry = VendorRegistry::builtin();
    registry.resolve(vendor)?;

    let failed: usize = cli
        .inputs
        .par_iter()
        .map(|path| match process_file(&registry, path, vendor, &request) {
            Ok(report) => {
                if let Some(report) = report {
                    print!("{report}");
                }
                0
            }
            Err(e) => {
                log::error!("{}: {e:#}", path.display());
                1
            }
        })
        .sum();
    Ok(failed)
}

/// Apply `request` to a single file
///
/// Returns the printable report when fields were read.
fn process_file(
    registry: &VendorRegistry,
    path: &Path,
    vendor: &str,
    request: &MetaRequest,
) -> Result<Option<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let (media_type, source) = MediaType::sniff(BufReader::new(file))?;
    log::debug!("{}: detected {media_type}", path.display());

    let mut manager = JpegMetaManager::new(registry, source)?;

    if !request.update.is_empty() {
        manager.upsert(vendor, &request.update)?;
    }

    let report = if request.read.is_empty() {
        None
    } else {
        let extracted = manager.extract(vendor, request.read.as_slice())?;
        let mut report = format!("File={}\n", path.display());
        for (name, value) in &extracted {
            writeln!(report, "{name:?}={value:?}")?;
        }
        report.push('\n');
        Some(report)
    };

    if !request.update.is_empty() {
        let written = replace_file(&mut manager.compose_output(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("updated {} ({written} bytes)", path.display());
    }

    Ok(report)
}
