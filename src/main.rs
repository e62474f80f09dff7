use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use asitedesign::block::Asitedesign;
use asitedesign::config::Properties;

/// Wrapper of the AsiteDesign active-site design tool.
///
/// Stages the inputs into a working directory, merges the user YAML with
/// the selected simulation preset, runs the tool (optionally inside a
/// container) and collects its outputs into a zip archive.
#[derive(Parser)]
#[command(name = "asitedesign", version)]
struct Args {
    /// Path to the input PDB structure.
    #[arg(long)]
    input_pdb: PathBuf,
    /// Path to the input YAML configuration.
    #[arg(long)]
    input_yaml: PathBuf,
    /// Parameter source: a directory, a zip archive or a single .params file.
    #[arg(long)]
    params: PathBuf,
    /// Path of the output zip archive.
    #[arg(long)]
    output_path: PathBuf,
    /// Optional properties YAML overriding the defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let properties =
        Properties::load(args.config.as_deref()).context("failed to load properties file")?;
    let block = Asitedesign::new(
        args.input_pdb,
        args.input_yaml,
        args.params,
        args.output_path,
        properties,
    );
    let code = block.launch()?;
    // the wrapped tool's exit code is the invocation's exit code
    Ok(ExitCode::from(code.clamp(0, 255) as u8))
}
