//! Command-line driver: parse, link, check, and print a linked module.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser as ClapParser;

use llir::link::{link, link_target_info};
use llir::validator::check_module;

/// Typed IR linker and pretty-printer.
#[derive(ClapParser)]
#[command(name = "llirc")]
#[command(about = "Typed IR linker and pretty-printer", long_about = None, version)]
struct Cli {
    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Writes the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input source files
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.verbose {
        0 => log::set_max_level(log::LevelFilter::Info),
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if cli.inputs.is_empty() {
        bail!("no input files given");
    }

    let mut modules = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        log::debug!("tokenizing and parsing {}", path.display());
        let text = fs::read_to_string(path)?;
        let module = llir::parse(&path.display().to_string(), &text)?;
        modules.push(module);
    }

    log::debug!("linking {} module(s)", modules.len());
    let mut context = llir::Module::new();
    link_target_info(&modules, &mut context)?;
    let mut linked = link(&modules)?;
    linked.datalayout = context.datalayout;
    linked.triple = context.triple;

    log::debug!("checking linked module");
    check_module(&linked)?;

    let printed = llir::print_module(&linked);
    match &cli.output {
        Some(path) => fs::write(path, printed)?,
        None => print!("{printed}"),
    }

    Ok(())
}
