use clap::{Parser, Subcommand};

use self::{generate_data::GenerateDataArg, init_config::InitConfigArg, run::RunArg};

mod generate_data;
mod init_config;
mod run;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
    /// Arguments of `run`, used when no subcommand is given
    #[clap(flatten)]
    run: RunArg,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Fit a polynomial with the genetic algorithm (default)
    Run(#[clap(flatten)] RunArg),
    /// Sample a reference polynomial into a training data TSV
    GenerateData(#[clap(flatten)] GenerateDataArg),
    /// Write the default settings as JSON
    InitConfig(#[clap(flatten)] InitConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Run(args.run)) {
        Mode::Run(arg) => run::run(&arg)?,
        Mode::GenerateData(arg) => generate_data::run(&arg)?,
        Mode::InitConfig(arg) => init_config::run(&arg)?,
    }
    Ok(())
}
