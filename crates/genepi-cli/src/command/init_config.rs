use std::path::PathBuf;

use genepi_training::settings::GaSettings;

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InitConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &InitConfigArg) -> anyhow::Result<()> {
    let InitConfigArg { output } = arg;
    Output::save_json(&GaSettings::default(), output.clone())?;
    if let Some(path) = output {
        eprintln!("Default settings written to {}", path.display());
    }
    Ok(())
}
