use std::path::PathBuf;

use anyhow::ensure;
use genepi_engine::{Polynomial, Seed, TrainingSet};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateDataArg {
    /// Coefficients from x^0 upwards, comma separated
    #[arg(
        long,
        required = true,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    reference: Vec<f64>,
    /// Number of points to sample
    #[arg(long, default_value_t = 50)]
    count: usize,
    #[arg(long, default_value_t = -10.0, allow_negative_numbers = true)]
    argmin: f64,
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    argmax: f64,
    /// Seed as 32 hex digits; a random seed is used when omitted
    #[arg(long)]
    seed: Option<Seed>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateDataArg) -> anyhow::Result<()> {
    let GenerateDataArg {
        reference,
        count,
        argmin,
        argmax,
        seed,
        output,
    } = arg;
    ensure!(!reference.is_empty(), "Reference polynomial must not be empty");
    ensure!(
        argmin.is_finite() && argmax.is_finite() && argmin <= argmax,
        "Invalid sampling domain [{argmin}, {argmax}]"
    );
    ensure!(
        reference.iter().all(|c| c.is_finite()),
        "Reference coefficients must be finite"
    );

    let seed = seed.unwrap_or_else(rand::random);
    let reference = Polynomial::new(reference.clone());
    let data = TrainingSet::generate(&reference, *count, *argmin..=*argmax, &mut seed.rng());

    let mut output = Output::from_output_path(output.clone())?;
    output.write_data_points(&data)?;

    eprintln!("Generated {} points of P = {reference}", data.len());
    eprintln!("  Seed:   {seed}");
    eprintln!("  Output: {}", output.display_path());

    Ok(())
}
