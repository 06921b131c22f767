use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use genepi_engine::Seed;
use genepi_evaluator::decoder;
use genepi_training::{
    evolution::{Evolution, GenerationObserver, GenerationReport},
    settings::{GaSettings, ReferencePolynomial},
};

use crate::{
    model::fit_result::FitResult,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Settings file (JSON); missing fields take their default values
    #[arg(long)]
    config: Option<PathBuf>,
    #[clap(flatten)]
    overrides: SettingsOverrides,
    /// Seed as 32 hex digits; a random seed is used when omitted
    #[arg(long)]
    seed: Option<Seed>,
    /// Prefix of the files written to the output directory
    #[arg(long, default_value = "default")]
    batch: String,
    /// Directory receiving the TSV files
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,
    /// Print progress every N generations
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    print_every: u64,
    /// Print the final population
    #[arg(long, default_value_t = false)]
    show_population: bool,
    /// Result file path (JSON); stdout when omitted
    #[arg(long)]
    result: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, clap::Args)]
struct SettingsOverrides {
    #[arg(long)]
    population_size: Option<usize>,
    #[arg(long)]
    max_generations: Option<usize>,
    #[arg(long)]
    training_data_size: Option<usize>,
    #[arg(long)]
    error_threshold: Option<f64>,
    /// Base per-bit mutation rate
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Reference coefficients from x^0 upwards, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    reference: Option<Vec<f64>>,
}

impl SettingsOverrides {
    fn apply(&self, settings: &mut GaSettings) {
        let Self {
            population_size,
            max_generations,
            training_data_size,
            error_threshold,
            mutation_rate,
            reference,
        } = self;
        if let Some(v) = population_size {
            settings.population_size = *v;
        }
        if let Some(v) = max_generations {
            settings.max_generations = *v;
        }
        if let Some(v) = training_data_size {
            settings.training_data_size = *v;
        }
        if let Some(v) = error_threshold {
            settings.error_threshold = *v;
        }
        if let Some(v) = mutation_rate {
            settings.base_mutation_rate = *v;
        }
        if let Some(coeffs) = reference {
            settings.reference = ReferencePolynomial::Explicit(coeffs.clone());
        }
    }
}

#[derive(Debug, Clone)]
struct BatchPaths {
    input_poly: PathBuf,
    training_data: PathBuf,
    progress_data: PathBuf,
    output_poly: PathBuf,
}

impl BatchPaths {
    fn new(dir: &Path, batch: &str) -> Self {
        let path = |suffix: &str| dir.join(format!("{batch}_{suffix}.tsv"));
        Self {
            input_poly: path("input_poly"),
            training_data: path("training_data"),
            progress_data: path("progress_data"),
            output_poly: path("output_poly"),
        }
    }
}

/// Streams `generation<TAB>best<TAB>mean` lines and prints console progress.
struct ProgressRecorder {
    output: Output,
    print_every: u64,
    error: Option<io::Error>,
}

impl GenerationObserver for ProgressRecorder {
    fn on_generation(&mut self, report: &GenerationReport) {
        if self.error.is_none()
            && let Err(e) = writeln!(
                self.output,
                "{}\t{}\t{}",
                report.generation, report.best_error, report.mean_error
            )
        {
            self.error = Some(e);
        }

        if report.generation as u64 % self.print_every == 0 || report.status.is_terminal() {
            eprintln!(
                "GEN# {:04}:   avg_err: {:10.3},   best_err: {:8.3},   reps: {:3},   mut: {:5.3}{}",
                report.generation,
                report.mean_error,
                report.best_error,
                report.best_repeats,
                report.mutation_rate,
                if report.population_reset {
                    "   (reset)"
                } else {
                    ""
                },
            );
        }
    }
}

fn load_settings(arg: &RunArg) -> anyhow::Result<GaSettings> {
    let mut settings = match &arg.config {
        Some(path) => util::read_json_file("settings", path)?,
        None => GaSettings::default(),
    };
    arg.overrides.apply(&mut settings);
    settings.validate().context("Invalid settings")?;
    let quantized = settings.reference.quantized();
    if quantized != settings.reference {
        log::warn!("reference coefficients snapped to representable values: {quantized}");
        settings.reference = quantized;
    }
    Ok(settings)
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let settings = load_settings(arg)?;
    let seed = arg.seed.unwrap_or_else(rand::random);
    let mut evolution = Evolution::new(settings, seed).context("Invalid settings")?;

    eprintln!("Seed:      {seed}");
    eprintln!("Reference: {}", evolution.reference());
    eprintln!(
        "Settings:  population {}, max generations {}, training points {}, error threshold {}",
        evolution.settings().population_size,
        evolution.settings().max_generations,
        evolution.settings().training_data_size,
        evolution.settings().error_threshold,
    );

    fs::create_dir_all(&arg.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output_dir.display()
        )
    })?;
    let paths = BatchPaths::new(&arg.output_dir, &arg.batch);
    Output::open(paths.input_poly.clone())?.write_coefficients(evolution.reference())?;
    Output::open(paths.training_data.clone())?.write_data_points(evolution.training_set())?;

    let mut recorder = ProgressRecorder {
        output: Output::open(paths.progress_data.clone())?,
        print_every: arg.print_every,
        error: None,
    };
    let result = evolution.run_with(&mut recorder);
    if let Some(e) = recorder.error.take() {
        return Err(e).with_context(|| {
            format!("Failed to write to {}", recorder.output.display_path())
        });
    }
    recorder.output.finish()?;

    Output::open(paths.output_poly.clone())?.write_coefficients(&result.polynomial)?;

    if arg.show_population {
        eprintln!();
        eprintln!("Final population:");
        let population = evolution.population();
        for (genome, error) in std::iter::zip(population.genomes(), population.errors()) {
            eprintln!(
                "  {genome} err: {error:10.3}  coeffs: {:5.2?}",
                decoder::decode(genome).coefficients()
            );
        }
    }

    let champion = evolution.champion();
    eprintln!();
    eprintln!("Evolution {}", result.status);
    eprintln!("  Generations: {}", result.generations);
    eprintln!("  Result:      {:.2?}", result.polynomial.coefficients());
    eprintln!("               (i.e. P = {})", result.polynomial);
    eprintln!("  Error:       {:.3}", result.error);
    if champion.error < result.error {
        eprintln!(
            "  Best seen:   {} (error {:.3}, generation {})",
            decoder::decode(&champion.genome),
            champion.error,
            champion.generation
        );
    }
    eprintln!("  Data:        {}", arg.output_dir.display());

    let fit = FitResult::new(arg.batch.clone(), seed, &result);
    Output::save_json(&fit, arg.result.clone())?;
    if let Some(path) = &arg.result {
        eprintln!("  Result file: {}", path.display());
    }

    Ok(())
}
