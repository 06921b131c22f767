//! Run configuration and its validation.
//!
//! [`GaSettings`] is the construction contract of an evolution run. It is plain
//! data (serde-enabled, every field defaulted) and is checked once by
//! [`GaSettings::validate`] before any run starts; a run never clamps or repairs
//! invalid settings.

use std::fmt;

use genepi_engine::{MAX_GENOME_BITS, Polynomial};
use genepi_evaluator::decoder::{self, BITS_PER_COEFFICIENT};
use serde::{Deserialize, Serialize};

/// Parameters of an evolution run.
///
/// # Example
///
/// ```
/// use genepi_training::settings::{GaSettings, ReferencePolynomial};
///
/// let settings = GaSettings {
///     population_size: 20,
///     max_generations: 50,
///     reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 1.0, 0.0, 0.0]),
///     ..GaSettings::default()
/// };
/// assert!(settings.validate().is_ok());
///
/// let odd = GaSettings { population_size: 21, ..settings };
/// assert!(odd.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GaSettings {
    /// Genome length in bits; decodes to `genome_bits / 7` coefficients.
    pub genome_bits: usize,
    /// Number of genomes per generation (even, positive).
    pub population_size: usize,
    /// Generation budget.
    pub max_generations: usize,
    /// Number of training samples drawn from the reference polynomial.
    pub training_data_size: usize,
    /// The run converges once the best error is at or below this value.
    pub error_threshold: f64,
    /// Per-bit mutation probability while the run is making progress.
    pub base_mutation_rate: f64,
    /// Stagnant generations before the mutation rate starts growing.
    pub growth_threshold: usize,
    /// Stagnant generations before the population is replaced.
    pub reset_threshold: usize,
    /// Rate multiplier per stagnant generation while growing.
    pub growth_coeff: f64,
    /// Relative change in best error below which a generation counts as stagnant.
    pub small_progress_threshold: f64,
    /// Lower bound of the sampled domain.
    pub argmin: f64,
    /// Upper bound of the sampled domain.
    pub argmax: f64,
    /// Polynomial the training samples are drawn from.
    pub reference: ReferencePolynomial,
}

impl Default for GaSettings {
    fn default() -> Self {
        Self {
            genome_bits: 35,
            population_size: 1000,
            max_generations: 10000,
            training_data_size: 50,
            error_threshold: 0.01,
            base_mutation_rate: 0.001,
            growth_threshold: 25,
            reset_threshold: 250,
            growth_coeff: 0.5,
            small_progress_threshold: 0.01,
            argmin: -10.0,
            argmax: 10.0,
            reference: ReferencePolynomial::Random,
        }
    }
}

impl GaSettings {
    /// Number of coefficients genomes decode to under these settings.
    #[must_use]
    pub fn coefficient_count(&self) -> usize {
        decoder::coefficient_count(self.genome_bits)
    }

    /// Checks every precondition of a run.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(BITS_PER_COEFFICIENT..=MAX_GENOME_BITS).contains(&self.genome_bits) {
            return Err(SettingsError::GenomeBits {
                bits: self.genome_bits,
            });
        }
        if self.population_size == 0 || self.population_size % 2 != 0 {
            return Err(SettingsError::PopulationSize {
                size: self.population_size,
            });
        }
        if self.max_generations == 0 {
            return Err(SettingsError::MaxGenerations);
        }
        if self.training_data_size == 0 {
            return Err(SettingsError::TrainingDataSize);
        }
        if !(self.error_threshold > 0.0 && self.error_threshold.is_finite()) {
            return Err(SettingsError::ErrorThreshold {
                value: self.error_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.base_mutation_rate) {
            return Err(SettingsError::MutationRate {
                value: self.base_mutation_rate,
            });
        }
        if self.reset_threshold <= self.growth_threshold {
            return Err(SettingsError::Thresholds {
                growth: self.growth_threshold,
                reset: self.reset_threshold,
            });
        }
        if !(self.growth_coeff >= 0.0 && self.growth_coeff.is_finite()) {
            return Err(SettingsError::GrowthCoeff {
                value: self.growth_coeff,
            });
        }
        if !(self.small_progress_threshold >= 0.0 && self.small_progress_threshold.is_finite()) {
            return Err(SettingsError::SmallProgressThreshold {
                value: self.small_progress_threshold,
            });
        }
        if !(self.argmin.is_finite() && self.argmax.is_finite() && self.argmin < self.argmax) {
            return Err(SettingsError::Domain {
                argmin: self.argmin,
                argmax: self.argmax,
            });
        }
        if let ReferencePolynomial::Explicit(coeffs) = &self.reference {
            let expected = self.coefficient_count();
            if coeffs.len() != expected {
                return Err(SettingsError::ReferenceLength {
                    expected,
                    actual: coeffs.len(),
                });
            }
            if coeffs.iter().any(|c| !c.is_finite()) {
                return Err(SettingsError::ReferenceNotFinite);
            }
        }
        Ok(())
    }
}

/// Source of the reference polynomial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolynomial {
    /// Decode a uniformly random genome, so the target is always representable.
    #[default]
    Random,
    /// Coefficients from `x^0` upwards; must match the genome layout.
    Explicit(Vec<f64>),
}

impl ReferencePolynomial {
    /// Snaps explicit coefficients onto the grid genomes can represent.
    ///
    /// See [`Polynomial::quantized`]. Non-finite coefficients are kept as is
    /// so that [`GaSettings::validate`] still rejects them.
    #[must_use]
    pub fn quantized(&self) -> Self {
        match self {
            Self::Explicit(coeffs) if !coeffs.is_empty() => {
                let snapped = Polynomial::new(coeffs.clone()).quantized();
                Self::Explicit(
                    coeffs
                        .iter()
                        .zip(snapped.into_coefficients())
                        .map(|(&c, q)| if c.is_finite() { q } else { c })
                        .collect(),
                )
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for ReferencePolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Explicit(coeffs) => write!(f, "{coeffs:?}"),
        }
    }
}

/// A violated precondition of [`GaSettings`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SettingsError {
    #[display(
        "genome length must be in {}..={} bits, got {bits}",
        BITS_PER_COEFFICIENT,
        MAX_GENOME_BITS
    )]
    GenomeBits { bits: usize },
    #[display("population size must be even and positive, got {size}")]
    PopulationSize { size: usize },
    #[display("max generations must be positive")]
    MaxGenerations,
    #[display("training data size must be positive")]
    TrainingDataSize,
    #[display("error threshold must be positive, got {value}")]
    ErrorThreshold { value: f64 },
    #[display("mutation rate must be in [0, 1], got {value}")]
    MutationRate { value: f64 },
    #[display("reset threshold ({reset}) must be greater than growth threshold ({growth})")]
    Thresholds { growth: usize, reset: usize },
    #[display("growth coefficient must be non-negative, got {value}")]
    GrowthCoeff { value: f64 },
    #[display("small progress threshold must be non-negative, got {value}")]
    SmallProgressThreshold { value: f64 },
    #[display("invalid sampling domain [{argmin}, {argmax}]")]
    Domain { argmin: f64, argmax: f64 },
    #[display("reference polynomial needs {expected} coefficients, got {actual}")]
    ReferenceLength { expected: usize, actual: usize },
    #[display("reference polynomial coefficients must be finite")]
    ReferenceNotFinite,
}
