//! Approximation error of decoded polynomials.
//!
//! The error of a polynomial `P` against a training set is the mean absolute
//! deviation:
//!
//! ```text
//! error = (1/n) * Σ |y_i - P(x_i)|
//! ```
//!
//! Lower is better and `0.0` is an exact fit. Turning errors into selection
//! weights is left to the training crate.
//!
//! Errors are never NaN. On very wide domains `y_i` and `P(x_i)` can both
//! overflow to infinity; such a fit is scored as `f64::INFINITY`, the worst
//! possible error.

use genepi_engine::{Genome, Polynomial, TrainingSet};

use crate::decoder;

/// Mean absolute deviation of `poly` over `data`.
///
/// Returns `f64::INFINITY` when the deviation is undefined (NaN).
///
/// # Panics
///
/// Panics if `data` is empty.
#[must_use]
pub fn mean_absolute_error(poly: &Polynomial, data: &TrainingSet) -> f64 {
    assert!(!data.is_empty(), "training set must not be empty");
    let total = data.iter().map(|p| (p.y - poly.eval(p.x)).abs()).sum::<f64>();
    #[expect(clippy::cast_precision_loss)]
    let n = data.len() as f64;
    let error = total / n;
    if error.is_nan() { f64::INFINITY } else { error }
}

/// Scores genomes against a fixed training set.
///
/// # Example
///
/// ```
/// use genepi_engine::{DataPoint, Genome, TrainingSet};
/// use genepi_evaluator::fitness::GenomeEvaluator;
///
/// let data = TrainingSet::from(vec![
///     DataPoint { x: 1.0, y: 1.0 },
///     DataPoint { x: 2.0, y: 4.0 },
/// ]);
/// let evaluator = GenomeEvaluator::new(&data);
///
/// // all-zero genome decodes to the zero polynomial
/// assert_eq!(evaluator.error(&Genome::zeroed(35)), 2.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GenomeEvaluator<'a> {
    data: &'a TrainingSet,
}

impl<'a> GenomeEvaluator<'a> {
    /// # Panics
    ///
    /// Panics if `data` is empty.
    #[must_use]
    pub fn new(data: &'a TrainingSet) -> Self {
        assert!(!data.is_empty(), "training set must not be empty");
        Self { data }
    }

    #[must_use]
    pub fn training_set(&self) -> &'a TrainingSet {
        self.data
    }

    /// Decodes `genome` and returns its error.
    #[must_use]
    pub fn error(&self, genome: &Genome) -> f64 {
        mean_absolute_error(&decoder::decode(genome), self.data)
    }

    /// Errors of every genome, in order.
    #[must_use]
    pub fn errors(&self, genomes: &[Genome]) -> Vec<f64> {
        genomes.iter().map(|g| self.error(g)).collect()
    }
}
