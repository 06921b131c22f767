use std::ops::{Deref, RangeInclusive};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Polynomial;

/// A single `(x, y)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// Fixed collection of samples the population is fitted against.
///
/// Generated once per run from a reference polynomial and never modified
/// afterwards. Dereferences to `[DataPoint]`.
///
/// # Example
///
/// ```
/// use genepi_engine::{Polynomial, TrainingSet};
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
///
/// let square = Polynomial::new(vec![0.0, 0.0, 1.0]);
/// let mut rng = Pcg32::seed_from_u64(7);
/// let data = TrainingSet::generate(&square, 50, -10.0..=10.0, &mut rng);
///
/// assert_eq!(data.len(), 50);
/// assert!(data.iter().all(|p| p.y == p.x * p.x));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingSet {
    points: Vec<DataPoint>,
}

impl TrainingSet {
    /// Samples `count` arguments uniformly from `domain` and evaluates
    /// `reference` at each of them.
    ///
    /// # Panics
    ///
    /// Panics if `domain` is empty or not finite.
    #[must_use]
    pub fn generate<R>(
        reference: &Polynomial,
        count: usize,
        domain: RangeInclusive<f64>,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let points = (0..count)
            .map(|_| {
                let x = rng.random_range(domain.clone());
                DataPoint {
                    x,
                    y: reference.eval(x),
                }
            })
            .collect();
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }
}

impl From<Vec<DataPoint>> for TrainingSet {
    fn from(points: Vec<DataPoint>) -> Self {
        Self { points }
    }
}

impl Deref for TrainingSet {
    type Target = [DataPoint];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}
