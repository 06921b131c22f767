//! Population bookkeeping and the selection/crossover operators on it.
//!
//! A [`Population`] pairs every genome with its raw error and its normalized
//! fitness. Both tables are computed when the population is built, so they can
//! never go stale: a new generation is a new `Population`.
//!
//! # Fitness
//!
//! Each raw error `e` is inverted into a base fitness (`1/e`, or
//! [`EXACT_FIT_FITNESS`] when `e == 0`) and divided by half the average base
//! fitness. The normalized values therefore sum to `2 * len`, the size of the
//! mating pool [`Population::reproduce`] builds.
//!
//! # Reproduction
//!
//! Remainder stochastic sampling: a genome with normalized fitness `f` first gets
//! `floor(f)` copies, then the pool is topped up by drawing from the fractional
//! remainders with [`pick_by_probability`].

use genepi_engine::Genome;
use genepi_evaluator::fitness::GenomeEvaluator;
use genepi_stats::descriptive::DescriptiveStats;
use rand::{Rng, seq::SliceRandom as _};

/// Base fitness given to a genome that fits the training set exactly.
pub const EXACT_FIT_FITNESS: f64 = 100_000.0;

/// Genomes of one generation with their errors and normalized fitness.
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<Genome>,
    errors: Vec<f64>,
    fitness: Vec<f64>,
}

impl Population {
    /// Scores `genomes` and builds the population.
    ///
    /// # Panics
    ///
    /// Panics if `genomes` is empty.
    #[must_use]
    pub fn new(genomes: Vec<Genome>, evaluator: &GenomeEvaluator<'_>) -> Self {
        assert!(!genomes.is_empty(), "population must not be empty");
        let errors = evaluator.errors(&genomes);
        let fitness = normalized_fitness(&errors);
        Self {
            genomes,
            errors,
            fitness,
        }
    }

    /// Creates a population of `count` random `bit_len`-bit genomes.
    #[must_use]
    pub fn random<R>(
        count: usize,
        bit_len: usize,
        evaluator: &GenomeEvaluator<'_>,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let genomes = (0..count).map(|_| Genome::random(bit_len, rng)).collect();
        Self::new(genomes, evaluator)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Raw errors, index-aligned with [`Self::genomes`].
    #[must_use]
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Normalized fitness, index-aligned with [`Self::genomes`].
    #[must_use]
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Index of the minimum-error genome (earliest on ties).
    #[must_use]
    pub fn best_index(&self) -> usize {
        self.errors
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(i, _)| i)
    }

    /// The minimum-error genome and its error.
    #[must_use]
    pub fn best(&self) -> (&Genome, f64) {
        let i = self.best_index();
        (&self.genomes[i], self.errors[i])
    }

    /// Summary of the error distribution.
    #[must_use]
    pub fn error_stats(&self) -> DescriptiveStats {
        DescriptiveStats::new(self.errors.iter().copied())
            .expect("population is never empty")
    }

    /// Builds a mating pool of exactly `2 * len` genomes by proportional selection.
    ///
    /// Copies are made in two passes: `floor(fitness)` deterministic copies per
    /// genome, then the remaining slots are filled by sampling the fractional
    /// remainders.
    #[must_use]
    pub fn reproduce<R>(&self, rng: &mut R) -> Vec<Genome>
    where
        R: Rng + ?Sized,
    {
        let target = self.len() * 2;
        let mut pool = Vec::with_capacity(target);
        let mut remainders = Vec::with_capacity(self.len());

        for (genome, fit) in std::iter::zip(&self.genomes, &self.fitness) {
            let copies = fit.floor();
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let copy_count = copies as usize;
            pool.extend(std::iter::repeat_n(genome, copy_count).cloned());
            remainders.push(fit - copies);
        }
        pool.truncate(target);

        let table = cumulative_probabilities(&remainders);
        while pool.len() < target {
            let i = pick_by_probability(&table, rng);
            pool.push(self.genomes[i].clone());
        }

        debug_assert_eq!(pool.len(), target);
        pool
    }
}

/// Shuffles the pool and crosses consecutive pairs, one child per pair.
///
/// # Panics
///
/// Panics if the pool has an odd number of genomes.
#[must_use]
pub fn crossover_pool<R>(mut pool: Vec<Genome>, rng: &mut R) -> Vec<Genome>
where
    R: Rng + ?Sized,
{
    assert!(pool.len() % 2 == 0, "mating pool size must be even");
    pool.shuffle(rng);
    pool.chunks_exact(2)
        .map(|pair| pair[0].crossover(&pair[1], rng))
        .collect()
}

/// Inverts errors into fitness and scales it to sum to `2 * errors.len()`.
///
/// An infinite error gets zero base fitness. When the base fitness total is
/// zero or not finite, every genome gets the same share (`2.0`).
#[must_use]
pub fn normalized_fitness(errors: &[f64]) -> Vec<f64> {
    let mut fitness = errors
        .iter()
        .map(|&e| if e == 0.0 { EXACT_FIT_FITNESS } else { 1.0 / e })
        .collect::<Vec<_>>();
    let total = fitness.iter().sum::<f64>();
    if !(total > 0.0 && total.is_finite()) {
        return vec![2.0; errors.len()];
    }
    #[expect(clippy::cast_precision_loss)]
    let half_avg_fitness = total / (errors.len() * 2) as f64;
    for f in &mut fitness {
        *f /= half_avg_fitness;
    }
    fitness
}

/// Turns weights into a running sum of their normalized shares.
///
/// The last entry is `1.0` up to rounding. When every weight is zero the table
/// is uniform.
#[must_use]
pub fn cumulative_probabilities(weights: &[f64]) -> Vec<f64> {
    let total = weights.iter().sum::<f64>();
    #[expect(clippy::cast_precision_loss)]
    let uniform = 1.0 / weights.len() as f64;
    let mut subtotal = 0.0;
    weights
        .iter()
        .map(|w| {
            subtotal += if total > 0.0 { w / total } else { uniform };
            subtotal
        })
        .collect()
}

/// Draws an index from a cumulative probability table.
///
/// Samples `u` uniformly from `[0, 1)` and returns the first index whose entry
/// is at least `u`, or the last index if rounding left every entry below it.
///
/// # Panics
///
/// Panics if `table` is empty.
pub fn pick_by_probability<R>(table: &[f64], rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    assert!(!table.is_empty(), "probability table must not be empty");
    let value = rng.random::<f64>();
    table
        .iter()
        .position(|p| value <= *p)
        .unwrap_or(table.len() - 1)
}
