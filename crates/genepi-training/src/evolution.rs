//! The evolution controller.
//!
//! [`Evolution`] owns every piece of run state (population, training set, the
//! random generator and the stagnation counters) and advances it one generation
//! per [`Evolution::step`].
//!
//! # States
//!
//! ```text
//! Evolution::new ──▶ Evolving ──step──▶ Evolving ... ──▶ Converged | Exhausted
//! ```
//!
//! Construction is the initializing phase: it validates the settings, builds the
//! reference polynomial and training set, and scores a random population.
//!
//! # One Generation
//!
//! 1. **Reproduce** - build a `2 * n` mating pool by proportional selection
//! 2. **Crossover** - shuffle the pool, cross consecutive pairs into `n` children
//! 3. **Mutate** - flip child bits at the current mutation rate
//! 4. **Score** - evaluate the children, normalizing fitness
//! 5. **Track best** - count the generation as stagnant when the best error moved
//!    by less than `small_progress_threshold` relative to the previous best
//! 6. **Adjust** - pick the next mutation rate from the stagnation count:
//!    - below `growth_threshold`: the base rate
//!    - from `growth_threshold`: `base * repeats * growth_coeff`, at most `1.0`
//!    - from `reset_threshold`: replace the population with random genomes,
//!      reset the counter and the rate
//! 7. **Terminate** - `Converged` when the best error is at or below
//!    `error_threshold`, `Exhausted` once `max_generations` have run
//!
//! All randomness comes from a single [`Pcg32`] built from the run's [`Seed`],
//! so a seed and settings pair fully determines the run.

use genepi_engine::{Genome, Polynomial, Seed, TrainingSet};
use genepi_evaluator::{decoder, fitness::GenomeEvaluator};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    population::{self, Population},
    settings::{GaSettings, ReferencePolynomial, SettingsError},
};

/// Where a run stands after a generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStatus {
    #[display("evolving")]
    Evolving,
    #[display("converged")]
    Converged,
    #[display("exhausted")]
    Exhausted,
}

impl EvolutionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !self.is_evolving()
    }
}

/// Statistics of one completed generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// 1-based generation index.
    pub generation: usize,
    /// Status after this generation.
    pub status: EvolutionStatus,
    pub mean_error: f64,
    /// Error of the best genome of this generation.
    pub best_error: f64,
    pub worst_error: f64,
    pub median_error: f64,
    /// Population standard deviation of the errors.
    pub error_std_dev: f64,
    /// Lowest error seen so far in the run.
    pub champion_error: f64,
    /// Consecutive stagnant generations, before any reset.
    pub best_repeats: usize,
    /// Mutation rate applied to this generation's children.
    pub mutation_rate: f64,
    /// Whether the population was replaced at the end of this generation.
    pub population_reset: bool,
}

/// Receives a [`GenerationReport`] after every generation.
///
/// Implemented for closures taking `&GenerationReport`.
pub trait GenerationObserver {
    fn on_generation(&mut self, report: &GenerationReport);
}

impl<F> GenerationObserver for F
where
    F: FnMut(&GenerationReport),
{
    fn on_generation(&mut self, report: &GenerationReport) {
        self(report);
    }
}

/// Best genome seen during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Champion {
    pub genome: Genome,
    pub error: f64,
    /// Generation it was found in; `0` for the initial population.
    pub generation: usize,
}

/// Outcome of a run: the minimum-error member of the current population.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub status: EvolutionStatus,
    /// Generations completed.
    pub generations: usize,
    pub polynomial: Polynomial,
    pub error: f64,
    pub genome: Genome,
}

/// Genetic algorithm fitting a polynomial to samples of a reference polynomial.
///
/// # Example
///
/// ```
/// use genepi_engine::Seed;
/// use genepi_training::{
///     evolution::{Evolution, GenerationReport},
///     settings::{GaSettings, ReferencePolynomial},
/// };
///
/// let settings = GaSettings {
///     population_size: 20,
///     max_generations: 50,
///     reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 1.0, 0.0, 0.0]),
///     ..GaSettings::default()
/// };
/// let mut evolution = Evolution::new(settings, Seed::from_bytes([1; 16])).unwrap();
///
/// let mut best = Vec::new();
/// let result = evolution.run_with(&mut |report: &GenerationReport| {
///     best.push(report.best_error);
/// });
///
/// assert!(result.status.is_terminal());
/// assert_eq!(best.len(), result.generations);
/// ```
#[derive(Debug, Clone)]
pub struct Evolution {
    settings: GaSettings,
    seed: Seed,
    rng: Pcg32,
    reference: Polynomial,
    training_set: TrainingSet,
    population: Population,
    generation: usize,
    best_error: f64,
    best_repeats: usize,
    mutation_rate: f64,
    status: EvolutionStatus,
    champion: Champion,
}

impl Evolution {
    /// Validates `settings` and initializes a run.
    ///
    /// Draws, in order, the reference polynomial (when random), the training set
    /// and the initial population from the generator seeded with `seed`.
    pub fn new(settings: GaSettings, seed: Seed) -> Result<Self, SettingsError> {
        settings.validate()?;

        let mut rng = seed.rng();
        let reference = match &settings.reference {
            ReferencePolynomial::Random => {
                decoder::decode(&Genome::random(settings.genome_bits, &mut rng))
            }
            ReferencePolynomial::Explicit(coeffs) => Polynomial::new(coeffs.clone()),
        };
        let training_set = TrainingSet::generate(
            &reference,
            settings.training_data_size,
            settings.argmin..=settings.argmax,
            &mut rng,
        );
        let evaluator = GenomeEvaluator::new(&training_set);
        let population = Population::random(
            settings.population_size,
            settings.genome_bits,
            &evaluator,
            &mut rng,
        );

        let (best_genome, best_error) = population.best();
        let champion = Champion {
            genome: best_genome.clone(),
            error: best_error,
            generation: 0,
        };
        log::debug!("initial population best error: {best_error:.3}");

        Ok(Self {
            mutation_rate: settings.base_mutation_rate,
            settings,
            seed,
            rng,
            reference,
            training_set,
            population,
            generation: 1,
            best_error,
            best_repeats: 0,
            status: EvolutionStatus::Evolving,
            champion,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &GaSettings {
        &self.settings
    }

    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    #[must_use]
    pub fn reference(&self) -> &Polynomial {
        &self.reference
    }

    #[must_use]
    pub fn training_set(&self) -> &TrainingSet {
        &self.training_set
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Number of generations completed.
    #[must_use]
    pub fn generations(&self) -> usize {
        if self.status.is_terminal() {
            self.generation
        } else {
            self.generation - 1
        }
    }

    /// Best error of the current population as last recorded for stagnation tracking.
    #[must_use]
    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    #[must_use]
    pub fn best_repeats(&self) -> usize {
        self.best_repeats
    }

    /// Mutation rate the next generation will use.
    #[must_use]
    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    #[must_use]
    pub fn status(&self) -> EvolutionStatus {
        self.status
    }

    /// Best genome seen so far, surviving population resets.
    #[must_use]
    pub fn champion(&self) -> &Champion {
        &self.champion
    }

    /// Runs to a terminal state.
    pub fn run(&mut self) -> RunResult {
        self.run_with(&mut |_: &GenerationReport| {})
    }

    /// Runs to a terminal state, reporting every generation to `observer`.
    pub fn run_with<O>(&mut self, observer: &mut O) -> RunResult
    where
        O: GenerationObserver + ?Sized,
    {
        while self.status.is_evolving() {
            let report = self.step();
            observer.on_generation(&report);
        }
        let result = self.result();
        log::info!(
            "evolution {} after {} generations (error {:.3})",
            result.status,
            result.generations,
            result.error
        );
        result
    }

    /// Runs one generation.
    ///
    /// # Panics
    ///
    /// Panics if the run has already reached a terminal state.
    pub fn step(&mut self) -> GenerationReport {
        assert!(
            self.status.is_evolving(),
            "evolution already {}",
            self.status
        );

        let applied_rate = self.mutation_rate;
        let pool = self.population.reproduce(&mut self.rng);
        let mut children = population::crossover_pool(pool, &mut self.rng);
        for child in &mut children {
            child.mutate(applied_rate, &mut self.rng);
        }
        let evaluator = GenomeEvaluator::new(&self.training_set);
        self.population = Population::new(children, &evaluator);

        let stats = self.population.error_stats();
        self.track_best(stats.min);
        let repeats = self.best_repeats;

        let converged = stats.min <= self.settings.error_threshold;
        let population_reset = !converged && self.adjust_mutation_rate();

        self.status = if converged {
            EvolutionStatus::Converged
        } else if self.generation >= self.settings.max_generations {
            EvolutionStatus::Exhausted
        } else {
            EvolutionStatus::Evolving
        };

        let report = GenerationReport {
            generation: self.generation,
            status: self.status,
            mean_error: stats.mean,
            best_error: stats.min,
            worst_error: stats.max,
            median_error: stats.median,
            error_std_dev: stats.std_dev,
            champion_error: self.champion.error,
            best_repeats: repeats,
            mutation_rate: applied_rate,
            population_reset,
        };
        log::debug!(
            "generation {}: mean {:.3} (sd {:.3}), best {:.3}, repeats {}, rate {:.4}",
            report.generation,
            report.mean_error,
            report.error_std_dev,
            report.best_error,
            report.best_repeats,
            report.mutation_rate
        );

        if self.status.is_evolving() {
            self.generation += 1;
        }
        report
    }

    /// The minimum-error member of the current population.
    #[must_use]
    pub fn result(&self) -> RunResult {
        let (genome, error) = self.population.best();
        RunResult {
            status: self.status,
            generations: self.generations(),
            polynomial: decoder::decode(genome),
            error,
            genome: genome.clone(),
        }
    }

    fn track_best(&mut self, best_error: f64) {
        let delta = (best_error - self.best_error).abs();
        if delta < self.best_error * self.settings.small_progress_threshold {
            self.best_repeats += 1;
        }
        self.best_error = best_error;
        self.update_champion();
    }

    fn update_champion(&mut self) {
        let (genome, error) = self.population.best();
        if error < self.champion.error {
            self.champion = Champion {
                genome: genome.clone(),
                error,
                generation: self.generation,
            };
        }
    }

    /// Picks the mutation rate for the next generation; returns whether the
    /// population was replaced.
    fn adjust_mutation_rate(&mut self) -> bool {
        let base = self.settings.base_mutation_rate;
        if self.best_repeats < self.settings.growth_threshold {
            self.mutation_rate = base;
            return false;
        }
        if self.best_repeats >= self.settings.reset_threshold {
            log::info!(
                "resetting population (no change in best result after {} generations)",
                self.best_repeats
            );
            self.reset_population();
            return true;
        }
        #[expect(clippy::cast_precision_loss)]
        let repeats = self.best_repeats as f64;
        self.mutation_rate = (base * repeats * self.settings.growth_coeff).min(1.0);
        false
    }

    fn reset_population(&mut self) {
        let evaluator = GenomeEvaluator::new(&self.training_set);
        self.population = Population::random(
            self.settings.population_size,
            self.settings.genome_bits,
            &evaluator,
            &mut self.rng,
        );
        self.best_error = self.population.best().1;
        self.best_repeats = 0;
        self.mutation_rate = self.settings.base_mutation_rate;
        self.update_champion();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const SQUARE: [f64; 5] = [0.0, 0.0, 1.0, 0.0, 0.0];

    fn seed() -> Seed {
        Seed::from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88,
        ])
    }

    fn square_settings() -> GaSettings {
        GaSettings {
            population_size: 20,
            max_generations: 50,
            reference: ReferencePolynomial::Explicit(SQUARE.to_vec()),
            ..GaSettings::default()
        }
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = GaSettings {
            population_size: 7,
            ..square_settings()
        };
        assert!(matches!(
            Evolution::new(settings, seed()),
            Err(SettingsError::PopulationSize { size: 7 })
        ));
    }

    #[test]
    fn test_initial_state() {
        let evolution = Evolution::new(square_settings(), seed()).unwrap();
        assert_eq!(evolution.status(), EvolutionStatus::Evolving);
        assert_eq!(evolution.generations(), 0);
        assert_eq!(evolution.population().len(), 20);
        assert_eq!(evolution.training_set().len(), 50);
        assert_eq!(evolution.reference().coefficients(), &SQUARE);
        assert_eq!(evolution.mutation_rate(), 0.001);
        assert_eq!(evolution.best_error(), evolution.population().best().1);
        assert_eq!(evolution.champion().generation, 0);
        for p in evolution.training_set().iter() {
            assert!((-10.0..=10.0).contains(&p.x));
        }
    }

    #[test]
    fn test_random_reference_is_representable() {
        let settings = GaSettings {
            reference: ReferencePolynomial::Random,
            ..square_settings()
        };
        let evolution = Evolution::new(settings, seed()).unwrap();
        let reference = evolution.reference();
        assert_eq!(reference.coefficients().len(), 5);
        assert_eq!(*reference, reference.quantized());
    }

    #[test]
    fn test_square_run_terminates_with_monotone_champion() {
        let mut evolution = Evolution::new(square_settings(), seed()).unwrap();
        let mut reports = Vec::new();
        let result = evolution.run_with(&mut |report: &GenerationReport| {
            reports.push(report.clone());
        });

        assert!(result.status.is_terminal());
        assert!(result.generations <= 50);
        assert_eq!(reports.len(), result.generations);
        assert_eq!(reports.last().unwrap().status, result.status);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.generation, i + 1);
            assert!(report.best_error <= report.mean_error);
            assert!(report.mean_error <= report.worst_error);
            assert!(report.champion_error <= report.best_error);
            assert!(report.error_std_dev >= 0.0);
            assert!(report.error_std_dev.is_finite());
        }
        for pair in reports.windows(2) {
            assert!(pair[1].champion_error <= pair[0].champion_error);
        }
        match result.status {
            EvolutionStatus::Converged => assert!(result.error <= 0.01),
            EvolutionStatus::Exhausted => assert_eq!(result.generations, 50),
            EvolutionStatus::Evolving => unreachable!(),
        }
        assert_eq!(result.polynomial, decoder::decode(&result.genome));
        assert!(evolution.champion().error <= result.error);
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = Evolution::new(square_settings(), seed()).unwrap().run();
        let b = Evolution::new(square_settings(), seed()).unwrap().run();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generous_threshold_converges_immediately() {
        let settings = GaSettings {
            error_threshold: 1.0e9,
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();
        let result = evolution.run();
        assert_eq!(result.status, EvolutionStatus::Converged);
        assert_eq!(result.generations, 1);
    }

    #[test]
    fn test_unreachable_threshold_exhausts_budget() {
        // 2.1 x^2 cannot be encoded exactly
        let settings = GaSettings {
            max_generations: 5,
            error_threshold: 1.0e-12,
            reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 2.1, 0.0, 0.0]),
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();
        let result = evolution.run();
        assert_eq!(result.status, EvolutionStatus::Exhausted);
        assert_eq!(result.generations, 5);
        assert_eq!(evolution.generations(), 5);
    }

    #[test]
    #[should_panic(expected = "evolution already")]
    fn test_step_after_termination_panics() {
        let settings = GaSettings {
            max_generations: 1,
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();
        let _ = evolution.step();
        let _ = evolution.step();
    }

    #[test]
    fn test_stagnation_counts_small_relative_change() {
        let mut evolution = Evolution::new(square_settings(), seed()).unwrap();
        evolution.best_error = 100.0;
        // |100.5 - 100| < 100 * 0.01
        evolution.track_best(100.5);
        assert_eq!(evolution.best_repeats(), 1);
        // compared against the previous best, 100.5
        evolution.track_best(100.0);
        assert_eq!(evolution.best_repeats(), 2);
        evolution.track_best(95.0);
        assert_eq!(evolution.best_repeats(), 2);
        evolution.track_best(80.0);
        assert_eq!(evolution.best_repeats(), 2);
        assert_eq!(evolution.best_error(), 80.0);
    }

    #[test]
    fn test_stagnation_threshold_is_exclusive() {
        let settings = GaSettings {
            small_progress_threshold: 0.25,
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();
        evolution.best_error = 128.0;
        // delta == 128 * 0.25 exactly
        evolution.track_best(160.0);
        assert_eq!(evolution.best_repeats(), 0);
        evolution.track_best(130.0);
        assert_eq!(evolution.best_repeats(), 1);
    }

    #[test]
    fn test_mutation_rate_follows_stagnation() {
        let settings = GaSettings {
            base_mutation_rate: 0.01,
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();

        evolution.best_repeats = 24;
        assert!(!evolution.adjust_mutation_rate());
        assert_eq!(evolution.mutation_rate(), 0.01);

        evolution.best_repeats = 100;
        assert!(!evolution.adjust_mutation_rate());
        assert!((evolution.mutation_rate() - 0.01 * 100.0 * 0.5).abs() < 1e-12);

        evolution.best_repeats = 249;
        assert!(!evolution.adjust_mutation_rate());
        assert_eq!(evolution.mutation_rate(), 1.0);
    }

    #[test]
    fn test_stagnation_reset_replaces_population() {
        let mut evolution = Evolution::new(square_settings(), seed()).unwrap();
        evolution.step();
        let before = evolution
            .population()
            .genomes()
            .iter()
            .cloned()
            .collect::<HashSet<_>>();

        evolution.best_repeats = 250;
        evolution.mutation_rate = 0.5;
        assert!(evolution.adjust_mutation_rate());

        assert_eq!(evolution.best_repeats(), 0);
        assert_eq!(evolution.mutation_rate(), 0.001);
        assert_eq!(evolution.population().len(), 20);
        assert!(
            evolution
                .population()
                .genomes()
                .iter()
                .all(|g| !before.contains(g))
        );
        let fitness_sum = evolution.population().fitness().iter().sum::<f64>();
        assert!((fitness_sum - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_population_updates_champion() {
        let mut evolution = Evolution::new(square_settings(), seed()).unwrap();
        for _ in 0..50 {
            evolution.champion.error = f64::INFINITY;
            evolution.best_repeats = 250;
            assert!(evolution.adjust_mutation_rate());

            let (best_genome, best_error) = evolution.population().best();
            assert_eq!(evolution.champion().error, best_error);
            assert_eq!(evolution.champion().genome, *best_genome);
            assert_eq!(evolution.champion().generation, evolution.generation);
        }

        let champion_error = evolution.champion().error;
        for _ in 0..50 {
            evolution.best_repeats = 250;
            assert!(evolution.adjust_mutation_rate());
            assert!(evolution.champion().error <= evolution.population().best().1);
            assert!(evolution.champion().error <= champion_error);
        }
    }

    #[test]
    fn test_overflowing_domain_runs_without_panic() {
        // x^4 overflows to infinity over most of the domain
        let settings = GaSettings {
            max_generations: 3,
            argmin: -1.0e80,
            argmax: 1.0e80,
            reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 0.0, 0.0, 1.0]),
            ..square_settings()
        };
        assert_eq!(settings.validate(), Ok(()));

        let mut evolution = Evolution::new(settings, seed()).unwrap();
        assert!(evolution.population().errors().iter().all(|e| !e.is_nan()));
        let mut reports = Vec::new();
        let result = evolution.run_with(&mut |report: &GenerationReport| {
            reports.push(report.clone());
        });

        assert_eq!(result.status, EvolutionStatus::Exhausted);
        assert_eq!(reports.len(), 3);
        assert!(!result.error.is_nan());
        for fitness in evolution.population().fitness() {
            assert!(fitness.is_finite());
        }
        let fitness_sum = evolution.population().fitness().iter().sum::<f64>();
        assert!((fitness_sum - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_reported_in_generation() {
        let settings = GaSettings {
            growth_threshold: 0,
            reset_threshold: 1,
            small_progress_threshold: 1.0e9,
            error_threshold: 1.0e-12,
            reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 2.1, 0.0, 0.0]),
            ..square_settings()
        };
        let mut evolution = Evolution::new(settings, seed()).unwrap();
        let report = evolution.step();
        assert_eq!(report.best_repeats, 1);
        assert!(report.population_reset);
        assert_eq!(evolution.best_repeats(), 0);
    }
}
