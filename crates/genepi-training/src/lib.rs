//! Genetic algorithm that evolves bit-string genomes into a polynomial fit.
//!
//! # How Training Works
//!
//! 1. **Reference** - Pick the polynomial to recover (explicit, or decoded from a random genome)
//! 2. **Training data** - Sample it at random points of `[argmin, argmax]`
//! 3. **Population** - Create random genomes and score them by mean absolute error
//! 4. **Evolve** - Reproduce, cross over, mutate and re-score once per generation
//! 5. **Stop** - On convergence below the error threshold, or when the budget runs out
//!
//! # Architecture
//!
//! ```text
//! GaSettings (settings)
//!     ↓ validated by
//! Evolution (evolution)
//!     ↓ owns
//! Population (population) ── scored by ──▶ GenomeEvaluator (genepi-evaluator)
//!     ↓ reports
//! GenerationReport ──▶ GenerationObserver
//! ```
//!
//! # Adaptive Mutation
//!
//! The mutation rate stays at its base value while the best error keeps
//! improving. Once it stalls for `growth_threshold` generations the rate grows
//! linearly with the stall length, and after `reset_threshold` generations the
//! whole population is replaced with fresh random genomes. The best genome seen
//! before a reset is still available through [`evolution::Evolution::champion`].
//!
//! # Example
//!
//! ```
//! use genepi_engine::Seed;
//! use genepi_training::{
//!     evolution::Evolution,
//!     settings::{GaSettings, ReferencePolynomial},
//! };
//!
//! let settings = GaSettings {
//!     population_size: 20,
//!     max_generations: 30,
//!     reference: ReferencePolynomial::Explicit(vec![0.0, 0.0, 1.0, 0.0, 0.0]),
//!     ..GaSettings::default()
//! };
//! let mut evolution = Evolution::new(settings, Seed::from_bytes([3; 16]))?;
//! let result = evolution.run();
//!
//! assert!(result.status.is_terminal());
//! assert_eq!(result.polynomial.coefficients().len(), 5);
//! # Ok::<(), genepi_training::settings::SettingsError>(())
//! ```

pub mod evolution;
pub mod population;
pub mod settings;
