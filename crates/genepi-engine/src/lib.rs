//! Core data model for fitting polynomials with a genetic algorithm.
//!
//! This crate holds the value types every other crate in the workspace builds on:
//!
//! - [`Genome`] - Fixed-length packed bit string with mutation and single-point crossover
//! - [`Polynomial`] - Coefficient vector evaluated with Horner's method
//! - [`DataPoint`] / [`TrainingSet`] - Samples of a reference polynomial to fit against
//! - [`Seed`] - 128-bit seed for the [`rand_pcg::Pcg32`] generator shared by a run
//!
//! Nothing here keeps hidden random state: every randomized operation takes the
//! generator as an argument, so callers decide which stream it consumes from.
//!
//! # Example
//!
//! ```
//! use genepi_engine::{Genome, Polynomial, Seed, TrainingSet};
//!
//! let mut rng = Seed::from_bytes([7; 16]).rng();
//!
//! let reference = Polynomial::new(vec![0.0, 0.0, 1.0, 0.0, 0.0]);
//! let data = TrainingSet::generate(&reference, 50, -10.0..=10.0, &mut rng);
//!
//! let mother = Genome::random(35, &mut rng);
//! let father = Genome::random(35, &mut rng);
//! let mut child = mother.crossover(&father, &mut rng);
//! child.mutate(0.01, &mut rng);
//! # let _ = data;
//! ```

pub use self::{genome::*, polynomial::*, seed::*, training_set::*};

mod genome;
mod polynomial;
mod seed;
mod training_set;
