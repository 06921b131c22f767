//! Evaluation of genomes as polynomial approximations.
//!
//! This crate turns a [`Genome`](genepi_engine::Genome) into a number the genetic
//! algorithm can select on, in two steps:
//!
//! 1. **Decoding** ([`decoder`]) - Reads the genome's 7-bit groups as signed
//!    fixed-point coefficients of a [`Polynomial`](genepi_engine::Polynomial)
//! 2. **Error** ([`fitness`]) - Measures the mean absolute deviation of that
//!    polynomial from the training samples
//!
//! ```text
//! Genome ──decode──▶ Polynomial ──mean |y - P(x)|──▶ error (lower is better)
//! ```
//!
//! Both steps are pure: the same genome and training set always produce the same
//! error. The inversion of errors into selection weights happens in the training
//! crate, which owns the population.

pub mod decoder;
pub mod fitness;
