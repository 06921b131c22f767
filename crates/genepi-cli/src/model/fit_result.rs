use chrono::{DateTime, Utc};
use genepi_engine::Seed;
use genepi_training::evolution::{EvolutionStatus, RunResult};
use serde::{Deserialize, Serialize};

/// Outcome of a `run`, as written to the result JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FitResult {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Replays the run when passed back through `--seed`.
    pub seed: Seed,
    pub status: EvolutionStatus,
    pub generations: usize,
    pub error: f64,
    /// Fitted coefficients, `x^0` first.
    pub coefficients: Vec<f64>,
    /// Winning genome bits, in 7-bit groups.
    pub genome: String,
}

impl FitResult {
    pub fn new(name: String, seed: Seed, result: &RunResult) -> Self {
        Self {
            name,
            trained_at: Utc::now(),
            seed,
            status: result.status,
            generations: result.generations,
            error: result.error,
            coefficients: result.polynomial.coefficients().to_vec(),
            genome: result.genome.to_string(),
        }
    }
}
