//! Statistical helpers for summarizing training progress.
//!
//! - [`descriptive`]: min, max, mean, median and standard deviation of a sample
//!
//! # Example
//!
//! ```
//! use genepi_stats::descriptive::DescriptiveStats;
//!
//! let errors = [0.5, 2.0, 1.0];
//! let stats = DescriptiveStats::new(errors).unwrap();
//! assert_eq!(stats.min, 0.5);
//! assert_eq!(stats.median, 1.0);
//! ```

pub mod descriptive;
