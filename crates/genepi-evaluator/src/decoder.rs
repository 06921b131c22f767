//! Genome to polynomial decoding.
//!
//! A genome is read as consecutive 7-bit groups, one per coefficient, starting at
//! bit 0. Within a group:
//!
//! ```text
//! bit:     0      1   2   3   4    5     6
//!        sign     8   4   2   1   0.5   0.25
//! ```
//!
//! The magnitude is the sum of the weights of the set bits (0.0 to 15.75 in steps
//! of 0.25), negated when the sign bit is set. Group `i` gives the coefficient of
//! `x^i`. Trailing bits that do not fill a whole group are ignored.

use genepi_engine::{Genome, Polynomial};

/// Bits consumed by one coefficient.
pub const BITS_PER_COEFFICIENT: usize = 7;

const MAGNITUDE_WEIGHTS: [f64; BITS_PER_COEFFICIENT - 1] = [8.0, 4.0, 2.0, 1.0, 0.5, 0.25];

/// Number of coefficients a `bit_len`-bit genome decodes to.
#[must_use]
pub const fn coefficient_count(bit_len: usize) -> usize {
    bit_len / BITS_PER_COEFFICIENT
}

/// Decodes a genome into the polynomial it represents.
///
/// Decoding is total: every bit pattern yields a polynomial with
/// [`coefficient_count`] coefficients.
///
/// # Panics
///
/// Panics if the genome is shorter than one coefficient group.
///
/// # Example
///
/// ```
/// use genepi_engine::Genome;
/// use genepi_evaluator::decoder;
///
/// // group 0: sign=1, magnitude bits 8 and 0.25 -> -8.25
/// let genome = Genome::from_bytes(7, &[0b100_0011]);
/// assert_eq!(decoder::decode(&genome).coefficients(), &[-8.25]);
/// ```
#[must_use]
pub fn decode(genome: &Genome) -> Polynomial {
    let count = coefficient_count(genome.bit_len());
    let coefficients = (0..count)
        .map(|i| decode_coefficient(genome, i * BITS_PER_COEFFICIENT))
        .collect();
    Polynomial::new(coefficients)
}

fn decode_coefficient(genome: &Genome, base: usize) -> f64 {
    let magnitude = MAGNITUDE_WEIGHTS
        .iter()
        .enumerate()
        .filter(|(offset, _)| genome.get(base + 1 + offset))
        .map(|(_, weight)| weight)
        .sum::<f64>();
    if genome.get(base) {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn genome_from_groups(groups: &[&str]) -> Genome {
        let bits = groups.concat();
        let mut genome = Genome::zeroed(bits.len());
        for (pos, ch) in bits.chars().enumerate() {
            genome.set(pos, ch == '1');
        }
        genome
    }

    #[test]
    fn test_coefficient_count() {
        assert_eq!(coefficient_count(7), 1);
        assert_eq!(coefficient_count(13), 1);
        assert_eq!(coefficient_count(35), 5);
        assert_eq!(coefficient_count(40), 5);
    }

    #[test]
    fn test_decode_each_weight() {
        let genome = genome_from_groups(&[
            "0100000", "0010000", "0001000", "0000100", "0000010", "0000001",
        ]);
        assert_eq!(
            decode(&genome).coefficients(),
            &[8.0, 4.0, 2.0, 1.0, 0.5, 0.25]
        );
    }

    #[test]
    fn test_decode_extremes_and_sign() {
        let genome = genome_from_groups(&["0111111", "1111111", "1000000", "0000000", "0010001"]);
        let poly = decode(&genome);
        assert_eq!(poly.order(), 4);
        assert_eq!(poly.coefficients()[0], 15.75);
        assert_eq!(poly.coefficients()[1], -15.75);
        // negative zero
        assert_eq!(poly.coefficients()[2], 0.0);
        assert_eq!(poly.coefficients()[3], 0.0);
        assert_eq!(poly.coefficients()[4], 4.25);
    }

    #[test]
    fn test_decode_ignores_trailing_bits() {
        let mut genome = genome_from_groups(&["0000100", "111"]);
        assert_eq!(decode(&genome).coefficients(), &[1.0]);
        genome.flip(8);
        assert_eq!(decode(&genome).coefficients(), &[1.0]);
    }

    #[test]
    fn test_decode_is_deterministic_and_on_grid() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let genome = Genome::random(35, &mut rng);
            let poly = decode(&genome);
            assert_eq!(poly, decode(&genome.clone()));
            assert_eq!(poly.coefficients().len(), 5);
            for c in poly.coefficients() {
                assert!(c.abs() <= 15.75);
                assert_eq!((c * 4.0).fract(), 0.0);
            }
            assert_eq!(poly, poly.quantized());
        }
    }
}
