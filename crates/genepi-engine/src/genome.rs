use std::fmt;

use arrayvec::ArrayVec;
use rand::Rng;

/// Largest genome supported, in bits.
pub const MAX_GENOME_BITS: usize = 256;

const MAX_GENOME_BYTES: usize = MAX_GENOME_BITS / 8;

/// Fixed-length bit string stored as a packed byte buffer.
///
/// # Bit Layout
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`, least-significant bit first.
/// The buffer holds `ceil(N / 8)` bytes; when `N` is not a multiple of 8 the high
/// bits of the last byte are padding. Padding is never read and always zero, so
/// equality and hashing only see the `N` real bits.
///
/// ```text
/// bit index:  7 6 5 4 3 2 1 0 | 15 14 13 12 11 10 9 8 | ...
///             ---- byte 0 ---- | ------- byte 1 ------- |
/// ```
///
/// The length is fixed at construction and never changes. Genomes are created
/// random ([`Self::random`]), from raw bytes ([`Self::from_bytes`]), or by
/// crossing over two parents ([`Self::crossover`]).
///
/// # Example
///
/// ```
/// use genepi_engine::Genome;
///
/// let mut genome = Genome::zeroed(35);
/// genome.flip(3);
/// assert!(genome.get(3));
/// assert_eq!(genome.bytes(), &[0b1000, 0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genome {
    bit_len: usize,
    bytes: ArrayVec<u8, MAX_GENOME_BYTES>,
}

impl Genome {
    /// Number of bytes needed to store `bit_len` bits.
    #[must_use]
    pub const fn byte_len_for(bit_len: usize) -> usize {
        bit_len.div_ceil(8)
    }

    /// Creates a genome with every bit cleared.
    ///
    /// # Panics
    ///
    /// Panics if `bit_len` is zero or exceeds [`MAX_GENOME_BITS`].
    #[must_use]
    pub fn zeroed(bit_len: usize) -> Self {
        assert_bit_len(bit_len);
        let bytes = (0..Self::byte_len_for(bit_len)).map(|_| 0).collect();
        Self { bit_len, bytes }
    }

    /// Creates a genome whose bits are independently and uniformly random.
    ///
    /// # Panics
    ///
    /// Panics if `bit_len` is zero or exceeds [`MAX_GENOME_BITS`].
    #[must_use]
    pub fn random<R>(bit_len: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut genome = Self::zeroed(bit_len);
        rng.fill(genome.bytes.as_mut_slice());
        genome.clear_padding();
        genome
    }

    /// Creates a genome from its packed representation.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len()` is not `ceil(bit_len / 8)`.
    #[must_use]
    pub fn from_bytes(bit_len: usize, bytes: &[u8]) -> Self {
        assert_bit_len(bit_len);
        assert_eq!(
            bytes.len(),
            Self::byte_len_for(bit_len),
            "byte buffer does not match a {bit_len}-bit genome"
        );
        let mut genome = Self {
            bit_len,
            bytes: bytes.iter().copied().collect(),
        };
        genome.clear_padding();
        genome
    }

    /// Number of bits in this genome.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Packed bytes, least-significant bit first.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the bit at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.bit_len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: usize) -> bool {
        self.assert_pos(pos);
        self.bytes[pos >> 3] & (1 << (pos & 0x7)) != 0
    }

    /// Sets the bit at `pos` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.bit_len()`.
    #[inline]
    pub fn set(&mut self, pos: usize, value: bool) {
        if self.get(pos) != value {
            self.flip(pos);
        }
    }

    /// Toggles the bit at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.bit_len()`.
    #[inline]
    pub fn flip(&mut self, pos: usize) {
        self.assert_pos(pos);
        self.bytes[pos >> 3] ^= 1 << (pos & 0x7);
    }

    /// Iterates over all bits from index 0 upwards.
    pub fn iter_bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_len).map(|pos| self.get(pos))
    }

    /// Flips each bit independently with probability `rate`.
    ///
    /// A rate of `0.0` leaves the genome untouched and a rate of `1.0` inverts
    /// every bit.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is outside `[0.0, 1.0]`.
    pub fn mutate<R>(&mut self, rate: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        assert!(
            (0.0..=1.0).contains(&rate),
            "mutation rate must be in [0, 1], got {rate}"
        );
        for pos in 0..self.bit_len {
            if rng.random_bool(rate) {
                self.flip(pos);
            }
        }
    }

    /// Single-point crossover at a point drawn uniformly from `1..=N`.
    ///
    /// See [`Self::crossover_at`] for how the child is assembled.
    #[must_use]
    pub fn crossover<R>(&self, other: &Self, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let point = rng.random_range(1..=self.bit_len);
        self.crossover_at(other, point)
    }

    /// Single-point crossover at `point`.
    ///
    /// The child takes bits `[0, point)` from `self` and bits `[point, N)` from
    /// `other`. Whole bytes below the split are copied from `self`, whole bytes
    /// above it from `other`, and the byte containing the split is spliced:
    ///
    /// ```text
    /// point = 11 (byte 1, offset 3)
    /// child byte 1 = (self[1] & 0b0000_0111) | (other[1] & 0b1111_1000)
    /// ```
    ///
    /// `point == N` yields a copy of `self`.
    ///
    /// # Panics
    ///
    /// Panics if the genomes differ in length or if `point` is not in `1..=N`.
    #[must_use]
    pub fn crossover_at(&self, other: &Self, point: usize) -> Self {
        assert_eq!(
            self.bit_len, other.bit_len,
            "crossover between genomes of different lengths"
        );
        assert!(
            (1..=self.bit_len).contains(&point),
            "crossover point {point} out of range 1..={}",
            self.bit_len
        );

        let split_byte = point >> 3;
        let split_offset = point & 0x7;
        let mut child = self.clone();

        let mut i = split_byte;
        if split_offset != 0 {
            let low_mask = low_bits_mask(split_offset);
            child.bytes[i] = (self.bytes[i] & low_mask) | (other.bytes[i] & !low_mask);
            i += 1;
        }
        child.bytes[i..].copy_from_slice(&other.bytes[i..]);
        child.clear_padding();
        child
    }

    fn clear_padding(&mut self) {
        let used = self.bit_len & 0x7;
        if used != 0
            && let Some(last) = self.bytes.last_mut()
        {
            *last &= low_bits_mask(used);
        }
    }

    fn assert_pos(&self, pos: usize) {
        assert!(
            pos < self.bit_len,
            "bit index {pos} out of range for a {}-bit genome",
            self.bit_len
        );
    }
}

/// Prints the bits in groups of seven, lowest index first: `|0110100|1000001|`.
impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, bit) in self.iter_bits().enumerate() {
            if pos % 7 == 0 {
                f.write_str("|")?;
            }
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str("|")
    }
}

fn assert_bit_len(bit_len: usize) {
    assert!(
        (1..=MAX_GENOME_BITS).contains(&bit_len),
        "genome length must be in 1..={MAX_GENOME_BITS}, got {bit_len}"
    );
}

// Keeps the lowest `count` bits of a byte, `count` in 1..8.
const fn low_bits_mask(count: usize) -> u8 {
    (1 << count) - 1
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(0x5eed)
    }

    fn all_ones(bit_len: usize) -> Genome {
        let mut genome = Genome::zeroed(bit_len);
        for pos in 0..bit_len {
            genome.flip(pos);
        }
        genome
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(Genome::byte_len_for(1), 1);
        assert_eq!(Genome::byte_len_for(8), 1);
        assert_eq!(Genome::byte_len_for(9), 2);
        assert_eq!(Genome::byte_len_for(35), 5);
        assert_eq!(Genome::zeroed(35).bytes().len(), 5);
    }

    #[test]
    fn test_bits_are_lsb_first() {
        let genome = Genome::from_bytes(16, &[0b0000_0101, 0b1000_0000]);
        let bits = genome.iter_bits().collect::<Vec<_>>();
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[2]);
        assert!(bits[15]);
        assert_eq!(bits.iter().filter(|b| **b).count(), 3);
    }

    #[test]
    fn test_flip_and_set() {
        let mut genome = Genome::zeroed(35);
        genome.flip(34);
        assert!(genome.get(34));
        genome.flip(34);
        assert!(!genome.get(34));

        genome.set(9, true);
        genome.set(9, true);
        assert!(genome.get(9));
        genome.set(9, false);
        assert_eq!(genome, Genome::zeroed(35));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        let genome = Genome::zeroed(35);
        let _ = genome.get(35);
    }

    #[test]
    fn test_random_is_deterministic_for_seed() {
        let a = Genome::random(35, &mut rng());
        let b = Genome::random(35, &mut rng());
        assert_eq!(a, b);
        assert_ne!(a, Genome::random(35, &mut Pcg32::seed_from_u64(1)));
    }

    #[test]
    fn test_mutate_rate_zero_is_identity() {
        let mut rng = rng();
        let original = Genome::random(35, &mut rng);
        let mut genome = original.clone();
        for _ in 0..100 {
            genome.mutate(0.0, &mut rng);
        }
        assert_eq!(genome, original);
    }

    #[test]
    fn test_mutate_rate_one_flips_every_bit() {
        let mut rng = rng();
        let original = Genome::random(35, &mut rng);
        let mut genome = original.clone();
        genome.mutate(1.0, &mut rng);
        for pos in 0..35 {
            assert_ne!(genome.get(pos), original.get(pos), "bit {pos} not flipped");
        }
    }

    #[test]
    fn test_mutate_flip_count_tracks_rate() {
        let mut rng = rng();
        let mut flips = 0;
        for _ in 0..1000 {
            let original = Genome::random(200, &mut rng);
            let mut genome = original.clone();
            genome.mutate(0.1, &mut rng);
            flips += std::iter::zip(genome.iter_bits(), original.iter_bits())
                .filter(|(a, b)| a != b)
                .count();
        }
        // expected 20_000
        assert!((18_000..22_000).contains(&flips), "flips = {flips}");
    }

    #[test]
    fn test_crossover_at_full_length_copies_left_parent() {
        let left = Genome::zeroed(35);
        let right = all_ones(35);
        let child = left.crossover_at(&right, 35);
        assert!(child.iter_bits().all(|b| !b));

        let left = Genome::zeroed(32);
        let right = all_ones(32);
        assert_eq!(left.crossover_at(&right, 32), left);
    }

    #[test]
    fn test_padding_is_ignored_by_equality() {
        let genome = Genome::from_bytes(12, &[0xff, 0xff]);
        assert_eq!(genome.bytes(), &[0xff, 0x0f]);
        assert_eq!(genome, all_ones(12));

        let left = Genome::zeroed(35);
        let right = Genome::from_bytes(35, &[0xff; 5]);
        assert_eq!(left.crossover_at(&right, 35), left);
        assert!(Genome::random(35, &mut rng()).bytes()[4] < 0b1000);
    }

    #[test]
    fn test_crossover_at_one_keeps_only_lowest_bit() {
        let left = Genome::zeroed(35);
        let right = all_ones(35);
        let child = left.crossover_at(&right, 1);
        assert!(!child.get(0));
        assert!((1..35).all(|pos| child.get(pos)));
    }

    #[test]
    fn test_crossover_is_bit_exact_for_every_point() {
        let mut rng = rng();
        for bit_len in [7, 8, 13, 16, 35, 64, 77] {
            for _ in 0..10 {
                let left = Genome::random(bit_len, &mut rng);
                let right = Genome::random(bit_len, &mut rng);
                for point in 1..=bit_len {
                    let child = left.crossover_at(&right, point);
                    for pos in 0..bit_len {
                        let expected = if pos < point {
                            left.get(pos)
                        } else {
                            right.get(pos)
                        };
                        assert_eq!(
                            child.get(pos),
                            expected,
                            "len={bit_len} point={point} pos={pos}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_crossover_splices_straddling_byte() {
        let left = Genome::from_bytes(16, &[0xaa, 0xaa]);
        let right = Genome::from_bytes(16, &[0x55, 0x55]);
        let child = left.crossover_at(&right, 11);
        assert_eq!(child.bytes(), &[0xaa, (0xaa & 0b111) | (0x55 & !0b111)]);
    }

    #[test]
    fn test_random_crossover_point_in_range() {
        let mut rng = rng();
        let left = Genome::zeroed(35);
        let right = all_ones(35);
        for _ in 0..500 {
            let child = left.crossover(&right, &mut rng);
            // never point 0, so bit 0 always comes from the left parent
            assert!(!child.get(0));
            let point = child.iter_bits().position(|b| b).unwrap_or(35);
            assert!((1..=35).contains(&point));
            assert!((point..35).all(|pos| child.get(pos)));
        }
    }

    #[test]
    #[should_panic(expected = "different lengths")]
    fn test_crossover_length_mismatch_panics() {
        let _ = Genome::zeroed(35).crossover_at(&Genome::zeroed(36), 3);
    }

    #[test]
    fn test_display_groups_by_seven() {
        let mut genome = Genome::zeroed(14);
        genome.flip(0);
        genome.flip(13);
        assert_eq!(genome.to_string(), "|1000000|0000001|");
    }
}
