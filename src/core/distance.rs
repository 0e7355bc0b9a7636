use crate::core::fingerprint::Fingerprint;

/// Number of bit positions in which `a` and `b` differ.
///
/// Both fingerprints must come from the same hasher configuration.
/// Comparing fingerprints of different bit-length is a bug in the caller
/// and panics instead of truncating or padding.
#[inline]
pub fn hamming(a: &Fingerprint, b: &Fingerprint) -> u32 {
    assert_eq!(
        a.bit_len(),
        b.bit_len(),
        "cannot compare fingerprints of different bit-length"
    );
    assert_eq!(
        a.as_bytes().len(),
        b.as_bytes().len(),
        "cannot compare fingerprints of different bit-length"
    );
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [u64; 6] = [
        0,
        u64::MAX,
        0x0F0F_0F0F_0F0F_0F0F,
        0x8000_0000_0000_0001,
        0xDEAD_BEEF_CAFE_F00D,
        0x0123_4567_89AB_CDEF,
    ];

    #[test]
    fn test_distance_to_self_is_zero() {
        for bits in SAMPLES {
            let fp = Fingerprint::from_u64(bits);
            assert_eq!(hamming(&fp, &fp), 0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        for a in SAMPLES {
            for b in SAMPLES {
                let (fa, fb) = (Fingerprint::from_u64(a), Fingerprint::from_u64(b));
                assert_eq!(hamming(&fa, &fb), hamming(&fb, &fa));
            }
        }
    }

    #[test]
    fn test_distance_counts_differing_bits() {
        let zero = Fingerprint::from_u64(0);
        assert_eq!(hamming(&zero, &Fingerprint::from_u64(u64::MAX)), 64);
        assert_eq!(hamming(&zero, &Fingerprint::from_u64(0b1011)), 3);
        assert_eq!(
            hamming(
                &Fingerprint::from_u64(0x8000_0000_0000_0001),
                &Fingerprint::from_u64(0x0000_0000_0000_0001)
            ),
            1
        );
    }

    #[test]
    fn test_nonzero_distance_for_distinct_fingerprints() {
        for a in SAMPLES {
            for b in SAMPLES {
                let d = hamming(&Fingerprint::from_u64(a), &Fingerprint::from_u64(b));
                assert_eq!(d == 0, a == b);
            }
        }
    }

    #[test]
    fn test_padding_bits_do_not_count() {
        let a = Fingerprint::with_bit_len(vec![0b1010_0000, 0b1000_0000], 9);
        let b = Fingerprint::with_bit_len(vec![0b0010_0000, 0b0000_0000], 9);
        assert_eq!(a.bit_len(), 9);
        assert_eq!(hamming(&a, &b), 2);
    }

    #[test]
    #[should_panic(expected = "different bit-length")]
    fn test_same_bytes_different_bit_length_panic() {
        let nine = Fingerprint::with_bit_len(vec![0u8; 2], 9);
        let sixteen = Fingerprint::from_bytes(vec![0u8; 2]);
        hamming(&nine, &sixteen);
    }

    #[test]
    #[should_panic(expected = "different bit-length")]
    fn test_mismatched_lengths_panic() {
        let short = Fingerprint::from_bytes(vec![0u8; 4]);
        let long = Fingerprint::from_u64(0);
        hamming(&short, &long);
    }
}
