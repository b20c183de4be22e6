//! Short, human-typable room codes.
//!
//! Codes are drawn from an alphabet without `0`/`O` and `1`/`I`. The
//! generator promises nothing about uniqueness; callers retry until the
//! registry reports the code as free.

use rand::prelude::*;

/// Characters a room code may contain.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a random room code of `length` characters.
pub fn generate(length: usize) -> String {
    generate_with_rng(&mut rand::rng(), length)
}

/// Generate a room code using a specific RNG (for testing/seeding).
pub fn generate_with_rng<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .filter_map(|_| ALPHABET.choose(rng).copied())
        .map(char::from)
        .collect()
}

/// Uppercase and trim a user-typed room code.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_requested_length() {
        for len in [4, 6, 8] {
            assert_eq!(generate(len).len(), len);
        }
    }

    #[test]
    fn codes_avoid_ambiguous_characters() {
        for _ in 0..200 {
            let code = generate(6);
            for c in code.chars() {
                assert!(!matches!(c, '0' | 'O' | '1' | 'I'), "ambiguous char in {code}");
                assert!(c.is_ascii_uppercase() || c.is_ascii_digit());
            }
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        use rand::SeedableRng;

        let mut rng1 = rand::rngs::StdRng::seed_from_u64(7);
        let mut rng2 = rand::rngs::StdRng::seed_from_u64(7);
        assert_eq!(generate_with_rng(&mut rng1, 6), generate_with_rng(&mut rng2, 6));
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  abc23x "), "ABC23X");
    }
}
