//! National student identifier (NSI) generation.
//!
//! Format: `NSI` + two-digit year + 8 characters drawn from an alphabet
//! without the look-alikes `0 O 1 I`, e.g. `NSI25K7PX3QAM`.

use chrono::{Datelike, NaiveDate};
use rand::Rng;

pub const NSI_PREFIX: &str = "NSI";
pub const NSI_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const NSI_RANDOM_LEN: usize = 8;
/// Inserts retried on an NSI collision before giving up.
pub const NSI_MAX_ATTEMPTS: usize = 5;

pub fn generate_nsi<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> String {
    let mut nsi = String::with_capacity(NSI_PREFIX.len() + 2 + NSI_RANDOM_LEN);
    nsi.push_str(NSI_PREFIX);
    nsi.push_str(&format!("{:02}", today.year().rem_euclid(100)));
    for _ in 0..NSI_RANDOM_LEN {
        let idx = rng.gen_range(0..NSI_ALPHABET.len());
        nsi.push(NSI_ALPHABET[idx] as char);
    }
    nsi
}

/// Shape check used before hitting the database on public lookups.
pub fn is_valid_nsi(value: &str) -> bool {
    let Some(rest) = value.strip_prefix(NSI_PREFIX) else {
        return false;
    };
    let bytes = rest.as_bytes();
    bytes.len() == 2 + NSI_RANDOM_LEN
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2..].iter().all(|b| NSI_ALPHABET.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn test_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let nsi = generate_nsi(&mut rng, day());
        assert_eq!(nsi.len(), 13);
        assert!(nsi.starts_with("NSI25"));
        assert!(is_valid_nsi(&nsi));
    }

    #[test]
    fn test_no_ambiguous_characters() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let nsi = generate_nsi(&mut rng, day());
            assert!(!nsi[5..].contains(['0', 'O', '1', 'I']));
        }
    }

    #[test]
    fn test_values_rarely_collide() {
        let mut rng = StdRng::seed_from_u64(1);
        let values: HashSet<_> = (0..5_000).map(|_| generate_nsi(&mut rng, day())).collect();
        assert_eq!(values.len(), 5_000);
    }

    #[test]
    fn test_is_valid_nsi_rejects_bad_shapes() {
        assert!(!is_valid_nsi("NSI25ABC"));
        assert!(!is_valid_nsi("XYZ25ABCDEFGH"));
        assert!(!is_valid_nsi("NSI2XABCDEFGH"));
        assert!(!is_valid_nsi("NSI25ABCDEFG0"));
        assert!(is_valid_nsi("NSI25ABCDEFGH"));
    }
}
