use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Human-readable order number: `ORD-<unix millis>-<9 base36 chars>`.
pub fn generate() -> String {
    format_with(Utc::now().timestamp_millis(), &mut rand::thread_rng())
}

fn format_with<R: Rng + ?Sized>(millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn has_time_prefix_and_base36_suffix() {
        let number = format_with(1_700_000_000_000, &mut StdRng::seed_from_u64(7));
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn consecutive_numbers_differ() {
        assert_ne!(generate(), generate());
    }
}
