// src/share/refcode.rs
//! Cosmetic reference code stamped on share output. Not a lookup key
//! anywhere, so a plain thread-local RNG is fine.

use rand::Rng;

const CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LEN: usize = 8;

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..LEN)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_eight_uppercase_alphanumerics() {
        for _ in 0..200 {
            let code = generate();
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn codes_are_regenerated_per_call() {
        // 36^8 codes; 20 draws colliding entirely would mean a broken RNG.
        let codes: std::collections::HashSet<String> = (0..20).map(|_| generate()).collect();
        assert!(codes.len() > 1);
    }
}
