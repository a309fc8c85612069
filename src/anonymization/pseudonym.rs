//! Random pseudonym generation
//!
//! Pseudonyms are random lowercase ASCII strings of the same length as the
//! original, so fixed-width reports keep their column layout. IPv4
//! addresses get a random address with the same digit count per octet.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Attempts before a colliding candidate is accepted anyway
const MAX_ATTEMPTS: usize = 16;

/// Random source for pseudonyms
///
/// Uses `StdRng` so the generator is `Send + Sync`; a fixed seed makes a
/// whole run reproducible.
pub struct PseudonymGenerator {
    rng: StdRng,
}

impl PseudonymGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Random name of `len` characters
    pub fn random_name(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Name of the same character length as `original`, retried while
    /// `taken` reports a collision
    ///
    /// Short originals have few possible pseudonyms, so after
    /// `MAX_ATTEMPTS` the last candidate is used even if it collides.
    pub fn fresh_name<F>(&mut self, original: &str, taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        let len = original.chars().count();
        let mut candidate = self.random_name(len);
        for _ in 1..MAX_ATTEMPTS {
            if candidate != original && !taken(&candidate) {
                break;
            }
            candidate = self.random_name(len);
        }
        candidate
    }

    /// Random dotted quad whose octets have the same digit counts as
    /// `original`'s
    pub fn fresh_ipv4<F>(&mut self, original: &str, taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        let widths: Vec<usize> = original.split('.').map(str::len).collect();
        let mut candidate = self.random_ipv4(&widths);
        for _ in 1..MAX_ATTEMPTS {
            if candidate != original && !taken(&candidate) {
                break;
            }
            candidate = self.random_ipv4(&widths);
        }
        candidate
    }

    fn random_ipv4(&mut self, widths: &[usize]) -> String {
        widths
            .iter()
            .map(|w| {
                let octet: u16 = match w {
                    1 => self.rng.gen_range(0..=9),
                    2 => self.rng.gen_range(10..=99),
                    _ => self.rng.gen_range(100..=255),
                };
                octet.to_string()
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for PseudonymGenerator {
    fn default() -> Self {
        Self::new()
    }
}
