//! Short identifier generation.
//!
//! Identifiers are drawn from a base58 alphabet (no `0`, `O`, `I`, `l`) so
//! they survive being read aloud or retyped. Two modes exist: `secure` draws
//! from an OS-seeded CSPRNG, `fast` from a cheaper non-cryptographic RNG.

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Base58 alphabet without the visually ambiguous `0`, `O`, `I`, `l`.
pub const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Shortest identifier length the service will generate or accept as config.
pub const MIN_LENGTH: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ShortIdError {
    #[error("short id length must be at least {MIN_LENGTH}, got {0}")]
    TooShort(usize),
}

enum Generator {
    Secure(Mutex<StdRng>),
    Fast(Mutex<SmallRng>),
}

/// Generates random short identifiers of a fixed length.
pub struct ShortIdGenerator {
    length: usize,
    rng: Generator,
}

impl ShortIdGenerator {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns [`ShortIdError::TooShort`] when `length < 6`.
    pub fn new(length: usize, secure: bool) -> Result<Self, ShortIdError> {
        if length < MIN_LENGTH {
            return Err(ShortIdError::TooShort(length));
        }

        let rng = if secure {
            Generator::Secure(Mutex::new(StdRng::from_os_rng()))
        } else {
            Generator::Fast(Mutex::new(SmallRng::from_os_rng()))
        };

        Ok(Self { length, rng })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Draws a fresh identifier. Uniqueness is the database's job; the
    /// caller retries on a unique-constraint collision.
    pub fn generate(&self) -> String {
        match &self.rng {
            Generator::Secure(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                sample(&mut *rng, self.length)
            }
            Generator::Fast(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                sample(&mut *rng, self.length)
            }
        }
    }

    /// Probability of at least one collision among `count` generated ids,
    /// by the birthday bound: `1 - exp(-n(n-1) / (2 * 58^len))`.
    pub fn collision_probability(&self, count: u64) -> f64 {
        collision_probability(self.length, count)
    }
}

fn sample<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Closed-form birthday bound for `count` draws from a space of
/// `58^length` identifiers.
pub fn collision_probability(length: usize, count: u64) -> f64 {
    let n = count as f64;
    let space = (ALPHABET.len() as f64).powi(length as i32);
    1.0 - (-n * (n - 1.0) / (2.0 * space)).exp()
}
