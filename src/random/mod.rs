//! Randomness core shared by all resources.
//!
//! Secure values are drawn from the operating system RNG through
//! [`CheckedRng`], so a source failure surfaces as a [`RandomError`]
//! instead of a panic. Sampling itself is `rand`'s. Seeded resources (`random_integer`,
//! `random_shuffle`) use a [`StdRng`] derived from the seed string.

use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod hash;
pub mod ip;
pub mod pet;
pub mod string;

/// Errors raised by the random generation routines.
#[derive(Debug, Error)]
pub enum RandomError {
    /// The underlying random source failed.
    #[error("random source failed: {0}")]
    Source(#[from] rand::Error),

    /// A character class with no characters was asked to supply some.
    #[error("{class} character set is empty but {needed} characters were requested")]
    EmptyCharacterSet {
        /// Name of the character class.
        class: &'static str,
        /// Number of characters requested from it.
        needed: usize,
    },

    /// The per-class minimums add up to more than the requested length.
    #[error("sum of minimum character counts ({minimums}) exceeds length ({length})")]
    MinimumsExceedLength {
        /// Sum of all `min_*` values.
        minimums: usize,
        /// Requested length.
        length: usize,
    },

    /// An integer range whose lower bound is above its upper bound.
    #[error("minimum value {min} needs to be smaller than or equal to maximum value {max}")]
    InvalidRange {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// A CIDR range that could not be parsed or does not match the family.
    #[error("invalid CIDR range {range:?}: {reason}")]
    InvalidCidr {
        /// The offending input.
        range: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A source that records its first failure instead of panicking.
///
/// `rand`'s samplers call the infallible [`RngCore::fill_bytes`]. This
/// wrapper routes those calls through `try_fill_bytes`, keeps the first
/// error, and hands out zeros afterwards. [`with_secure_rng`] turns a
/// recorded failure into [`RandomError::Source`].
#[derive(Debug)]
pub struct CheckedRng<R> {
    inner: R,
    failure: Option<rand::Error>,
}

/// The operating system RNG behind every unseeded value.
pub type SecureRng = CheckedRng<OsRng>;

impl<R: RngCore> CheckedRng<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    /// The first failure seen, if any.
    pub fn finish(self) -> Result<(), RandomError> {
        match self.failure {
            Some(err) => Err(RandomError::Source(err)),
            None => Ok(()),
        }
    }
}

impl<R: RngCore> RngCore for CheckedRng<R> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.failure.is_none() {
            match self.inner.try_fill_bytes(dest) {
                Ok(()) => return,
                Err(err) => self.failure = Some(err),
            }
        }
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl<R: CryptoRng> CryptoRng for CheckedRng<R> {}

/// Run `f` against the secure source.
///
/// A source failure wins over whatever `f` returned, since values drawn
/// after the failure are not random.
pub fn with_secure_rng<T>(
    f: impl FnOnce(&mut SecureRng) -> Result<T, RandomError>,
) -> Result<T, RandomError> {
    let mut rng = CheckedRng::new(OsRng);
    let out = f(&mut rng);
    rng.finish()?;
    out
}

/// `len` bytes from the secure source.
pub fn secure_bytes(len: usize) -> Result<Vec<u8>, RandomError> {
    let mut bytes = vec![0u8; len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// A uniform integer in the inclusive range `[min, max]`.
pub fn random_in_range<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
) -> Result<i64, RandomError> {
    if max < min {
        return Err(RandomError::InvalidRange { min, max });
    }
    Ok(rng.gen_range(min..=max))
}

/// An RNG for seeded resources.
///
/// A non-empty seed gives a deterministic generator keyed by the SHA-256
/// digest of the seed; otherwise the generator is seeded from the secure
/// source.
pub fn seeded_rng(seed: Option<&str>) -> Result<StdRng, RandomError> {
    match seed.filter(|s| !s.is_empty()) {
        Some(seed) => {
            let digest = Sha256::digest(seed.as_bytes());
            let mut key = [0u8; 32];
            key.copy_from_slice(&digest);
            Ok(StdRng::from_seed(key))
        },
        None => Ok(StdRng::from_rng(OsRng)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A source that always fails.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("entropy unavailable")))
        }
    }

    #[test]
    fn test_secure_bytes_length() {
        assert_eq!(secure_bytes(0).unwrap().len(), 0);
        assert_eq!(secure_bytes(32).unwrap().len(), 32);
    }

    #[test]
    fn test_checked_rng_records_failure() {
        let mut rng = CheckedRng::new(BrokenRng);
        let v = random_in_range(&mut rng, 1, 100).unwrap();
        assert!((1..=100).contains(&v));
        let err = rng.finish().unwrap_err();
        assert!(matches!(err, RandomError::Source(_)));
    }

    #[test]
    fn test_checked_rng_passes_through() {
        let mut rng = CheckedRng::new(seeded_rng(Some("through")).unwrap());
        let _: u64 = rng.gen();
        assert!(rng.finish().is_ok());
    }

    #[test]
    fn test_with_secure_rng() {
        let v = with_secure_rng(|rng| random_in_range(rng, -3, 3)).unwrap();
        assert!((-3..=3).contains(&v));
    }

    #[test]
    fn test_random_in_range_bounds() {
        let mut rng = seeded_rng(Some("range")).unwrap();
        for _ in 0..500 {
            let v = random_in_range(&mut rng, -3, 3).unwrap();
            assert!((-3..=3).contains(&v));
        }
        assert_eq!(random_in_range(&mut rng, 5, 5).unwrap(), 5);
        // Full range must not overflow.
        random_in_range(&mut rng, i64::MIN, i64::MAX).unwrap();
    }

    #[test]
    fn test_random_in_range_rejects_inverted() {
        let mut rng = seeded_rng(None).unwrap();
        let err = random_in_range(&mut rng, 10, 1).unwrap_err();
        assert!(matches!(err, RandomError::InvalidRange { min: 10, max: 1 }));
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let draw = |seed| -> Vec<u32> {
            let mut rng = seeded_rng(Some(seed)).unwrap();
            (0..8).map(|_| rng.gen()).collect()
        };
        assert_eq!(draw("hemmer"), draw("hemmer"));
        assert_ne!(draw("hemmer"), draw("other"));
    }

    #[test]
    fn test_empty_seed_uses_secure_source() {
        let a: [u8; 32] = seeded_rng(Some("")).unwrap().gen();
        let b: [u8; 32] = seeded_rng(None).unwrap().gen();
        assert_ne!(a, b);
    }
}
