//! Constrained random string generation for `random_string` and
//! `random_password`.
//!
//! Each character class can be switched on or off and can demand a minimum
//! number of characters. Minimums are honoured even for disabled classes.
//! After the mandatory characters and the fill are drawn, the whole result
//! is shuffled so the mandatory characters do not cluster at the front.

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};

use super::{with_secure_rng, RandomError};

/// Digits.
pub const NUMERIC_CHARS: &str = "0123456789";
/// Lowercase ASCII letters.
pub const LOWER_CHARS: &str = "abcdefghijklmnopqrstuvwxyz";
/// Uppercase ASCII letters.
pub const UPPER_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Special characters used unless `override_special` is set.
pub const DEFAULT_SPECIAL_CHARS: &str = "!@#$%&*()-_=+[]{}<>:?";

/// Inputs to [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringParams {
    /// Total number of characters.
    pub length: usize,
    /// Include uppercase letters in the pool.
    pub upper: bool,
    /// Minimum number of uppercase letters.
    pub min_upper: usize,
    /// Include lowercase letters in the pool.
    pub lower: bool,
    /// Minimum number of lowercase letters.
    pub min_lower: usize,
    /// Include digits in the pool.
    pub numeric: bool,
    /// Minimum number of digits.
    pub min_numeric: usize,
    /// Include special characters in the pool.
    pub special: bool,
    /// Minimum number of special characters.
    pub min_special: usize,
    /// Replaces the default special characters when non-empty.
    pub override_special: Option<String>,
}

impl Default for StringParams {
    fn default() -> Self {
        Self {
            length: 0,
            upper: true,
            min_upper: 0,
            lower: true,
            min_lower: 0,
            numeric: true,
            min_numeric: 0,
            special: true,
            min_special: 0,
            override_special: None,
        }
    }
}

impl StringParams {
    /// Parameters for a string of `length` characters with every class enabled.
    pub fn with_length(length: usize) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// The special characters in effect.
    pub fn special_chars(&self) -> &str {
        match self.override_special.as_deref() {
            Some(chars) if !chars.is_empty() => chars,
            _ => DEFAULT_SPECIAL_CHARS,
        }
    }

    fn minimums(&self) -> usize {
        self.min_upper
            .saturating_add(self.min_lower)
            .saturating_add(self.min_numeric)
            .saturating_add(self.min_special)
    }
}

/// Generate a string from the secure source.
pub fn generate(params: &StringParams) -> Result<String, RandomError> {
    with_secure_rng(|rng| generate_with(rng, params))
}

/// Generate a string from the given cryptographically secure source.
pub fn generate_with<R: Rng + CryptoRng + ?Sized>(
    rng: &mut R,
    params: &StringParams,
) -> Result<String, RandomError> {
    let minimums = params.minimums();
    if minimums > params.length {
        return Err(RandomError::MinimumsExceedLength {
            minimums,
            length: params.length,
        });
    }

    let upper: Vec<char> = UPPER_CHARS.chars().collect();
    let lower: Vec<char> = LOWER_CHARS.chars().collect();
    let numeric: Vec<char> = NUMERIC_CHARS.chars().collect();
    let special: Vec<char> = params.special_chars().chars().collect();

    let mut pool = Vec::new();
    if params.upper {
        pool.extend_from_slice(&upper);
    }
    if params.lower {
        pool.extend_from_slice(&lower);
    }
    if params.numeric {
        pool.extend_from_slice(&numeric);
    }
    if params.special {
        pool.extend_from_slice(&special);
    }

    let mut result = Vec::with_capacity(params.length);
    let mandatory = [
        ("numeric", &numeric, params.min_numeric),
        ("lower", &lower, params.min_lower),
        ("upper", &upper, params.min_upper),
        ("special", &special, params.min_special),
    ];
    for (class, chars, count) in mandatory {
        sample_into(rng, class, chars, count, &mut result)?;
    }
    sample_into(rng, "combined", &pool, params.length - minimums, &mut result)?;

    result.shuffle(rng);
    Ok(result.into_iter().collect())
}

fn sample_into<R: Rng + ?Sized>(
    rng: &mut R,
    class: &'static str,
    chars: &[char],
    count: usize,
    out: &mut Vec<char>,
) -> Result<(), RandomError> {
    if count == 0 {
        return Ok(());
    }
    if chars.is_empty() {
        return Err(RandomError::EmptyCharacterSet {
            class,
            needed: count,
        });
    }
    out.extend((0..count).map(|_| chars[rng.gen_range(0..chars.len())]));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_in(s: &str, set: &str) -> usize {
        s.chars().filter(|c| set.contains(*c)).count()
    }

    #[test]
    fn test_default_params_length() {
        let s = generate(&StringParams::with_length(32)).unwrap();
        assert_eq!(s.chars().count(), 32);
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(generate(&StringParams::with_length(0)).unwrap(), "");
    }

    #[test]
    fn test_only_enabled_classes_used() {
        let params = StringParams {
            length: 200,
            upper: false,
            numeric: false,
            special: false,
            ..StringParams::default()
        };
        let s = generate(&params).unwrap();
        assert_eq!(count_in(&s, LOWER_CHARS), 200);
    }

    #[test]
    fn test_minimums_are_met() {
        let params = StringParams {
            length: 12,
            min_upper: 3,
            min_lower: 3,
            min_numeric: 3,
            min_special: 3,
            ..StringParams::default()
        };
        for _ in 0..50 {
            let s = generate(&params).unwrap();
            assert!(count_in(&s, UPPER_CHARS) >= 3);
            assert!(count_in(&s, LOWER_CHARS) >= 3);
            assert!(count_in(&s, NUMERIC_CHARS) >= 3);
            assert!(count_in(&s, DEFAULT_SPECIAL_CHARS) >= 3);
        }
    }

    #[test]
    fn test_minimum_honoured_for_disabled_class() {
        let params = StringParams {
            length: 10,
            special: false,
            min_special: 2,
            upper: false,
            lower: false,
            ..StringParams::default()
        };
        let s = generate(&params).unwrap();
        assert_eq!(count_in(&s, DEFAULT_SPECIAL_CHARS), 2);
        assert_eq!(count_in(&s, NUMERIC_CHARS), 8);
    }

    #[test]
    fn test_override_special() {
        let params = StringParams {
            length: 64,
            upper: false,
            lower: false,
            numeric: false,
            override_special: Some("_%@".to_string()),
            ..StringParams::default()
        };
        let s = generate(&params).unwrap();
        assert!(s.chars().all(|c| "_%@".contains(c)), "{s:?}");
    }

    #[test]
    fn test_empty_override_falls_back_to_default() {
        let params = StringParams {
            override_special: Some(String::new()),
            ..StringParams::default()
        };
        assert_eq!(params.special_chars(), DEFAULT_SPECIAL_CHARS);
    }

    #[test]
    fn test_multibyte_override_special() {
        let params = StringParams {
            length: 16,
            upper: false,
            lower: false,
            numeric: false,
            override_special: Some("åß∂".to_string()),
            ..StringParams::default()
        };
        let s = generate(&params).unwrap();
        assert_eq!(s.chars().count(), 16);
        assert!(s.chars().all(|c| "åß∂".contains(c)));
    }

    #[test]
    fn test_minimums_exceed_length() {
        let params = StringParams {
            length: 2,
            min_upper: 2,
            min_lower: 1,
            ..StringParams::default()
        };
        let err = generate(&params).unwrap_err();
        assert!(matches!(
            err,
            RandomError::MinimumsExceedLength {
                minimums: 3,
                length: 2
            }
        ));
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let params = StringParams {
            length: 4,
            upper: false,
            lower: false,
            numeric: false,
            special: false,
            ..StringParams::default()
        };
        let err = generate(&params).unwrap_err();
        assert!(matches!(
            err,
            RandomError::EmptyCharacterSet {
                class: "combined",
                needed: 4
            }
        ));
    }

    #[test]
    fn test_mandatory_characters_are_shuffled() {
        // With 4 mandatory digits in a 40-char string, digits must not always lead.
        let params = StringParams {
            length: 40,
            numeric: false,
            min_numeric: 4,
            ..StringParams::default()
        };
        let leading_digits = (0..20)
            .map(|_| generate(&params).unwrap())
            .filter(|s| s.chars().take(4).all(|c| c.is_ascii_digit()))
            .count();
        assert!(leading_digits < 20);
    }
}
