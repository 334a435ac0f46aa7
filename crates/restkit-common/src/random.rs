//! Random token generation.

use rand::Rng;

/// Alphanumeric alphabet used by default.
pub const RANDOM_CHARACTER_SET: &str =
    "1234567890abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Decimal digits.
pub const RANDOM_DIGIT_SET: &str = "1234567890";

/// `length` characters drawn uniformly from `allowed`. An empty alphabet
/// yields an empty string.
#[must_use]
pub fn random_string(length: usize, allowed: &str) -> String {
    let alphabet: Vec<char> = allowed.chars().collect();
    if alphabet.is_empty() {
        return String::new();
    }
    let mut rng = rand::rng();
    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())])
        .collect()
}

/// `length` decimal digits; leading zeros are allowed.
#[must_use]
pub fn random_digit(length: usize) -> String {
    random_string(length, RANDOM_DIGIT_SET)
}
