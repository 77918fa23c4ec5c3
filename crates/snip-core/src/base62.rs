use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The base62 alphabet used for generated short codes, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Returns `true` if every character of `s` belongs to [`ALPHABET`].
pub fn is_base62(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A short code encoded as a fixed-width base62 string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShortCodeBase62(String);

impl ShortCodeBase62 {
    /// Encodes `value` as exactly `len` base62 digits.
    ///
    /// The result is `value mod 62^len`, most significant digit first and
    /// left-padded with `'0'`. Feeding uniformly random values yields
    /// uniformly distributed codes up to a negligible bias.
    ///
    /// # Examples
    ///
    /// ```
    /// use snip_core::ShortCodeBase62;
    ///
    /// assert_eq!(ShortCodeBase62::encode(62, 6).as_str(), "000010");
    /// ```
    pub fn encode(value: u64, len: usize) -> Self {
        let mut digits = vec![ALPHABET[0]; len];
        let mut rest = value;
        for slot in digits.iter_mut().rev() {
            *slot = ALPHABET[(rest % 62) as usize];
            rest /= 62;
        }
        Self(digits.into_iter().map(char::from).collect())
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number of digits in the code.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a zero-width code.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ShortCodeBase62 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCodeBase62").field(&self.0).finish()
    }
}

impl Display for ShortCodeBase62 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCodeBase62 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCodeBase62 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if !is_base62(&s) {
            return Err(serde::de::Error::custom(format!(
                "not a base62 short code: '{s}'"
            )));
        }
        Ok(Self(s))
    }
}
