use crate::base62::ShortCodeBase62;
use crate::error::ShortenerError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// A short code identifying a shortened URL.
///
/// Two codes compare equal when their string forms are equal, regardless of
/// whether they were generated or chosen by a user.
#[derive(Clone, Debug)]
pub enum ShortCode {
    /// A system-generated base62 code.
    Generated(ShortCodeBase62),
    /// A user-provided custom alias, or a code read back from storage.
    Custom(String),
}

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 32;

/// Names that collide with gateway routes and can never be aliases.
pub const RESERVED_ALIASES: &[&str] = &["api", "static", "favicon.ico", "health", "shorten"];

impl ShortCode {
    /// Creates a `ShortCode` from a generated base62 value.
    pub fn generated(code: impl Into<ShortCodeBase62>) -> Self {
        Self::Generated(code.into())
    }

    /// Creates a new `ShortCode` after validating its format.
    ///
    /// Valid codes are 1-32 characters and contain only `[a-zA-Z0-9_-]`.
    /// Use this to parse codes arriving on a lookup path.
    pub fn new(code: impl Into<String>) -> std::result::Result<Self, ShortenerError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self::Custom(code))
    }

    /// Creates a user-chosen alias.
    ///
    /// Applies the format rules of [`ShortCode::new`] and additionally
    /// rejects [`RESERVED_ALIASES`].
    pub fn custom_alias(alias: impl Into<String>) -> std::result::Result<Self, ShortenerError> {
        let alias = alias.into();
        if RESERVED_ALIASES.contains(&alias.as_str()) {
            return Err(ShortenerError::InvalidShortCode(format!(
                "'{alias}' is reserved"
            )));
        }
        Self::new(alias)
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. values previously written to the store).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self::Custom(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ShortCode::Generated(code) => code.as_str(),
            ShortCode::Custom(s) => s.as_str(),
        }
    }

    fn validate(code: &str) -> std::result::Result<(), ShortenerError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(ShortenerError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShortenerError::InvalidShortCode(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl PartialEq for ShortCode {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ShortCode {}

impl Hash for ShortCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ShortCodeBase62> for ShortCode {
    fn from(value: ShortCodeBase62) -> Self {
        Self::Generated(value)
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new_unchecked(s))
    }
}
