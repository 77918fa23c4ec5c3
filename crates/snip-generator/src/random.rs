use crate::error::GeneratorError;
use crate::Generator;
use rand::RngCore;
use snip_core::ShortCodeBase62;
use typed_builder::TypedBuilder;

pub const MIN_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 8;
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Configures a [`RandomGenerator`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct RandomGeneratorSettings {
    /// Number of base62 digits per code, in `[6, 8]`.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub length: usize,
}

/// Draws short codes from the thread-local CSPRNG.
///
/// Each code is 8 random bytes read as a big-endian `u64` and rendered as a
/// fixed number of base62 digits, so codes carry no information about
/// creation order.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(settings: RandomGeneratorSettings) -> Result<Self, GeneratorError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&settings.length) {
            return Err(GeneratorError::InvalidLength {
                length: settings.length,
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
            });
        }

        Ok(Self {
            length: settings.length,
        })
    }

    /// The number of digits in every generated code.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCodeBase62;

    fn generate(&self) -> Self::Output {
        let mut bytes = [0u8; 8];
        rand::rng().fill_bytes(&mut bytes);
        ShortCodeBase62::encode(u64::from_be_bytes(bytes), self.length)
    }
}
