use rand::{seq::SliceRandom, Rng};
use crate::error::{ReclaimError, Result};

/// Length of the anti-forgery key expected by QRS
pub const XRF_KEY_LEN: usize = 16;

const XRF_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Anti-forgery key sent both as `X-Qlik-XrfKey` header and `xrfkey` query parameter.
///
/// The two values must match on every request or QRS rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrfKey(String);

impl XrfKey {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Sample 16 distinct characters from `[A-Za-z0-9]`
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let key = XRF_ALPHABET
            .choose_multiple(rng, XRF_KEY_LEN)
            .map(|&b| b as char)
            .collect();
        Self(key)
    }

    /// Use a caller-supplied key, e.g. one pinned in configuration
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() != XRF_KEY_LEN || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ReclaimError::Config(format!(
                "xrfkey must be {} alphanumeric characters",
                XRF_KEY_LEN
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for XrfKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
