use super::Error;
use std::{env, str::FromStr};

/// Seed and length bounds for random test data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Configuration {
    seed: u64,
    min_bytes: usize,
    max_bytes: usize,
    min_chars: usize,
    max_chars: usize,
}

fn var_map<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| Error::InvalidVar {
            key: key.to_owned(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            seed: 0,
            min_bytes: 0,
            max_bytes: 16,
            min_chars: 0,
            max_chars: 16,
        }
    }
}

impl Configuration {
    pub fn new(seed: u64, min_bytes: usize, max_bytes: usize, min_chars: usize, max_chars: usize) -> Result<Self, Error> {
        if min_bytes > max_bytes {
            return Err(Error::InvalidBounds {
                unit: "bytes",
                min: min_bytes,
                max: max_bytes,
            });
        }
        if min_chars > max_chars {
            return Err(Error::InvalidBounds {
                unit: "chars",
                min: min_chars,
                max: max_chars,
            });
        }
        Ok(Self {
            seed,
            min_bytes,
            max_bytes,
            min_chars,
            max_chars,
        })
    }

    /// Defaults overridden by `BASES_RANDOM_SEED`, `BASES_RANDOM_MIN_BYTES`, `BASES_RANDOM_MAX_BYTES`,
    /// `BASES_RANDOM_MIN_CHARS` and `BASES_RANDOM_MAX_CHARS` when set.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();
        let seed = var_map("BASES_RANDOM_SEED", defaults.seed)?;
        let min_bytes = var_map("BASES_RANDOM_MIN_BYTES", defaults.min_bytes)?;
        let max_bytes = var_map("BASES_RANDOM_MAX_BYTES", defaults.max_bytes)?;
        let min_chars = var_map("BASES_RANDOM_MIN_CHARS", defaults.min_chars)?;
        let max_chars = var_map("BASES_RANDOM_MAX_CHARS", defaults.max_chars)?;
        Self::new(seed, min_bytes, max_bytes, min_chars, max_chars)
    }

    pub fn with_seed(&self, seed: u64) -> Self {
        Self { seed, ..self.clone() }
    }

    pub fn with_bytes(&self, min_bytes: usize, max_bytes: usize) -> Result<Self, Error> {
        Self::new(self.seed, min_bytes, max_bytes, self.min_chars, self.max_chars)
    }

    pub fn with_chars(&self, min_chars: usize, max_chars: usize) -> Result<Self, Error> {
        Self::new(self.seed, self.min_bytes, self.max_bytes, min_chars, max_chars)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn min_bytes(&self) -> usize {
        self.min_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}
