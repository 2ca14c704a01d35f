//! Deterministic random bytestrings and strings, valid for a given encoding.

mod configuration;

pub use configuration::Configuration;

use crate::{
    alphabet::Alphabet,
    encoding::{BaseEncoding, BlockEncoding, EncodeError, Encoding, FixcharEncoding},
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::iter;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("Minimum number of {unit} ({min}) is larger than maximum ({max})")]
    InvalidBounds { unit: &'static str, min: usize, max: usize },
    #[error("Invalid {key} {value}")]
    InvalidVar { key: String, value: String },
    #[error("No valid number of {unit} between {min} and {max}")]
    NoValidLength { unit: &'static str, min: usize, max: usize },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

pub struct RandomData {
    rng: StdRng,
    configuration: Configuration,
}

impl Default for RandomData {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl RandomData {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            rng: StdRng::seed_from_u64(configuration.seed()),
            configuration,
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(Configuration::from_env()?))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Restarts the generator from `seed`, keeping the length bounds.
    pub fn reseed(&mut self, seed: u64) {
        tracing::debug!(seed, "reseeded random data");
        self.configuration = self.configuration.with_seed(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn choose_len(&mut self, unit: &'static str, min: usize, max: usize, valid: impl Fn(usize) -> bool) -> Result<usize, Error> {
        let lengths: Vec<usize> = (min..=max).filter(|&len| valid(len)).collect();
        lengths.choose(&mut self.rng).copied().ok_or(Error::NoValidLength { unit, min, max })
    }

    fn fill(&mut self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0; len];
        self.rng.fill(bytes.as_mut_slice());
        bytes
    }

    fn fill_nonzero(&mut self, len: usize) -> Vec<u8> {
        let mut bytes = self.fill(len);
        if let Some(first) = bytes.first_mut() {
            *first = self.rng.gen_range(1..=255);
        }
        bytes
    }

    /// Uniformly random bytes, with a length uniformly drawn from `min_bytes..=max_bytes`.
    pub fn rand_raw_bytes(&mut self, min_bytes: usize, max_bytes: usize) -> Vec<u8> {
        let len = self.rng.gen_range(min_bytes..=max_bytes.max(min_bytes));
        self.fill(len)
    }

    /// Random bytes that `encoding` accepts: no leading zero byte for simple encodings,
    /// a random run of leading zero bytes for zeropad, an allowed last block for block.
    pub fn rand_bytes(&mut self, encoding: &Encoding) -> Result<Vec<u8>, Error> {
        let (min, max) = (self.configuration.min_bytes(), self.configuration.max_bytes());
        Ok(match encoding {
            Encoding::Simple(_) => {
                let len = self.rng.gen_range(min..=max);
                self.fill_nonzero(len)
            }
            Encoding::Zeropad(_) => {
                let len = self.rng.gen_range(min..=max);
                let zeros = self.rng.gen_range(0..=len);
                let mut bytes = vec![0; zeros];
                bytes.extend(self.fill_nonzero(len - zeros));
                bytes
            }
            Encoding::Block(block) => {
                let len = self.choose_len("bytes", min, max, |len| {
                    let last = len % block.block_nbytes();
                    last == 0 || block.nbytes_to_nchars().contains_key(&last)
                })?;
                self.fill(len)
            }
            Encoding::Fixchar(_) => self.rand_raw_bytes(min, max),
        })
    }

    pub fn rand_char(&mut self, alphabet: &Alphabet, non_zero: bool) -> char {
        let digit = self.rng.gen_range(usize::from(non_zero)..alphabet.len());
        alphabet.digit_to_char(digit).unwrap_or_else(|_| alphabet.zero_char())
    }

    fn rand_chars(&mut self, alphabet: &Alphabet, len: usize) -> String {
        (0..len).map(|_| self.rand_char(alphabet, false)).collect()
    }

    /// Random characters of `alphabet`, with a length drawn from `min_chars..=max_chars`.
    pub fn rand_alphabet_str(&mut self, alphabet: &Alphabet) -> String {
        let len = self.rng.gen_range(self.configuration.min_chars()..=self.configuration.max_chars());
        self.rand_chars(alphabet, len)
    }

    /// Random string that `encoding` decodes without error.
    pub fn rand_str(&mut self, encoding: &Encoding) -> Result<String, Error> {
        let (min, max) = (self.configuration.min_chars(), self.configuration.max_chars());
        let alphabet = encoding.alphabet();
        match encoding {
            Encoding::Simple(_) => {
                let len = self.rng.gen_range(min..=max);
                if len == 0 {
                    return Ok(String::new());
                }
                let first = self.rand_char(alphabet, true);
                Ok(iter::once(first).chain(self.rand_chars(alphabet, len - 1).chars()).collect())
            }
            Encoding::Zeropad(_) => {
                let len = self.rng.gen_range(min..=max);
                let zeros = self.rng.gen_range(0..=len);
                let mut string: String = iter::repeat(alphabet.zero_char()).take(zeros).collect();
                if len > zeros {
                    string.push(self.rand_char(alphabet, true));
                    string.push_str(&self.rand_chars(alphabet, len - zeros - 1));
                }
                Ok(string)
            }
            Encoding::Block(block) => self.rand_block_str(block, min, max),
            Encoding::Fixchar(fixchar) => self.rand_fixchar_str(fixchar, min, max),
        }
    }

    /// Encodes random bytes of the right length, so that each char block decodes.
    fn rand_block_str(&mut self, block: &BlockEncoding, min: usize, max: usize) -> Result<String, Error> {
        let block_nchars = block.block_nchars();
        let len = self.choose_len("chars", min, max, |len| {
            let last = len % block_nchars;
            last == 0 || block.nchars_to_nbytes().contains_key(&last)
        })?;
        let last_nbytes = block.nchars_to_nbytes().get(&(len % block_nchars)).copied().unwrap_or_default();
        let bytes = self.fill(len / block_nchars * block.block_nbytes() + last_nbytes);
        Ok(block.encode(&bytes)?)
    }

    /// Random characters with the pad bits of the last one set to zero.
    fn rand_fixchar_str(&mut self, fixchar: &FixcharEncoding, min: usize, max: usize) -> Result<String, Error> {
        let char_nbits = fixchar.char_nbits() as usize;
        let len = self.choose_len("chars", min, max, |len| (len * char_nbits) % 8 < char_nbits)?;
        let alphabet = fixchar.alphabet();
        let extra_nbits = (len * char_nbits) % 8;
        let mut string = if extra_nbits == 0 {
            self.rand_chars(alphabet, len)
        } else {
            let mut string = self.rand_chars(alphabet, len - 1);
            // the shifted digit must stay below the base when it is not a power of two
            let bound = (1u128 << (char_nbits - extra_nbits)).min((alphabet.len() as u128 + (1 << extra_nbits) - 1) >> extra_nbits);
            let digit = self.rng.gen_range(0..bound) << extra_nbits;
            string.push(alphabet.digit_to_char(digit as usize).unwrap_or_else(|_| alphabet.zero_char()));
            string
        };
        if fixchar.include_padding() {
            string = fixchar.pad_string(&string);
        }
        Ok(string)
    }
}
