use super::{digit_char, to_digits, BaseEncoding, DecodeError, EncodeError, Error, Options, OptionsError};
use crate::alphabet::{Alphabet, AlphabetSource};
use std::fmt;

/// Plain positional base conversion: bytes are a big-endian integer, written in base
/// `alphabet.len()` with no leading zeros on either side.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SimpleEncoding {
    alphabet: Alphabet,
}

impl SimpleEncoding {
    pub fn new(alphabet: Alphabet) -> Self {
        tracing::debug!(base = alphabet.len(), "built simple encoding");
        Self { alphabet }
    }

    pub fn with_alphabet(&self, source: impl Into<AlphabetSource>, case_sensitive: Option<bool>) -> Result<Self, OptionsError> {
        Ok(Self::new(source.into().into_alphabet(case_sensitive)?))
    }
}

/// Digits of the big-endian integer `input` in base `base`, most significant first.
/// Leading zero bytes contribute nothing, so the result has no leading zero digits.
pub(crate) fn encode_digits(input: &[u8], base: usize) -> Vec<usize> {
    // log(256) / log(2) = 8, so a base-2 output is never more than 8x the input
    let mut output: Vec<usize> = Vec::with_capacity(input.len() * 8);
    for &value in input {
        let mut carry = value as usize;
        for digit in output.iter_mut() {
            carry += *digit << 8;
            *digit = carry % base;
            carry /= base;
        }
        while carry > 0 {
            output.push(carry % base);
            carry /= base;
        }
    }
    output.reverse();
    output
}

/// Inverse of [`encode_digits`]: the minimal big-endian bytes of the integer with the given digits.
pub(crate) fn decode_digits(digits: &[usize], base: usize) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::with_capacity(digits.len());
    for &digit in digits {
        let mut carry = digit;
        for value in output.iter_mut() {
            carry += (*value as usize) * base;
            *value = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            output.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    output.reverse();
    output
}

impl BaseEncoding for SimpleEncoding {
    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        if bytes.first() == Some(&0) {
            return Err(EncodeError::LeadingZeroByte);
        }
        encode_digits(bytes, self.base()).into_iter().map(|digit| digit_char(&self.alphabet, digit)).collect()
    }

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError> {
        let digits = to_digits(&self.alphabet, string)?;
        if digits.first() == Some(&0) {
            return Err(DecodeError::LeadingZeroCharacter);
        }
        Ok(decode_digits(&digits, self.base()))
    }

    fn canonical_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        if bytes.first() == Some(&0) {
            return Err(EncodeError::LeadingZeroByte.into());
        }
        Ok(bytes.to_vec())
    }

    /// Validates the string and rewrites each character in the case the alphabet was built with.
    fn canonical_string(&self, string: &str) -> Result<String, Error> {
        let digits = to_digits(&self.alphabet, string)?;
        if digits.first() == Some(&0) {
            return Err(DecodeError::LeadingZeroCharacter.into());
        }
        Ok(digits.into_iter().map(|digit| digit_char(&self.alphabet, digit)).collect::<Result<String, EncodeError>>()?)
    }

    fn options(&self, _skip_defaults: bool) -> Options {
        Options::new()
    }
}

impl fmt::Display for SimpleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleEncoding({})", self.alphabet)
    }
}
