use super::{
    digit_char,
    options::{display, EncodingOptions},
    simple::{decode_digits, encode_digits},
    to_digits, BaseEncoding, DecodeError, EncodeError, EncodingKind, Options, OptionsError,
};
use crate::alphabet::{Alphabet, AlphabetSource};
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};
use std::{fmt, iter};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZeropadOptions {
    pub block_nbytes: usize,
    pub block_nchars: usize,
}

impl Default for ZeropadOptions {
    fn default() -> Self {
        Self {
            block_nbytes: 1,
            block_nchars: 1,
        }
    }
}

impl EncodingOptions for ZeropadOptions {
    const KIND: EncodingKind = EncodingKind::Zeropad;
    const NAMES: &'static [&'static str] = &["block_nbytes", "block_nchars"];

    fn defaults(&self) -> Self {
        Self::default()
    }
}

/// Upper limit on the bits held by a block, on either side.
pub const MAX_BLOCK_NBITS: usize = 1 << 16;

pub(crate) fn check_block_nbytes(base: usize, block_nbytes: usize) -> Result<usize, OptionsError> {
    check_sizes(base, block_nbytes, "bytes")?;
    match block_nbytes.checked_mul(8) {
        Some(nbits) if nbits <= MAX_BLOCK_NBITS => Ok(nbits),
        _ => Err(OptionsError::BlockSizeTooLarge {
            unit: "bytes",
            size: block_nbytes,
            max_nbits: MAX_BLOCK_NBITS,
        }),
    }
}

fn check_block_nchars(base: usize, block_nchars: usize) -> Result<u32, OptionsError> {
    check_sizes(base, block_nchars, "chars")?;
    // a char block may carry up to one byte more than the largest byte block
    if block_nchars as f64 * (base as f64).log2() >= (MAX_BLOCK_NBITS + 8) as f64 {
        return Err(OptionsError::BlockSizeTooLarge {
            unit: "chars",
            size: block_nchars,
            max_nbits: MAX_BLOCK_NBITS,
        });
    }
    Ok(block_nchars as u32)
}

/// Smallest `n` such that `base^n >= bound`, starting from a floating point estimate.
fn min_power(base: &BigUint, bound: &BigUint, estimate: f64) -> u32 {
    let mut n = (estimate.ceil() as u32).max(1);
    while base.pow(n) < *bound {
        n += 1;
    }
    while n > 1 && base.pow(n - 1) >= *bound {
        n -= 1;
    }
    n
}

/// Largest number of characters `n` such that the smallest `n`-digit value in `base`
/// still fits in `block_nbytes` bytes, i.e. `base^(n-1) < 256^block_nbytes`.
pub fn max_block_nchars(base: usize, block_nbytes: usize) -> Result<usize, OptionsError> {
    let nbits = check_block_nbytes(base, block_nbytes)?;
    let bound = BigUint::one() << nbits;
    let estimate = nbits as f64 / (base as f64).log2();
    Ok(min_power(&BigUint::from(base), &bound, estimate) as usize)
}

/// Largest number of bytes `m` such that `256^(m-1) < base^block_nchars`.
pub fn max_block_nbytes(base: usize, block_nchars: usize) -> Result<usize, OptionsError> {
    let exponent = check_block_nchars(base, block_nchars)?;
    let bound = BigUint::from(base).pow(exponent);
    let estimate = block_nchars as f64 * (base as f64).log2() / 8.0;
    Ok(min_power(&BigUint::from(256u32), &bound, estimate) as usize)
}

fn check_sizes(base: usize, size: usize, unit: &'static str) -> Result<(), OptionsError> {
    if base < 2 {
        return Err(OptionsError::InvalidBase { base });
    }
    if size == 0 {
        return Err(OptionsError::NonPositiveBlockSize { unit });
    }
    Ok(())
}

/// Fails unless each side of a `block_nbytes` ↔ `block_nchars` block can hold the other.
pub(crate) fn check_block_size(base: usize, block_nbytes: usize, block_nchars: usize) -> Result<(), OptionsError> {
    let max = max_block_nchars(base, block_nbytes)?;
    if block_nchars > max {
        return Err(OptionsError::TooManyBlockChars {
            base,
            block_nbytes,
            block_nchars,
            max,
        });
    }
    let max = max_block_nbytes(base, block_nchars)?;
    if block_nbytes > max {
        return Err(OptionsError::TooManyBlockBytes {
            base,
            block_nbytes,
            block_nchars,
            max,
        });
    }
    Ok(())
}

pub(crate) fn round_up(len: usize, block: usize) -> usize {
    (len + block - 1) / block * block
}

/// Simple encoding with leading zeros preserved: every leading block of `block_nbytes`
/// zero bytes becomes a block of `block_nchars` zero characters, and the rest is simple
/// encoded and left-padded to a multiple of `block_nchars`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ZeropadEncoding {
    alphabet: Alphabet,
    options: ZeropadOptions,
}

impl ZeropadEncoding {
    pub fn new(alphabet: Alphabet, options: ZeropadOptions) -> Result<Self, OptionsError> {
        check_block_size(alphabet.len(), options.block_nbytes, options.block_nchars)?;
        tracing::debug!(
            base = alphabet.len(),
            block_nbytes = options.block_nbytes,
            block_nchars = options.block_nchars,
            "built zeropad encoding"
        );
        Ok(Self { alphabet, options })
    }

    pub fn block_nbytes(&self) -> usize {
        self.options.block_nbytes
    }

    pub fn block_nchars(&self) -> usize {
        self.options.block_nchars
    }

    pub fn zeropad_options(&self) -> &ZeropadOptions {
        &self.options
    }

    pub fn with_alphabet(&self, source: impl Into<AlphabetSource>, case_sensitive: Option<bool>) -> Result<Self, OptionsError> {
        Self::new(source.into().into_alphabet(case_sensitive)?, self.options.clone())
    }

    pub fn with_options(&self, overrides: Options) -> Result<Self, OptionsError> {
        Self::new(self.alphabet.clone(), self.options.merge(overrides)?)
    }
}

impl BaseEncoding for ZeropadEncoding {
    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        let ZeropadOptions { block_nbytes, block_nchars } = self.options;
        let zeros = bytes.iter().take_while(|&&byte| byte == 0).count();
        let nonzero = &bytes[zeros..];
        let digits = encode_digits(nonzero, self.base());
        let num_zero_blocks = (round_up(bytes.len(), block_nbytes) - nonzero.len()) / block_nbytes;
        let padding = round_up(digits.len(), block_nchars) - digits.len();
        let mut output = String::with_capacity(num_zero_blocks * block_nchars + padding + digits.len());
        output.extend(iter::repeat(self.alphabet.zero_char()).take(num_zero_blocks * block_nchars + padding));
        for digit in digits {
            output.push(digit_char(&self.alphabet, digit)?);
        }
        Ok(output)
    }

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError> {
        let ZeropadOptions { block_nbytes, block_nchars } = self.options;
        let digits = to_digits(&self.alphabet, string)?;
        let zeros = digits.iter().take_while(|&&digit| digit == 0).count();
        let missing = round_up(digits.len(), block_nchars) - digits.len();
        let bytes = decode_digits(&digits[zeros..], self.base());
        let num_zero_blocks = (zeros + missing) / block_nchars;
        let padding = round_up(bytes.len(), block_nbytes) - bytes.len();
        let mut output = vec![0; num_zero_blocks * block_nbytes + padding];
        output.extend(bytes);
        Ok(output)
    }

    fn options(&self, skip_defaults: bool) -> Options {
        self.options.to_map(skip_defaults)
    }
}

impl fmt::Display for ZeropadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZeropadEncoding({}{})", self.alphabet, display(&self.options(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet;
    use serde_json::json;

    fn zeropad(alphabet: &Alphabet, block_nbytes: usize, block_nchars: usize) -> ZeropadEncoding {
        ZeropadEncoding::new(alphabet.clone(), ZeropadOptions { block_nbytes, block_nchars }).unwrap()
    }

    #[test]
    fn max_block_sizes() {
        assert_eq!(max_block_nchars(2, 1), Ok(8));
        assert_eq!(max_block_nchars(16, 1), Ok(2));
        assert_eq!(max_block_nchars(45, 2), Ok(3));
        assert_eq!(max_block_nchars(10, 4), Ok(10));
        assert_eq!(max_block_nchars(256, 3), Ok(3));
        assert_eq!(max_block_nbytes(2, 8), Ok(1));
        assert_eq!(max_block_nbytes(45, 3), Ok(3));
        assert_eq!(max_block_nbytes(10, 10), Ok(5));
        assert_eq!(max_block_nbytes(256, 3), Ok(3));
        assert_eq!(max_block_nchars(1, 1), Err(OptionsError::InvalidBase { base: 1 }));
        assert_eq!(max_block_nbytes(2, 0), Err(OptionsError::NonPositiveBlockSize { unit: "chars" }));
        assert_eq!(max_block_nchars(58, 100), Ok(137));
        assert_eq!(max_block_nbytes(58, 137), Ok(101));
    }

    #[test]
    fn oversized_blocks() {
        let too_large = |unit, size| OptionsError::BlockSizeTooLarge {
            unit,
            size,
            max_nbits: MAX_BLOCK_NBITS,
        };
        assert_eq!(max_block_nchars(2, usize::MAX / 4), Err(too_large("bytes", usize::MAX / 4)));
        assert_eq!(max_block_nbytes(256, (1 << 32) + 1), Err(too_large("chars", (1 << 32) + 1)));
        assert_eq!(max_block_nbytes(256, usize::MAX), Err(too_large("chars", usize::MAX)));
        assert_eq!(max_block_nchars(2, MAX_BLOCK_NBITS / 8), Ok(MAX_BLOCK_NBITS));
        assert_eq!(max_block_nbytes(2, MAX_BLOCK_NBITS), Ok(MAX_BLOCK_NBITS / 8));
        let options = ZeropadOptions {
            block_nbytes: usize::MAX / 4,
            block_nchars: 1,
        };
        assert_eq!(
            ZeropadEncoding::new(alphabet::base2().clone(), options),
            Err(too_large("bytes", usize::MAX / 4))
        );
    }

    #[test]
    fn leading_zeros() {
        let base58 = zeropad(alphabet::base58btc(), 1, 1);
        assert_eq!(base58.encode(b"\0yes mani !").unwrap(), "17paNL19xttacUY");
        assert_eq!(base58.encode(b"\0\0yes mani !").unwrap(), "117paNL19xttacUY");
        assert_eq!(base58.encode(b"\0\0hello world").unwrap(), "11StV1DL6CwTryKyV");
        assert_eq!(base58.encode(b"\0").unwrap(), "1");
        assert_eq!(base58.encode(b"").unwrap(), "");
        assert_eq!(base58.decode("117paNL19xttacUY").unwrap(), b"\0\0yes mani !");
        assert_eq!(base58.decode("1").unwrap(), b"\0");

        let base10 = zeropad(alphabet::base10(), 1, 1);
        assert_eq!(base10.encode(b"\0yes mani !").unwrap(), "0573277761329450583662625");
    }

    #[test]
    fn blocks() {
        let base16 = zeropad(alphabet::base16(), 1, 2);
        assert_eq!(base16.encode(b"\0yes mani !").unwrap(), "00796573206D616E692021");
        assert_eq!(base16.encode(&[0x0f]).unwrap(), "0F");
        assert_eq!(base16.decode("00796573206d616e692021").unwrap(), b"\0yes mani !");
        assert_eq!(base16.decode("0f").unwrap(), vec![0x0f]);
        assert_eq!(base16.decode("00F").unwrap(), vec![0x00, 0x0f]);

        let base2 = zeropad(alphabet::base2(), 1, 8);
        assert_eq!(base2.encode(&[0x00, 0x79]).unwrap(), "0000000001111001");
        assert_eq!(base2.decode("1111001").unwrap(), vec![0x79]);
        assert_eq!(base2.decode("0000000").unwrap(), vec![0x00]);

        let base10 = zeropad(alphabet::base10(), 4, 10);
        assert_eq!(base10.encode(&[0, 0, 0, 0, 0, 1]).unwrap(), "00000000000000000001");
        assert_eq!(base10.decode("00000000000000000001").unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(base10.canonical_bytes(&[0, 0, 0, 0, 0, 1]).unwrap(), vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn block_size_bounds() {
        assert_eq!(
            ZeropadEncoding::new(alphabet::base2().clone(), ZeropadOptions { block_nbytes: 1, block_nchars: 9 }),
            Err(OptionsError::TooManyBlockChars {
                base: 2,
                block_nbytes: 1,
                block_nchars: 9,
                max: 8
            })
        );
        assert_eq!(
            ZeropadEncoding::new(alphabet::base2().clone(), ZeropadOptions { block_nbytes: 2, block_nchars: 8 }),
            Err(OptionsError::TooManyBlockBytes {
                base: 2,
                block_nbytes: 2,
                block_nchars: 8,
                max: 1
            })
        );
        assert_eq!(
            ZeropadEncoding::new(alphabet::base2().clone(), ZeropadOptions { block_nbytes: 0, block_nchars: 8 }),
            Err(OptionsError::NonPositiveBlockSize { unit: "bytes" })
        );
    }

    #[test]
    fn options() {
        let base16 = zeropad(alphabet::base16(), 1, 2);
        assert_eq!(serde_json::Value::Object(base16.options(true)), json!({"block_nchars": 2}));
        assert_eq!(
            serde_json::Value::Object(base16.options(false)),
            json!({"block_nbytes": 1, "block_nchars": 2})
        );
        let options = json!({"block_nchars": 1});
        let changed = base16.with_options(options.as_object().unwrap().clone()).unwrap();
        assert_eq!(changed.block_nchars(), 1);
        let options = json!({"block_chars": 1});
        assert!(matches!(
            base16.with_options(options.as_object().unwrap().clone()),
            Err(OptionsError::UnknownOption { .. })
        ));
        assert_eq!(
            base16.to_string(),
            "ZeropadEncoding(StringAlphabet(\"0123456789ABCDEF\", case_sensitive=false), block_nchars=2)"
        );
    }
}
