use super::{
    options::{display, EncodingOptions},
    to_digits, BaseEncoding, DecodeError, EncodeError, EncodingKind, Error, Options, OptionsError,
};
use crate::alphabet::{case_variants, Alphabet, AlphabetSource};
use serde::{Deserialize, Serialize};
use std::{fmt, iter};

/// Digits are packed into a `u128` accumulator together with at most 8 spare bits.
pub const MAX_CHAR_NBITS: u32 = 64;

/// Bits per character: `auto` is the least number of bits covering the alphabet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CharNbitsRepr", into = "CharNbitsRepr")]
pub enum CharNbits {
    #[default]
    Auto,
    Fixed(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CharNbitsRepr {
    Fixed(u32),
    Named(String),
}

impl From<CharNbits> for CharNbitsRepr {
    fn from(char_nbits: CharNbits) -> Self {
        match char_nbits {
            CharNbits::Auto => Self::Named("auto".to_owned()),
            CharNbits::Fixed(nbits) => Self::Fixed(nbits),
        }
    }
}

impl TryFrom<CharNbitsRepr> for CharNbits {
    type Error = String;

    fn try_from(repr: CharNbitsRepr) -> Result<Self, Self::Error> {
        match repr {
            CharNbitsRepr::Fixed(nbits) => Ok(Self::Fixed(nbits)),
            CharNbitsRepr::Named(name) if name == "auto" => Ok(Self::Auto),
            CharNbitsRepr::Named(name) => Err(format!("char_nbits must be 'auto' or a positive integer, found {:?}", name)),
        }
    }
}

/// How padding is handled: `ignore` neither adds nor checks it, `include` adds it when
/// encoding and tolerates any amount when decoding, `require` also checks the exact amount.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    #[default]
    Ignore,
    Include,
    Require,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixcharOptions {
    pub char_nbits: CharNbits,
    pub pad_char: Option<char>,
    pub padding: Padding,
}

impl EncodingOptions for FixcharOptions {
    const KIND: EncodingKind = EncodingKind::Fixchar;
    const NAMES: &'static [&'static str] = &["char_nbits", "pad_char", "padding"];

    fn defaults(&self) -> Self {
        Self::default()
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Fixed-bits-per-character encoding, as in base32 and base64: the bits of the input are
/// split into groups of `char_nbits`, the last one zero-filled, with optional padding up
/// to a whole number of blocks.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FixcharEncoding {
    alphabet: Alphabet,
    options: FixcharOptions,
    char_nbits: u32,
}

impl FixcharEncoding {
    pub fn new(alphabet: Alphabet, options: FixcharOptions) -> Result<Self, OptionsError> {
        let base = alphabet.len();
        let char_nbits = match options.char_nbits {
            CharNbits::Auto => usize::BITS - (base - 1).leading_zeros(),
            CharNbits::Fixed(nbits) => nbits,
        };
        if char_nbits == 0 || char_nbits > MAX_CHAR_NBITS {
            return Err(OptionsError::InvalidCharNbits {
                char_nbits,
                max: MAX_CHAR_NBITS,
            });
        }
        if char_nbits < usize::BITS && (1usize << char_nbits) < base {
            return Err(OptionsError::InsufficientCharNbits { char_nbits, base });
        }
        match options.pad_char {
            None if options.padding != Padding::Ignore => return Err(OptionsError::MissingPadChar),
            Some(character) if alphabet.contains(character) => return Err(OptionsError::PadCharInAlphabet { character }),
            _ => {}
        }
        tracing::debug!(base, char_nbits, padding = ?options.padding, "built fixchar encoding");
        Ok(Self {
            alphabet,
            options,
            char_nbits,
        })
    }

    pub fn char_nbits(&self) -> u32 {
        self.char_nbits
    }

    /// Number of distinct values a character can carry: `2^char_nbits`.
    pub fn effective_base(&self) -> u128 {
        1 << self.char_nbits
    }

    /// Characters in the smallest whole number of bytes: `lcm(char_nbits, 8) / char_nbits`.
    pub fn block_nchars(&self) -> usize {
        (8 / gcd(self.char_nbits, 8)) as usize
    }

    pub fn block_nbytes(&self) -> usize {
        (self.char_nbits / gcd(self.char_nbits, 8)) as usize
    }

    pub fn padding(&self) -> Padding {
        self.options.padding
    }

    pub fn pad_char(&self) -> Option<char> {
        self.options.pad_char
    }

    pub fn include_padding(&self) -> bool {
        self.options.padding != Padding::Ignore
    }

    pub fn require_padding(&self) -> bool {
        self.options.padding == Padding::Require
    }

    pub fn fixchar_options(&self) -> &FixcharOptions {
        &self.options
    }

    pub fn with_alphabet(&self, source: impl Into<AlphabetSource>, case_sensitive: Option<bool>) -> Result<Self, OptionsError> {
        Self::new(source.into().into_alphabet(case_sensitive)?, self.options.clone())
    }

    pub fn with_options(&self, overrides: Options) -> Result<Self, OptionsError> {
        Self::new(self.alphabet.clone(), self.options.merge(overrides)?)
    }

    /// Padding included on encode, and checked on decode if `require`.
    pub fn pad(&self, require: bool) -> Result<Self, OptionsError> {
        let padding = if require { Padding::Require } else { Padding::Include };
        Self::new(self.alphabet.clone(), FixcharOptions { padding, ..self.options.clone() })
    }

    /// Padding neither added nor checked. Unless `allow`, the padding character is dropped
    /// as well and becomes invalid input.
    pub fn nopad(&self, allow: bool) -> Self {
        Self {
            options: FixcharOptions {
                padding: Padding::Ignore,
                pad_char: if allow { self.options.pad_char } else { None },
                ..self.options.clone()
            },
            ..self.clone()
        }
    }

    /// A copy with a different padding character; `None` also turns padding off.
    pub fn with_pad_char(&self, pad_char: Option<char>) -> Result<Self, OptionsError> {
        let padding = if pad_char.is_some() { self.options.padding } else { Padding::Ignore };
        Self::new(
            self.alphabet.clone(),
            FixcharOptions {
                pad_char,
                padding,
                ..self.options.clone()
            },
        )
    }

    /// Appends pad characters up to a whole number of blocks.
    pub fn pad_string(&self, string: &str) -> String {
        let pad_char = match self.options.pad_char {
            Some(pad_char) => pad_char,
            None => return string.to_owned(),
        };
        let extra = string.chars().count() % self.block_nchars();
        if extra == 0 {
            return string.to_owned();
        }
        let mut padded = string.to_owned();
        padded.extend(iter::repeat(pad_char).take(self.block_nchars() - extra));
        padded
    }

    /// Removes trailing pad characters (in either case, for case-insensitive alphabets),
    /// checking their number if padding is required.
    pub fn strip_string<'a>(&self, string: &'a str) -> Result<&'a str, DecodeError> {
        let pad_char = match self.options.pad_char {
            Some(pad_char) => pad_char,
            None => return Ok(string),
        };
        let case_insensitive = !self.alphabet.case_sensitive();
        let stripped = string.trim_end_matches(|character: char| {
            character == pad_char || (case_insensitive && case_variants(pad_char).any(|variant| variant == character))
        });
        if self.require_padding() {
            let nchars = stripped.chars().count();
            let padding = string[stripped.len()..].chars().count();
            let extra = nchars % self.block_nchars();
            let expected_padding = if extra == 0 { 0 } else { self.block_nchars() - extra };
            if padding != expected_padding {
                return Err(DecodeError::Padding { padding, expected_padding });
            }
        }
        Ok(stripped)
    }

    fn digit_char(&self, digit: u128) -> Result<char, EncodeError> {
        let base = self.base();
        match self.alphabet.digit_to_char(digit as usize) {
            Ok(character) if digit < base as u128 => Ok(character),
            _ => Err(EncodeError::InvalidDigit { digit: digit as u64, base }),
        }
    }
}

impl BaseEncoding for FixcharEncoding {
    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        let nbits = self.char_nbits;
        let mask: u128 = (1 << nbits) - 1;
        let mut output = String::with_capacity((bytes.len() * 8 + nbits as usize - 1) / nbits as usize);
        let mut accumulator: u128 = 0;
        let mut bits: u32 = 0;
        for &value in bytes {
            accumulator = (accumulator << 8) | (value as u128);
            bits += 8;
            while bits >= nbits {
                bits -= nbits;
                output.push(self.digit_char((accumulator >> bits) & mask)?);
                accumulator &= (1 << bits) - 1;
            }
        }
        if bits > 0 {
            output.push(self.digit_char((accumulator << (nbits - bits)) & mask)?);
        }
        if self.include_padding() {
            return Ok(self.pad_string(&output));
        }
        Ok(output)
    }

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError> {
        let nbits = self.char_nbits;
        let digits = to_digits(&self.alphabet, self.strip_string(string)?)?;
        let mut output = Vec::with_capacity(digits.len() * nbits as usize / 8);
        let mut accumulator: u128 = 0;
        let mut bits: u32 = 0;
        for digit in digits {
            accumulator = (accumulator << nbits) | (digit as u128);
            bits += nbits;
            while bits >= 8 {
                bits -= 8;
                output.push((accumulator >> bits) as u8);
                accumulator &= (1 << bits) - 1;
            }
        }
        if bits >= nbits {
            return Err(DecodeError::TooManyPadBits {
                extra_nbits: bits,
                char_nbits: nbits,
            });
        }
        if accumulator != 0 {
            return Err(DecodeError::NonZeroPadBits);
        }
        Ok(output)
    }

    fn canonical_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        if (self.base() as u128) < self.effective_base() {
            self.encode(bytes)?;
        }
        Ok(bytes.to_vec())
    }

    fn options(&self, skip_defaults: bool) -> Options {
        self.options.to_map(skip_defaults)
    }
}

impl fmt::Display for FixcharEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixcharEncoding({}{})", self.alphabet, display(&self.options(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet;
    use serde_json::json;

    fn padded(alphabet: &Alphabet) -> FixcharEncoding {
        FixcharEncoding::new(
            alphabet.clone(),
            FixcharOptions {
                pad_char: Some('='),
                padding: Padding::Include,
                ..FixcharOptions::default()
            },
        )
        .unwrap()
    }

    fn unpadded(alphabet: &Alphabet) -> FixcharEncoding {
        FixcharEncoding::new(alphabet.clone(), FixcharOptions::default()).unwrap()
    }

    #[test]
    fn base64() {
        let encoding = padded(alphabet::base64());
        let tests: [(&str, &str); 7] = [
            ("", ""),
            ("f", "Zg=="),
            ("fo", "Zm8="),
            ("foo", "Zm9v"),
            ("foob", "Zm9vYg=="),
            ("fooba", "Zm9vYmE="),
            ("foobar", "Zm9vYmFy"),
        ];
        for (input, output) in tests {
            assert_eq!(encoding.encode(input.as_bytes()).unwrap(), output);
            assert_eq!(encoding.decode(output).unwrap(), input.as_bytes());
        }
        assert_eq!(encoding.encode(b"\0yes mani !").unwrap(), "AHllcyBtYW5pICE=");
        assert_eq!(encoding.encode(b"\0\0yes mani !").unwrap(), "AAB5ZXMgbWFuaSAh");
    }

    #[test]
    fn base32() {
        let encoding = padded(alphabet::base32());
        assert_eq!(encoding.block_nchars(), 8);
        assert_eq!(encoding.block_nbytes(), 5);
        assert_eq!(encoding.encode(b"\0yes mani !").unwrap(), "AB4WK4ZANVQW42JAEE======");
        assert_eq!(encoding.encode(b"\0\0yes mani !").unwrap(), "AAAHSZLTEBWWC3TJEAQQ====");
        assert_eq!(encoding.encode(b"yes mani !").unwrap(), "PFSXGIDNMFXGSIBB");
        assert_eq!(encoding.decode("ab4wk4zanvqw42jaee======").unwrap(), b"\0yes mani !");
        assert_eq!(encoding.decode("ab4wk4zanvqw42jaee").unwrap(), b"\0yes mani !");

        let lower = unpadded(&alphabet::base32().lower().unwrap());
        assert_eq!(lower.encode(b"\0yes mani !").unwrap(), "ab4wk4zanvqw42jaee");
        let hex = unpadded(&alphabet::base32hex().lower().unwrap());
        assert_eq!(hex.encode(b"\0yes mani !").unwrap(), "01smasp0dlgmsq9044");
        let z = unpadded(alphabet::base32z());
        assert_eq!(z.encode(b"\0yes mani !").unwrap(), "ybhskh3ypiosh4jyrr");
    }

    #[test]
    fn base8() {
        let encoding = unpadded(alphabet::base8());
        assert_eq!(encoding.char_nbits(), 3);
        assert_eq!(encoding.effective_base(), 8);
        assert_eq!(encoding.block_nchars(), 8);
        assert_eq!(encoding.block_nbytes(), 3);
        assert_eq!(encoding.encode(b"\0yes mani !").unwrap(), "000745453462015530267151100204");
        assert_eq!(encoding.decode("000745453462015530267151100204").unwrap(), b"\0yes mani !");
    }

    #[test]
    fn pad_bits() {
        let encoding = padded(alphabet::base64());
        assert_eq!(encoding.decode("Zh=="), Err(DecodeError::NonZeroPadBits));
        assert_eq!(
            encoding.decode("Z"),
            Err(DecodeError::TooManyPadBits {
                extra_nbits: 6,
                char_nbits: 6
            })
        );
        assert_eq!(encoding.decode("Zg").unwrap(), b"f");
        assert_eq!(encoding.decode("Zg=").unwrap(), b"f");
    }

    #[test]
    fn required_padding() {
        let encoding = padded(alphabet::base64()).pad(true).unwrap();
        assert!(encoding.require_padding());
        assert_eq!(encoding.decode("Zg==").unwrap(), b"f");
        assert_eq!(
            encoding.decode("Zg="),
            Err(DecodeError::Padding {
                padding: 1,
                expected_padding: 2
            })
        );
        assert_eq!(
            encoding.decode("Zm9v="),
            Err(DecodeError::Padding {
                padding: 1,
                expected_padding: 0
            })
        );
        assert_eq!(encoding.canonical_string("Zg==").unwrap(), "Zg==");
    }

    #[test]
    fn nopad() {
        let encoding = padded(alphabet::base64());
        let allowed = encoding.nopad(true);
        assert_eq!(allowed.encode(b"f").unwrap(), "Zg");
        assert_eq!(allowed.decode("Zg==").unwrap(), b"f");
        let strict = encoding.nopad(false);
        assert_eq!(strict.pad_char(), None);
        assert_eq!(
            strict.decode("Zg=="),
            Err(DecodeError::NonAlphabeticCharacter { character: '=', index: 2 })
        );
        assert_eq!(strict.pad(false), Err(OptionsError::MissingPadChar));
        assert_eq!(encoding.with_pad_char(None).unwrap(), strict);
    }

    #[test]
    fn non_power_of_two() {
        let encoding = unpadded(alphabet::base10());
        assert_eq!(encoding.char_nbits(), 4);
        assert_eq!(encoding.effective_base(), 16);
        assert_eq!(encoding.encode(&[0x12, 0x90]).unwrap(), "1290");
        assert_eq!(encoding.encode(&[0xab]), Err(EncodeError::InvalidDigit { digit: 10, base: 10 }));
        assert_eq!(encoding.decode("1290").unwrap(), vec![0x12, 0x90]);
        assert_eq!(encoding.canonical_bytes(&[0x12]).unwrap(), vec![0x12]);
        assert!(encoding.canonical_bytes(&[0xab]).is_err());
        let wide = FixcharEncoding::new(
            alphabet::base10().clone(),
            FixcharOptions {
                char_nbits: CharNbits::Fixed(8),
                ..FixcharOptions::default()
            },
        )
        .unwrap();
        assert_eq!(wide.encode(&[0x00, 0x09]).unwrap(), "09");
        assert_eq!(wide.block_nchars(), 1);
    }

    #[test]
    fn invalid_options() {
        let options = |char_nbits, pad_char, padding| FixcharOptions {
            char_nbits,
            pad_char,
            padding,
        };
        assert_eq!(
            FixcharEncoding::new(alphabet::base64().clone(), options(CharNbits::Fixed(5), None, Padding::Ignore)),
            Err(OptionsError::InsufficientCharNbits { char_nbits: 5, base: 64 })
        );
        assert_eq!(
            FixcharEncoding::new(alphabet::base64().clone(), options(CharNbits::Fixed(0), None, Padding::Ignore)),
            Err(OptionsError::InvalidCharNbits { char_nbits: 0, max: 64 })
        );
        assert_eq!(
            FixcharEncoding::new(alphabet::base64().clone(), options(CharNbits::Auto, None, Padding::Require)),
            Err(OptionsError::MissingPadChar)
        );
        assert_eq!(
            FixcharEncoding::new(alphabet::base64().clone(), options(CharNbits::Auto, Some('A'), Padding::Include)),
            Err(OptionsError::PadCharInAlphabet { character: 'A' })
        );
    }

    #[test]
    fn options() {
        let encoding = padded(alphabet::base32());
        assert_eq!(
            serde_json::Value::Object(encoding.options(true)),
            json!({"pad_char": "=", "padding": "include"})
        );
        assert_eq!(
            serde_json::Value::Object(encoding.options(false)),
            json!({"char_nbits": "auto", "pad_char": "=", "padding": "include"})
        );
        let overrides = json!({"char_nbits": 8, "padding": "require"});
        let changed = encoding.with_options(overrides.as_object().unwrap().clone()).unwrap();
        assert_eq!(changed.char_nbits(), 8);
        assert!(changed.require_padding());
        let overrides = json!({"char_nbits": "many"});
        assert!(matches!(
            encoding.with_options(overrides.as_object().unwrap().clone()),
            Err(OptionsError::InvalidOptions { .. })
        ));
        assert_eq!(
            encoding.to_string(),
            concat!(
                "FixcharEncoding(StringAlphabet(\"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567\", case_sensitive=false), ",
                "pad_char=\"=\", padding=\"include\")"
            )
        );
    }
}
