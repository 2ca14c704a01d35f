//! Base encodings: reversible maps between bytestrings and strings over an alphabet.
//!
//! Four kinds are provided:
//! - [`SimpleEncoding`]: the bytes as a big integer written in base `alphabet.len()`,
//!   with no leading zeros allowed on either side.
//! - [`ZeropadEncoding`]: as simple, but leading zero bytes are kept as blocks of zero characters.
//! - [`FixcharEncoding`]: a fixed number of bits per character, as in base32/base64.
//! - [`BlockEncoding`]: blocks of bytes encoded one by one with an inner encoding, as in base45.

mod block;
mod error;
mod fixchar;
mod options;
mod simple;
mod zeropad;

pub use block::{BlockEncoding, BlockOptions, BlockSize};
pub use error::{DecodeError, EncodeError, Error, OptionsError};
pub use fixchar::{CharNbits, FixcharEncoding, FixcharOptions, Padding, MAX_CHAR_NBITS};
pub use options::Options;
pub use simple::SimpleEncoding;
pub use zeropad::{max_block_nbytes, max_block_nchars, ZeropadEncoding, ZeropadOptions, MAX_BLOCK_NBITS};

use crate::{
    alphabet::{self, Alphabet, AlphabetSource},
    registry::{self, Registry},
};
use once_cell::sync::Lazy;
use options::{reject_options, EncodingOptions};
use std::{fmt, ops::Range, str::FromStr};
use thiserror::Error;

/// Digits of the characters of `string`, failing on the first one outside the alphabet.
pub(crate) fn to_digits(alphabet: &Alphabet, string: &str) -> Result<Vec<usize>, DecodeError> {
    string
        .chars()
        .enumerate()
        .map(|(index, character)| {
            alphabet
                .char_to_digit(character)
                .map_err(|_| DecodeError::NonAlphabeticCharacter { character, index })
        })
        .collect()
}

pub(crate) fn digit_char(alphabet: &Alphabet, digit: usize) -> Result<char, EncodeError> {
    alphabet.digit_to_char(digit).map_err(|_| EncodeError::InvalidDigit {
        digit: digit as u64,
        base: alphabet.len(),
    })
}

/// Contract shared by all encodings.
pub trait BaseEncoding {
    fn alphabet(&self) -> &Alphabet;

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError>;

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError>;

    /// Options needed to rebuild this encoding from its alphabet, leaving out those with
    /// default values if `skip_defaults`.
    fn options(&self, skip_defaults: bool) -> Options;

    fn base(&self) -> usize {
        self.alphabet().len()
    }

    fn case_sensitive(&self) -> bool {
        self.alphabet().case_sensitive()
    }

    fn zero_char(&self) -> char {
        self.alphabet().zero_char()
    }

    /// The bytestring that `decode(encode(bytes))` yields.
    fn canonical_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.decode(&self.encode(bytes)?)?)
    }

    /// The string that `encode(decode(string))` yields.
    fn canonical_string(&self, string: &str) -> Result<String, Error> {
        Ok(self.encode(&self.decode(string)?)?)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EncodingKind {
    Simple,
    Zeropad,
    Fixchar,
    Block,
}

impl EncodingKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple-enc",
            Self::Zeropad => "zeropad-enc",
            Self::Fixchar => "fixchar-enc",
            Self::Block => "block-enc",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingKind {
    type Err = OptionsError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "simple-enc" => Ok(Self::Simple),
            "zeropad-enc" => Ok(Self::Zeropad),
            "fixchar-enc" => Ok(Self::Fixchar),
            "block-enc" => Ok(Self::Block),
            _ => Err(OptionsError::UnknownKind { kind: kind.to_owned() }),
        }
    }
}

/// Any encoding. Equality and hashing are structural: same kind, same alphabet
/// (including case sensitivity) and same options.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Encoding {
    Simple(SimpleEncoding),
    Zeropad(ZeropadEncoding),
    Fixchar(FixcharEncoding),
    Block(BlockEncoding),
}

macro_rules! dispatch {
    ($self:ident, $encoding:ident => $expr:expr) => {
        match $self {
            Encoding::Simple($encoding) => $expr,
            Encoding::Zeropad($encoding) => $expr,
            Encoding::Fixchar($encoding) => $expr,
            Encoding::Block($encoding) => $expr,
        }
    };
}

impl Encoding {
    pub fn kind(&self) -> EncodingKind {
        match self {
            Self::Simple(_) => EncodingKind::Simple,
            Self::Zeropad(_) => EncodingKind::Zeropad,
            Self::Fixchar(_) => EncodingKind::Fixchar,
            Self::Block(_) => EncodingKind::Block,
        }
    }

    /// Same kind and options over a different alphabet.
    pub fn with_alphabet(&self, source: impl Into<AlphabetSource>, case_sensitive: Option<bool>) -> Result<Encoding, OptionsError> {
        Ok(dispatch!(self, encoding => encoding.with_alphabet(source, case_sensitive)?.into()))
    }

    pub fn with_case_sensitivity(&self, case_sensitive: bool) -> Result<Encoding, OptionsError> {
        self.with_alphabet(self.alphabet(), Some(case_sensitive))
    }

    pub fn upper(&self) -> Result<Encoding, OptionsError> {
        self.with_alphabet(self.alphabet().upper()?, None)
    }

    pub fn lower(&self) -> Result<Encoding, OptionsError> {
        self.with_alphabet(self.alphabet().lower()?, None)
    }

    /// Same kind and alphabet with some options replaced. Unknown option names are rejected.
    pub fn with_options(&self, overrides: Options) -> Result<Encoding, OptionsError> {
        match self {
            Self::Simple(encoding) => {
                reject_options(EncodingKind::Simple, &overrides)?;
                Ok(Self::Simple(encoding.clone()))
            }
            Self::Zeropad(encoding) => encoding.with_options(overrides).map(Self::Zeropad),
            Self::Fixchar(encoding) => encoding.with_options(overrides).map(Self::Fixchar),
            Self::Block(encoding) => encoding.with_options(overrides).map(Self::Block),
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleEncoding> {
        match self {
            Self::Simple(encoding) => Some(encoding),
            _ => None,
        }
    }

    pub fn as_zeropad(&self) -> Option<&ZeropadEncoding> {
        match self {
            Self::Zeropad(encoding) => Some(encoding),
            _ => None,
        }
    }

    pub fn as_fixchar(&self) -> Option<&FixcharEncoding> {
        match self {
            Self::Fixchar(encoding) => Some(encoding),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockEncoding> {
        match self {
            Self::Block(encoding) => Some(encoding),
            _ => None,
        }
    }
}

impl BaseEncoding for Encoding {
    fn alphabet(&self) -> &Alphabet {
        dispatch!(self, encoding => encoding.alphabet())
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        tracing::trace!(kind = %self.kind(), nbytes = bytes.len(), "encode");
        dispatch!(self, encoding => encoding.encode(bytes))
    }

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError> {
        tracing::trace!(kind = %self.kind(), len = string.len(), "decode");
        dispatch!(self, encoding => encoding.decode(string))
    }

    fn options(&self, skip_defaults: bool) -> Options {
        dispatch!(self, encoding => encoding.options(skip_defaults))
    }

    fn canonical_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        dispatch!(self, encoding => encoding.canonical_bytes(bytes))
    }

    fn canonical_string(&self, string: &str) -> Result<String, Error> {
        dispatch!(self, encoding => encoding.canonical_string(string))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, encoding => fmt::Display::fmt(encoding, f))
    }
}

impl From<SimpleEncoding> for Encoding {
    fn from(encoding: SimpleEncoding) -> Self {
        Self::Simple(encoding)
    }
}

impl From<ZeropadEncoding> for Encoding {
    fn from(encoding: ZeropadEncoding) -> Self {
        Self::Zeropad(encoding)
    }
}

impl From<FixcharEncoding> for Encoding {
    fn from(encoding: FixcharEncoding) -> Self {
        Self::Fixchar(encoding)
    }
}

impl From<BlockEncoding> for Encoding {
    fn from(encoding: BlockEncoding) -> Self {
        Self::Block(encoding)
    }
}

/// What [`make`] builds an encoding from: an alphabet source, or (block encodings only)
/// an inner encoding.
#[derive(Clone, Debug)]
pub enum Source {
    Alphabet(AlphabetSource),
    Encoding(Box<Encoding>),
}

macro_rules! alphabet_source {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Source {
                fn from(source: $source) -> Self {
                    Self::Alphabet(source.into())
                }
            }
        )*
    };
}

alphabet_source!(&str, String, Range<u32>, Alphabet, &Alphabet, AlphabetSource);

impl From<Encoding> for Source {
    fn from(encoding: Encoding) -> Self {
        Self::Encoding(Box::new(encoding))
    }
}

impl From<&Encoding> for Source {
    fn from(encoding: &Encoding) -> Self {
        Self::Encoding(Box::new(encoding.clone()))
    }
}

fn build(kind: EncodingKind, source: Source, case_sensitive: Option<bool>, options: Options) -> Result<Encoding, OptionsError> {
    let alphabet = match source {
        Source::Encoding(inner) if kind == EncodingKind::Block => {
            return Ok(BlockEncoding::with_inner(*inner, case_sensitive, BlockOptions::from_map(options)?)?.into());
        }
        Source::Encoding(_) => return Err(OptionsError::EncodingSource { kind: kind.name() }),
        Source::Alphabet(source) => source.into_alphabet(case_sensitive)?,
    };
    Ok(match kind {
        EncodingKind::Simple => {
            reject_options(kind, &options)?;
            SimpleEncoding::new(alphabet).into()
        }
        EncodingKind::Zeropad => ZeropadEncoding::new(alphabet, ZeropadOptions::from_map(options)?)?.into(),
        EncodingKind::Fixchar => FixcharEncoding::new(alphabet, FixcharOptions::from_map(options)?)?.into(),
        EncodingKind::Block => BlockEncoding::new(alphabet, BlockOptions::from_map(options)?)?.into(),
    })
}

#[derive(Debug, Error)]
pub enum MakeError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Registry(#[from] registry::Error),
}

/// Builds an encoding of the given kind and, if `name` is given, registers it under that name.
pub fn make(
    source: impl Into<Source>,
    kind: EncodingKind,
    case_sensitive: Option<bool>,
    options: Options,
    name: Option<&str>,
) -> Result<Encoding, MakeError> {
    let encoding = build(kind, source.into(), case_sensitive, options)?;
    if let Some(name) = name {
        register(name, encoding.clone())?;
    }
    Ok(encoding)
}

fn builtin(encoding: Result<impl Into<Encoding>, OptionsError>) -> Encoding {
    match encoding {
        Ok(encoding) => encoding.into(),
        Err(_) => panic!("Could not build encoding"),
    }
}

fn zeropad(alphabet: &Alphabet, block_nchars: usize) -> Encoding {
    builtin(ZeropadEncoding::new(alphabet.clone(), ZeropadOptions { block_nbytes: 1, block_nchars }))
}

fn fixchar(alphabet: &Alphabet, pad_char: Option<char>) -> Encoding {
    let padding = if pad_char.is_some() { Padding::Include } else { Padding::Ignore };
    builtin(FixcharEncoding::new(
        alphabet.clone(),
        FixcharOptions {
            pad_char,
            padding,
            ..FixcharOptions::default()
        },
    ))
}

static BASE2: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base2(), 8));
static BASE8: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base8(), Some('=')));
static BASE10: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base10(), 1));
static BASE16: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base16(), 2));
static BASE32: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base32(), Some('=')));
static BASE32HEX: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base32hex(), Some('=')));
static BASE32Z: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base32z(), None));
static BASE36: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base36(), 1));
static BASE45: Lazy<Encoding> = Lazy::new(|| {
    builtin(BlockEncoding::new(
        alphabet::base45().clone(),
        BlockOptions {
            reverse_blocks: true,
            ..BlockOptions::new([(1, 2), (2, 3)])
        },
    ))
});
static BASE58BTC: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base58btc(), 1));
static BASE58FLICKR: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base58flickr(), 1));
static BASE58RIPPLE: Lazy<Encoding> = Lazy::new(|| zeropad(alphabet::base58ripple(), 1));
static BASE64: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base64(), Some('=')));
static BASE64URL: Lazy<Encoding> = Lazy::new(|| fixchar(alphabet::base64url(), Some('=')));

/// Binary, eight characters per byte.
pub fn base2() -> &'static Encoding {
    &BASE2
}

/// Octal with `=` padding to blocks of 8 characters.
pub fn base8() -> &'static Encoding {
    &BASE8
}

pub fn base10() -> &'static Encoding {
    &BASE10
}

/// Hex, two characters per byte.
pub fn base16() -> &'static Encoding {
    &BASE16
}

/// RFC 4648 base32.
pub fn base32() -> &'static Encoding {
    &BASE32
}

/// RFC 4648 base32 with the "extended hex" alphabet.
pub fn base32hex() -> &'static Encoding {
    &BASE32HEX
}

/// z-base-32, unpadded.
pub fn base32z() -> &'static Encoding {
    &BASE32Z
}

pub fn base36() -> &'static Encoding {
    &BASE36
}

/// Base45 as used by QR codes: 2-byte blocks into 3 reversed characters.
pub fn base45() -> &'static Encoding {
    &BASE45
}

pub fn base58btc() -> &'static Encoding {
    &BASE58BTC
}

pub fn base58flickr() -> &'static Encoding {
    &BASE58FLICKR
}

pub fn base58ripple() -> &'static Encoding {
    &BASE58RIPPLE
}

/// RFC 4648 base64.
pub fn base64() -> &'static Encoding {
    &BASE64
}

/// RFC 4648 base64 with the URL and filename safe alphabet.
pub fn base64url() -> &'static Encoding {
    &BASE64URL
}

static REGISTRY: Lazy<Registry<Encoding>> = Lazy::new(|| {
    Registry::with_entries([
        ("base2", base2()),
        ("base8", base8()),
        ("base10", base10()),
        ("base16", base16()),
        ("base32", base32()),
        ("base32hex", base32hex()),
        ("base32z", base32z()),
        ("base36", base36()),
        ("base45", base45()),
        ("base58btc", base58btc()),
        ("base58flickr", base58flickr()),
        ("base58ripple", base58ripple()),
        ("base64", base64()),
        ("base64url", base64url()),
    ])
});

/// The process-wide encoding registry, pre-populated with the built-in encodings.
pub fn registry() -> &'static Registry<Encoding> {
    &REGISTRY
}

pub fn get(name: &str) -> Result<Encoding, registry::Error> {
    registry().get(name)
}

pub fn has(name: &str) -> bool {
    registry().has(name)
}

pub fn register(name: &str, encoding: Encoding) -> Result<(), registry::Error> {
    registry().register(name, encoding)
}

pub fn unregister(name: &str) -> Result<Encoding, registry::Error> {
    registry().unregister(name)
}

pub fn table(prefix: &str) -> Vec<(String, Encoding)> {
    registry().table(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BYTES: &[u8] = b"\0yes mani !";

    fn lower_nopad(encoding: &Encoding) -> Encoding {
        let lower = encoding.lower().unwrap();
        match lower.as_fixchar() {
            Some(fixchar) => fixchar.nopad(false).into(),
            None => lower,
        }
    }

    #[test]
    fn builtin_vectors() {
        assert_eq!(base58btc().encode(BYTES).unwrap(), "17paNL19xttacUY");
        assert_eq!(base58flickr().encode(BYTES).unwrap(), "17Pznk19XTTzBtx");
        assert_eq!(base10().encode(BYTES).unwrap(), "0573277761329450583662625");
        assert!(base2().encode(BYTES).unwrap().starts_with("00000000011110010110"));
        assert_eq!(base32().encode(BYTES).unwrap(), "AB4WK4ZANVQW42JAEE======");
        assert_eq!(base64().encode(BYTES).unwrap(), "AHllcyBtYW5pICE=");
        assert_eq!(base32z().encode(BYTES).unwrap(), "ybhskh3ypiosh4jyrr");
        assert_eq!(lower_nopad(base16()).encode(BYTES).unwrap(), "00796573206d616e692021");
        assert_eq!(lower_nopad(base32()).encode(BYTES).unwrap(), "ab4wk4zanvqw42jaee");
        assert_eq!(lower_nopad(base36()).encode(BYTES).unwrap(), "02lcpzo5yikidynfl");
        assert_eq!(lower_nopad(base32hex()).encode(BYTES).unwrap(), "01smasp0dlgmsq9044");
        assert_eq!(lower_nopad(base8()).encode(BYTES).unwrap(), "000745453462015530267151100204");
        assert_eq!(base45().encode(b"ietf!").unwrap(), "QED8WEX0");
        for (_, encoding) in table("base") {
            assert_eq!(encoding.decode(&encoding.encode(&BYTES[1..]).unwrap()).unwrap(), &BYTES[1..]);
        }
    }

    #[test]
    fn case_insensitive_canonical_string() {
        assert_eq!(base16().decode("796573206d616e692021").unwrap(), b"yes mani !");
        assert_eq!(base16().canonical_string("796573206d616e692021").unwrap(), "796573206D616E692021");
        assert_eq!(base36().decode("2lcpzo5yikidynfl").unwrap(), b"yes mani !");
        assert_eq!(base32().decode("pfsxgidnmfxgsibb").unwrap(), b"yes mani !");
        assert!(base58btc().decode("2lcpzo5yikidynfl").is_err());
    }

    #[test]
    fn equality() {
        assert_eq!(base16().upper().unwrap(), base16().clone());
        assert_ne!(base16().lower().unwrap(), base16().clone());
        assert_ne!(base16().with_case_sensitivity(true).unwrap(), base16().clone());
        assert_eq!(base32().lower().unwrap().upper().unwrap(), base32().clone());
        let zeropad = make(alphabet::base58btc(), EncodingKind::Zeropad, None, Options::new(), None).unwrap();
        let simple = make(alphabet::base58btc(), EncodingKind::Simple, None, Options::new(), None).unwrap();
        assert_eq!(&zeropad, base58btc());
        assert_ne!(simple, zeropad);
        assert_eq!(simple.encode(b"abc").unwrap(), zeropad.encode(b"abc").unwrap());
    }

    #[test]
    fn kinds() {
        assert_eq!("block-enc".parse::<EncodingKind>().unwrap(), EncodingKind::Block);
        assert_eq!(base32().kind().to_string(), "fixchar-enc");
        assert_eq!(
            "base-enc".parse::<EncodingKind>(),
            Err(OptionsError::UnknownKind {
                kind: "base-enc".to_owned()
            })
        );
    }

    #[test]
    fn make_with_options() {
        let options = json!({"char_nbits": 4, "padding": "ignore"});
        let encoding = make("0123456789", EncodingKind::Fixchar, None, options.as_object().unwrap().clone(), None).unwrap();
        assert_eq!(encoding.encode(&[0x19, 0x84]).unwrap(), "1984");

        let options = json!({"block_size": {"1": 2, "2": 3}, "reverse_blocks": true});
        let encoding = make(alphabet::base45(), EncodingKind::Block, None, options.as_object().unwrap().clone(), None).unwrap();
        assert_eq!(&encoding, base45());

        let options = json!({"block_size": {"1": 2}});
        let encoding = make(base16(), EncodingKind::Block, Some(true), options.as_object().unwrap().clone(), None).unwrap();
        assert_eq!(encoding.encode(&[0x00, 0xab]).unwrap(), "00AB");
        assert!(encoding.decode("00ab").is_err());

        assert!(matches!(
            make(base16(), EncodingKind::Zeropad, None, Options::new(), None),
            Err(MakeError::Options(OptionsError::EncodingSource { .. }))
        ));
        let options = json!({"block_nchars": 2});
        assert!(matches!(
            make(alphabet::base16(), EncodingKind::Simple, None, options.as_object().unwrap().clone(), None),
            Err(MakeError::Options(OptionsError::UnknownOption { .. }))
        ));
        assert!(matches!(
            make(alphabet::base45(), EncodingKind::Block, None, Options::new(), None),
            Err(MakeError::Options(OptionsError::InvalidOptions { .. }))
        ));
        assert!(matches!(
            make("0", EncodingKind::Simple, None, Options::new(), None),
            Err(MakeError::Options(OptionsError::Alphabet(alphabet::Error::TooShort { len: 1 })))
        ));
    }

    #[test]
    fn make_named() {
        let encoding = make(
            0x10000u32..0x110000,
            EncodingKind::Simple,
            None,
            Options::new(),
            Some("base1048576_encoding_test"),
        )
        .unwrap();
        assert_eq!(get("base1048576_encoding_test").unwrap(), encoding);
        let string = encoding.encode(b"hello world").unwrap();
        assert_eq!(string.chars().count(), 5);
        assert_eq!(encoding.decode(&string).unwrap(), b"hello world");
        assert!(matches!(
            make("01", EncodingKind::Simple, None, Options::new(), Some("base1048576_encoding_test")),
            Err(MakeError::Registry(registry::Error::Duplicate { .. }))
        ));
        unregister("base1048576_encoding_test").unwrap();
        assert!(!has("base1048576_encoding_test"));
    }

    #[test]
    fn display() {
        assert_eq!(base58btc().to_string(), format!("ZeropadEncoding({})", alphabet::base58btc()));
        assert_eq!(
            base64().to_string(),
            format!("FixcharEncoding({}, pad_char=\"=\", padding=\"include\")", alphabet::base64())
        );
    }
}
