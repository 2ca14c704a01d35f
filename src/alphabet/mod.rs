//! Alphabets: ordered, duplicate-free sets of characters establishing a bijection between
//! digits `0..len` and characters, with optional case-insensitive lookup.
//!
//! Two representations share the same contract: [`StringAlphabet`] lists its characters
//! explicitly, [`RangeAlphabet`] is an implicit contiguous range of codepoints.

mod range;
mod string;

pub use range::RangeAlphabet;
pub use string::StringAlphabet;

use crate::registry::{self, Registry};
use once_cell::sync::Lazy;
use std::{
    fmt,
    ops::{Bound, Range, RangeBounds},
};
use thiserror::Error;

/// Construction failures for alphabets.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("Alphabet must have at least two characters, found {len}")]
    TooShort { len: usize },
    #[error("Invalid character {character:?} at indexes {first} and {second}")]
    DuplicateCharacter { character: char, first: usize, second: usize },
    #[error("Alphabet contains {character:?} and its case variant {other:?}, it must be case-sensitive")]
    CaseConflict { character: char, other: char },
    #[error("Codepoint {codepoint:#x} is not a valid character")]
    InvalidCodepoint { codepoint: u32 },
}

/// Lookup failures for digits and characters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum LookupError {
    #[error("Digit {digit} out of range for base {base}")]
    DigitOutOfRange { digit: usize, base: usize },
    #[error("Character {character:?} not in alphabet")]
    InvalidCharacter { character: char },
}

/// Returns `Some(c)` if the iterator yields exactly one character.
fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    match chars.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Single-character upper/lower case variants of `character` which differ from it.
pub(crate) fn case_variants(character: char) -> impl Iterator<Item = char> {
    [single(character.to_uppercase()), single(character.to_lowercase())]
        .into_iter()
        .flatten()
        .filter(move |&variant| variant != character)
}

/// Resolves a `RangeBounds` against a sequence of length `len`, clamping like slicing does.
fn resolve_bounds(bounds: impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let start = match bounds.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match bounds.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    (start.min(end), end)
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Alphabet {
    String(StringAlphabet),
    Range(RangeAlphabet),
}

impl Alphabet {
    /// Number of characters in the alphabet (the base).
    pub fn len(&self) -> usize {
        match self {
            Self::String(alphabet) => alphabet.len(),
            Self::Range(alphabet) => alphabet.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn case_sensitive(&self) -> bool {
        match self {
            Self::String(alphabet) => alphabet.case_sensitive(),
            Self::Range(alphabet) => alphabet.case_sensitive(),
        }
    }

    /// Character for the given digit, always in the case the alphabet was built with.
    pub fn digit_to_char(&self, digit: usize) -> Result<char, LookupError> {
        let character = match self {
            Self::String(alphabet) => alphabet.get(digit),
            Self::Range(alphabet) => alphabet.get(digit),
        };
        character.ok_or(LookupError::DigitOutOfRange { digit, base: self.len() })
    }

    /// Digit for the given character. Case-insensitive alphabets resolve either case.
    pub fn char_to_digit(&self, character: char) -> Result<usize, LookupError> {
        let digit = match self {
            Self::String(alphabet) => alphabet.position(character),
            Self::Range(alphabet) => alphabet.position(character),
        };
        digit.ok_or(LookupError::InvalidCharacter { character })
    }

    pub fn contains(&self, character: char) -> bool {
        self.char_to_digit(character).is_ok()
    }

    /// The character for digit 0, used for left-padding.
    pub fn zero_char(&self) -> char {
        match self {
            Self::String(alphabet) => alphabet.chars().next(),
            Self::Range(alphabet) => alphabet.get(0),
        }
        .unwrap_or_default()
    }

    pub fn chars(&self) -> Box<dyn Iterator<Item = char> + '_> {
        match self {
            Self::String(alphabet) => Box::new(alphabet.chars()),
            Self::Range(alphabet) => Box::new(alphabet.chars()),
        }
    }

    /// A new alphabet with the characters at positions in `bounds`, clamped like slicing.
    pub fn slice(&self, bounds: impl RangeBounds<usize>) -> Result<Alphabet, Error> {
        let (start, end) = resolve_bounds(bounds, self.len());
        match self {
            Self::String(alphabet) => alphabet.slice(start, end).map(Self::String),
            Self::Range(alphabet) => alphabet.slice(start, end).map(Self::Range),
        }
    }

    pub fn with_case_sensitivity(&self, case_sensitive: bool) -> Result<Alphabet, Error> {
        if case_sensitive == self.case_sensitive() {
            return Ok(self.clone());
        }
        match self {
            Self::String(alphabet) => alphabet.with_case_sensitivity(case_sensitive).map(Self::String),
            Self::Range(alphabet) => alphabet.with_case_sensitivity(case_sensitive).map(Self::Range),
        }
    }

    /// A new alphabet with all cased characters turned to uppercase.
    /// Range alphabets become string alphabets.
    pub fn upper(&self) -> Result<Alphabet, Error> {
        match self {
            Self::String(alphabet) => alphabet.upper().map(Self::String),
            Self::Range(alphabet) => alphabet.as_string_alphabet()?.upper().map(Self::String),
        }
    }

    /// A new alphabet with all cased characters turned to lowercase.
    /// Range alphabets become string alphabets.
    pub fn lower(&self) -> Result<Alphabet, Error> {
        match self {
            Self::String(alphabet) => alphabet.lower().map(Self::String),
            Self::Range(alphabet) => alphabet.as_string_alphabet()?.lower().map(Self::String),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(alphabet) => fmt::Display::fmt(alphabet, f),
            Self::Range(alphabet) => fmt::Display::fmt(alphabet, f),
        }
    }
}

impl From<StringAlphabet> for Alphabet {
    fn from(alphabet: StringAlphabet) -> Self {
        Self::String(alphabet)
    }
}

impl From<RangeAlphabet> for Alphabet {
    fn from(alphabet: RangeAlphabet) -> Self {
        Self::Range(alphabet)
    }
}

/// Anything an alphabet can be built from.
#[derive(Clone, Debug)]
pub enum AlphabetSource {
    Chars(String),
    Range(Range<u32>),
    Alphabet(Alphabet),
}

impl AlphabetSource {
    /// Builds the alphabet. Explicit characters and ranges default to case-sensitive;
    /// an existing alphabet keeps its own sensitivity unless `case_sensitive` overrides it.
    pub fn into_alphabet(self, case_sensitive: Option<bool>) -> Result<Alphabet, Error> {
        match self {
            Self::Chars(chars) => StringAlphabet::new(&chars, case_sensitive.unwrap_or(true)).map(Alphabet::String),
            Self::Range(codepoints) => RangeAlphabet::new(codepoints, case_sensitive.unwrap_or(true)).map(Alphabet::Range),
            Self::Alphabet(alphabet) => match case_sensitive {
                Some(case_sensitive) => alphabet.with_case_sensitivity(case_sensitive),
                None => Ok(alphabet),
            },
        }
    }
}

impl From<&str> for AlphabetSource {
    fn from(chars: &str) -> Self {
        Self::Chars(chars.to_owned())
    }
}

impl From<String> for AlphabetSource {
    fn from(chars: String) -> Self {
        Self::Chars(chars)
    }
}

impl From<Range<u32>> for AlphabetSource {
    fn from(codepoints: Range<u32>) -> Self {
        Self::Range(codepoints)
    }
}

impl From<Alphabet> for AlphabetSource {
    fn from(alphabet: Alphabet) -> Self {
        Self::Alphabet(alphabet)
    }
}

impl From<&Alphabet> for AlphabetSource {
    fn from(alphabet: &Alphabet) -> Self {
        Self::Alphabet(alphabet.clone())
    }
}

fn builtin(characters: &str, case_sensitive: bool) -> Alphabet {
    match StringAlphabet::new(characters, case_sensitive) {
        Ok(alphabet) => Alphabet::String(alphabet),
        Err(_) => panic!("Could not build alphabet"),
    }
}

static BASE2: Lazy<Alphabet> = Lazy::new(|| builtin("01", true));
static BASE8: Lazy<Alphabet> = Lazy::new(|| builtin("01234567", true));
static BASE10: Lazy<Alphabet> = Lazy::new(|| builtin("0123456789", true));
static BASE16: Lazy<Alphabet> = Lazy::new(|| builtin("0123456789ABCDEF", false));
static BASE32: Lazy<Alphabet> = Lazy::new(|| builtin("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567", false));
static BASE32HEX: Lazy<Alphabet> = Lazy::new(|| builtin("0123456789ABCDEFGHIJKLMNOPQRSTUV", false));
static BASE32Z: Lazy<Alphabet> = Lazy::new(|| builtin("ybndrfg8ejkmcpqxot1uwisza345h769", false));
static BASE36: Lazy<Alphabet> = Lazy::new(|| builtin("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ", false));
static BASE45: Lazy<Alphabet> = Lazy::new(|| builtin("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:", false));
static BASE58BTC: Lazy<Alphabet> = Lazy::new(|| builtin("123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz", true));
static BASE58FLICKR: Lazy<Alphabet> = Lazy::new(|| builtin("123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ", true));
static BASE58RIPPLE: Lazy<Alphabet> = Lazy::new(|| builtin("rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz", true));
static BASE64: Lazy<Alphabet> = Lazy::new(|| builtin("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/", true));
static BASE64URL: Lazy<Alphabet> = Lazy::new(|| builtin("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_", true));

pub fn base2() -> &'static Alphabet {
    &BASE2
}

pub fn base8() -> &'static Alphabet {
    &BASE8
}

pub fn base10() -> &'static Alphabet {
    &BASE10
}

/// Uppercase case-insensitive base-16.
pub fn base16() -> &'static Alphabet {
    &BASE16
}

/// Uppercase case-insensitive base-32 from RFC 4648.
pub fn base32() -> &'static Alphabet {
    &BASE32
}

/// Uppercase case-insensitive "extended hex" base-32 from RFC 4648.
pub fn base32hex() -> &'static Alphabet {
    &BASE32HEX
}

/// Lowercase case-insensitive human-oriented base-32 (z-base-32).
pub fn base32z() -> &'static Alphabet {
    &BASE32Z
}

pub fn base36() -> &'static Alphabet {
    &BASE36
}

/// Uppercase case-insensitive base-45 from draft-faltstrom-base45.
pub fn base45() -> &'static Alphabet {
    &BASE45
}

/// Bitcoin base-58.
pub fn base58btc() -> &'static Alphabet {
    &BASE58BTC
}

pub fn base58flickr() -> &'static Alphabet {
    &BASE58FLICKR
}

pub fn base58ripple() -> &'static Alphabet {
    &BASE58RIPPLE
}

pub fn base64() -> &'static Alphabet {
    &BASE64
}

pub fn base64url() -> &'static Alphabet {
    &BASE64URL
}

static REGISTRY: Lazy<Registry<Alphabet>> = Lazy::new(|| {
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

/// The process-wide alphabet registry, pre-populated with the built-in alphabets.
pub fn registry() -> &'static Registry<Alphabet> {
    &REGISTRY
}

pub fn get(name: &str) -> Result<Alphabet, registry::Error> {
    registry().get(name)
}

pub fn has(name: &str) -> bool {
    registry().has(name)
}

pub fn register(name: &str, alphabet: Alphabet) -> Result<(), registry::Error> {
    registry().register(name, alphabet)
}

pub fn unregister(name: &str) -> Result<Alphabet, registry::Error> {
    registry().unregister(name)
}

pub fn table(prefix: &str) -> Vec<(String, Alphabet)> {
    registry().table(prefix)
}

#[derive(Debug, Error)]
pub enum MakeError {
    #[error(transparent)]
    Alphabet(#[from] Error),
    #[error(transparent)]
    Registry(#[from] registry::Error),
}

/// Builds an alphabet and, if `name` is given, registers it under that name.
pub fn make(source: impl Into<AlphabetSource>, case_sensitive: Option<bool>, name: Option<&str>) -> Result<Alphabet, MakeError> {
    let alphabet = source.into().into_alphabet(case_sensitive)?;
    if let Some(name) = name {
        register(name, alphabet.clone())?;
    }
    Ok(alphabet)
}
