use super::{case_variants, Error, StringAlphabet};
use std::{fmt, ops::Range};

const SURROGATES: Range<u32> = 0xD800..0xE000;
const MAX_CODEPOINT: u32 = 0x110000;

/// Alphabet implicitly given by a contiguous range of Unicode codepoints.
/// Lookups are arithmetic, so arbitrarily large ranges cost no memory.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RangeAlphabet {
    start: u32,
    end: u32,
    case_sensitive: bool,
}

impl RangeAlphabet {
    pub fn new(codepoints: Range<u32>, case_sensitive: bool) -> Result<Self, Error> {
        let Range { start, end } = codepoints;
        let len = end.saturating_sub(start) as usize;
        if len < 2 {
            return Err(Error::TooShort { len });
        }
        if end > MAX_CODEPOINT {
            return Err(Error::InvalidCodepoint { codepoint: MAX_CODEPOINT.max(start) });
        }
        if start < SURROGATES.end && SURROGATES.start < end {
            return Err(Error::InvalidCodepoint {
                codepoint: start.max(SURROGATES.start),
            });
        }
        let alphabet = Self { start, end, case_sensitive };
        if !case_sensitive {
            alphabet.validate_case()?;
        }
        Ok(alphabet)
    }

    fn validate_case(&self) -> Result<(), Error> {
        for character in self.chars() {
            if let Some(other) = case_variants(character).find(|&variant| self.contains_literal(variant)) {
                return Err(Error::CaseConflict { character, other });
            }
        }
        Ok(())
    }

    fn contains_literal(&self, character: char) -> bool {
        (self.start..self.end).contains(&(character as u32))
    }

    pub fn codepoints(&self) -> Range<u32> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn get(&self, digit: usize) -> Option<char> {
        if digit >= self.len() {
            return None;
        }
        char::from_u32(self.start + digit as u32)
    }

    pub fn position(&self, character: char) -> Option<usize> {
        if self.contains_literal(character) {
            return Some((character as u32 - self.start) as usize);
        }
        if self.case_sensitive {
            return None;
        }
        case_variants(character)
            .find(|&variant| self.contains_literal(variant))
            .map(|variant| (variant as u32 - self.start) as usize)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> {
        (self.start..self.end).filter_map(char::from_u32)
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> Result<Self, Error> {
        Self::new(self.start + start as u32..self.start + end as u32, self.case_sensitive)
    }

    pub fn with_case_sensitivity(&self, case_sensitive: bool) -> Result<Self, Error> {
        Self::new(self.codepoints(), case_sensitive)
    }

    /// The explicit string alphabet with the same characters and case sensitivity.
    pub fn as_string_alphabet(&self) -> Result<StringAlphabet, Error> {
        let characters: String = self.chars().collect();
        StringAlphabet::new(&characters, self.case_sensitive)
    }
}

impl fmt::Display for RangeAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangeAlphabet({:#x}, {:#x}", self.start, self.end)?;
        if !self.case_sensitive {
            write!(f, ", case_sensitive=false")?;
        }
        write!(f, ")")
    }
}
