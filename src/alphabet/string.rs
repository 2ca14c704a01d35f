use super::{case_variants, Error};
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Alphabet explicitly listing its (unique) characters.
#[derive(Clone, Debug)]
pub struct StringAlphabet {
    encode: Arc<[char]>,
    decode: Arc<HashMap<char, usize>>,
    case_sensitive: bool,
}

impl StringAlphabet {
    pub fn new(characters: &str, case_sensitive: bool) -> Result<Self, Error> {
        let encode: Vec<char> = characters.chars().collect();
        if encode.len() < 2 {
            return Err(Error::TooShort { len: encode.len() });
        }
        let mut decode: HashMap<char, usize> = HashMap::with_capacity(encode.len() * if case_sensitive { 1 } else { 2 });

        for (index, &character) in encode.iter().enumerate() {
            if let Some(&first) = decode.get(&character) {
                return Err(Error::DuplicateCharacter {
                    character,
                    first,
                    second: index,
                });
            }
            decode.insert(character, index);
        }

        if !case_sensitive {
            for (index, &character) in encode.iter().enumerate() {
                for variant in case_variants(character) {
                    match decode.entry(variant) {
                        Entry::Occupied(entry) if *entry.get() != index => {
                            return Err(Error::CaseConflict {
                                character,
                                other: encode[*entry.get()],
                            })
                        }
                        Entry::Occupied(_) => {}
                        Entry::Vacant(entry) => {
                            entry.insert(index);
                        }
                    }
                }
            }
        }

        Ok(Self {
            encode: encode.into(),
            decode: Arc::new(decode),
            case_sensitive,
        })
    }

    pub fn len(&self) -> usize {
        self.encode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encode.is_empty()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn get(&self, digit: usize) -> Option<char> {
        self.encode.get(digit).copied()
    }

    pub fn position(&self, character: char) -> Option<usize> {
        self.decode.get(&character).copied()
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.encode.iter().copied()
    }

    pub fn as_string(&self) -> String {
        self.encode.iter().collect()
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> Result<Self, Error> {
        let characters: String = self.encode[start..end].iter().collect();
        Self::new(&characters, self.case_sensitive)
    }

    pub fn with_case_sensitivity(&self, case_sensitive: bool) -> Result<Self, Error> {
        if case_sensitive == self.case_sensitive {
            return Ok(self.clone());
        }
        Self::new(&self.as_string(), case_sensitive)
    }

    pub fn upper(&self) -> Result<Self, Error> {
        self.map_case(self.as_string().to_uppercase())
    }

    pub fn lower(&self) -> Result<Self, Error> {
        self.map_case(self.as_string().to_lowercase())
    }

    fn map_case(&self, characters: String) -> Result<Self, Error> {
        if characters.chars().eq(self.chars()) {
            return Ok(self.clone());
        }
        Self::new(&characters, self.case_sensitive)
    }
}

impl PartialEq for StringAlphabet {
    fn eq(&self, other: &Self) -> bool {
        self.case_sensitive == other.case_sensitive && self.encode == other.encode
    }
}

impl Eq for StringAlphabet {}

impl Hash for StringAlphabet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encode.hash(state);
        self.case_sensitive.hash(state);
    }
}

impl fmt::Display for StringAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringAlphabet({:?}", self.as_string())?;
        if !self.case_sensitive {
            write!(f, ", case_sensitive=false")?;
        }
        write!(f, ")")
    }
}
