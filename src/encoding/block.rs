use super::{
    options::{display, EncodingOptions},
    simple::SimpleEncoding,
    zeropad::{check_block_nbytes, check_block_size},
    BaseEncoding, DecodeError, EncodeError, Encoding, EncodingKind, Options, OptionsError,
};
use crate::alphabet::{Alphabet, AlphabetSource};
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, iter};

/// Allowed block sizes: either every byte size up to a maximum, with the char size
/// of each derived from the base, or an explicit byte size → char size map.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum BlockSize {
    Max(usize),
    Sizes(BTreeMap<usize, usize>),
}

impl From<BlockSize> for Value {
    fn from(block_size: BlockSize) -> Self {
        match block_size {
            BlockSize::Max(max) => Value::from(max),
            BlockSize::Sizes(sizes) => Value::Object(
                sizes
                    .into_iter()
                    .map(|(nbytes, nchars)| (nbytes.to_string(), Value::from(nchars)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Value> for BlockSize {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(max) => match max.as_u64() {
                Some(max) => Ok(Self::Max(max as usize)),
                None => Err(format!("block_size must be a non-negative integer, found {}", max)),
            },
            Value::Object(sizes) => sizes
                .into_iter()
                .map(|(nbytes, nchars)| match (nbytes.parse::<usize>(), nchars.as_u64()) {
                    (Ok(nbytes), Some(nchars)) => Ok((nbytes, nchars as usize)),
                    _ => Err(format!("Invalid block size {:?}: {}", nbytes, nchars)),
                })
                .collect::<Result<_, _>>()
                .map(Self::Sizes),
            value => Err(format!("block_size must be an integer or a map, found {}", value)),
        }
    }
}

impl From<usize> for BlockSize {
    fn from(max: usize) -> Self {
        Self::Max(max)
    }
}

impl<const N: usize> From<[(usize, usize); N]> for BlockSize {
    fn from(sizes: [(usize, usize); N]) -> Self {
        Self::Sizes(sizes.into_iter().collect())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockOptions {
    pub block_size: BlockSize,
    #[serde(default)]
    pub sep_char: Option<char>,
    #[serde(default)]
    pub reverse_blocks: bool,
}

impl BlockOptions {
    pub fn new(block_size: impl Into<BlockSize>) -> Self {
        Self {
            block_size: block_size.into(),
            sep_char: None,
            reverse_blocks: false,
        }
    }
}

impl EncodingOptions for BlockOptions {
    const KIND: EncodingKind = EncodingKind::Block;
    const NAMES: &'static [&'static str] = &["block_size", "sep_char", "reverse_blocks"];
    const REQUIRED: &'static [&'static str] = &["block_size"];

    fn defaults(&self) -> Self {
        Self::new(self.block_size.clone())
    }
}

/// Every byte size up to `max`, each with the number of digits of `256^nbytes` in `base`.
fn derived_block_sizes(base: usize, max: usize) -> Result<BTreeMap<usize, usize>, OptionsError> {
    if max > 0 {
        check_block_nbytes(base, max)?;
    }
    let base = BigUint::from(base);
    let mut bound = BigUint::one();
    let mut power = BigUint::one();
    let mut nchars = 0;
    let mut sizes = BTreeMap::new();
    for nbytes in 1..=max {
        bound <<= 8;
        while power <= bound {
            power *= &base;
            nchars += 1;
        }
        sizes.insert(nbytes, nchars);
    }
    Ok(sizes)
}

fn block_sizes(base: usize, block_size: &BlockSize) -> Result<BTreeMap<usize, usize>, OptionsError> {
    let sizes = match block_size {
        BlockSize::Max(max) => derived_block_sizes(base, *max)?,
        BlockSize::Sizes(sizes) => sizes.clone(),
    };
    if sizes.is_empty() {
        return Err(OptionsError::EmptyBlockSizes);
    }
    if sizes.contains_key(&0) {
        return Err(OptionsError::NonPositiveBlockSize { unit: "bytes" });
    }
    if sizes.values().any(|&nchars| nchars == 0) {
        return Err(OptionsError::NonPositiveBlockSize { unit: "chars" });
    }
    if !sizes.values().zip(sizes.values().skip(1)).all(|(prev, next)| prev < next) {
        return Err(OptionsError::NonIncreasingBlockSizes);
    }
    Ok(sizes)
}

/// Splits bytes (resp. strings) into blocks and encodes (resp. decodes) each one with an
/// inner encoding, left-padding to the fixed char (resp. byte) size of the block.
/// All blocks but the last have the largest size; the last must have an allowed size.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockEncoding {
    alphabet: Alphabet,
    inner: Box<Encoding>,
    custom_inner: bool,
    options: BlockOptions,
    nbytes_to_nchars: BTreeMap<usize, usize>,
    nchars_to_nbytes: BTreeMap<usize, usize>,
}

impl BlockEncoding {
    /// Blocks encoded with the simple encoding over `alphabet`.
    pub fn new(alphabet: Alphabet, options: BlockOptions) -> Result<Self, OptionsError> {
        let inner = Encoding::Simple(SimpleEncoding::new(alphabet.clone()));
        Self::build(alphabet, inner, false, options)
    }

    /// Blocks encoded with `inner`. The outer alphabet is the inner one, with its case
    /// sensitivity optionally overridden.
    pub fn with_inner(inner: Encoding, case_sensitive: Option<bool>, options: BlockOptions) -> Result<Self, OptionsError> {
        let alphabet = AlphabetSource::from(inner.alphabet()).into_alphabet(case_sensitive)?;
        Self::build(alphabet, inner, true, options)
    }

    fn build(alphabet: Alphabet, inner: Encoding, custom_inner: bool, options: BlockOptions) -> Result<Self, OptionsError> {
        let base = alphabet.len();
        let nbytes_to_nchars = block_sizes(base, &options.block_size)?;
        let nchars_to_nbytes: BTreeMap<usize, usize> = nbytes_to_nchars.iter().map(|(&nbytes, &nchars)| (nchars, nbytes)).collect();
        let (block_nbytes, block_nchars) = match (nbytes_to_nchars.keys().last(), nchars_to_nbytes.keys().last()) {
            (Some(&nbytes), Some(&nchars)) => (nbytes, nchars),
            _ => return Err(OptionsError::EmptyBlockSizes),
        };
        check_block_size(base, block_nbytes, block_nchars)?;
        if let Some(character) = options.sep_char.filter(|&character| alphabet.contains(character)) {
            return Err(OptionsError::SepCharInAlphabet { character });
        }
        tracing::debug!(base, block_nbytes, block_nchars, custom_inner, "built block encoding");
        Ok(Self {
            alphabet,
            inner: Box::new(inner),
            custom_inner,
            options,
            nbytes_to_nchars,
            nchars_to_nbytes,
        })
    }

    /// The encoding applied to individual blocks.
    pub fn block_encoding(&self) -> &Encoding {
        &self.inner
    }

    pub fn nbytes_to_nchars(&self) -> &BTreeMap<usize, usize> {
        &self.nbytes_to_nchars
    }

    pub fn nchars_to_nbytes(&self) -> &BTreeMap<usize, usize> {
        &self.nchars_to_nbytes
    }

    /// Size in bytes of all blocks but the last.
    pub fn block_nbytes(&self) -> usize {
        self.nbytes_to_nchars.keys().last().copied().unwrap_or_default()
    }

    /// Size in chars of all blocks but the last.
    pub fn block_nchars(&self) -> usize {
        self.nchars_to_nbytes.keys().last().copied().unwrap_or_default()
    }

    pub fn sep_char(&self) -> Option<char> {
        self.options.sep_char
    }

    pub fn reverse_blocks(&self) -> bool {
        self.options.reverse_blocks
    }

    pub fn block_options(&self) -> &BlockOptions {
        &self.options
    }

    pub fn with_alphabet(&self, source: impl Into<AlphabetSource>, case_sensitive: Option<bool>) -> Result<Self, OptionsError> {
        if self.custom_inner {
            let inner = self.inner.with_alphabet(source, case_sensitive)?;
            return Self::with_inner(inner, None, self.options.clone());
        }
        Self::new(source.into().into_alphabet(case_sensitive)?, self.options.clone())
    }

    pub fn with_options(&self, overrides: Options) -> Result<Self, OptionsError> {
        Self::build(self.alphabet.clone(), (*self.inner).clone(), self.custom_inner, self.options.merge(overrides)?)
    }

    fn is_zero(&self, character: char) -> bool {
        self.alphabet.char_to_digit(character) == Ok(0)
    }

    /// Removes separators, checking that every full-length block is followed by one.
    fn join_blocks(&self, chars: Vec<char>) -> Result<Vec<char>, DecodeError> {
        let sep_char = match self.options.sep_char {
            Some(sep_char) => sep_char,
            None => return Ok(chars),
        };
        let block_nchars = self.block_nchars();
        let mut joined = Vec::with_capacity(chars.len());
        for (block, chunk) in chars.chunks(block_nchars + 1).enumerate() {
            if chunk.len() == block_nchars + 1 {
                if chunk[block_nchars] != sep_char {
                    return Err(DecodeError::MissingSeparator { block });
                }
                joined.extend_from_slice(&chunk[..block_nchars]);
            } else {
                joined.extend_from_slice(chunk);
            }
        }
        Ok(joined)
    }
}

impl BaseEncoding for BlockEncoding {
    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn encode(&self, bytes: &[u8]) -> Result<String, EncodeError> {
        let last_nbytes = bytes.len() % self.block_nbytes();
        if last_nbytes > 0 && !self.nbytes_to_nchars.contains_key(&last_nbytes) {
            return Err(EncodeError::InvalidLastByteBlock { nbytes: last_nbytes });
        }
        let zero_char = self.alphabet.zero_char();
        let mut output = String::with_capacity(bytes.len() / self.block_nbytes() * (self.block_nchars() + 1) + self.block_nchars());
        for (index, block) in bytes.chunks(self.block_nbytes()).enumerate() {
            let nchars = self.nbytes_to_nchars.get(&block.len()).copied().unwrap_or_default();
            let zeros = block.iter().take_while(|&&byte| byte == 0).count();
            let encoded = self.inner.encode(&block[zeros..])?;
            let len = encoded.chars().count();
            if len > nchars {
                return Err(EncodeError::InvalidByteBlock {
                    block: block.to_vec(),
                    encoded,
                    nchars,
                });
            }
            let mut chars: Vec<char> = iter::repeat(zero_char).take(nchars - len).chain(encoded.chars()).collect();
            if self.options.reverse_blocks {
                chars.reverse();
            }
            match self.options.sep_char {
                Some(sep_char) if index > 0 => output.push(sep_char),
                _ => {}
            }
            output.extend(chars);
        }
        Ok(output)
    }

    fn decode(&self, string: &str) -> Result<Vec<u8>, DecodeError> {
        let chars = self.join_blocks(string.chars().collect())?;
        if let Some((index, &character)) = chars.iter().enumerate().find(|&(_, &character)| !self.alphabet.contains(character)) {
            // position in the input, separators included
            let index = match self.options.sep_char {
                Some(_) => index + index / self.block_nchars(),
                None => index,
            };
            return Err(DecodeError::NonAlphabeticCharacter { character, index });
        }
        let last_nchars = chars.len() % self.block_nchars();
        if last_nchars > 0 && !self.nchars_to_nbytes.contains_key(&last_nchars) {
            return Err(DecodeError::InvalidLastCharBlock { nchars: last_nchars });
        }
        let mut output = Vec::with_capacity(chars.len() / self.block_nchars() * self.block_nbytes() + self.block_nbytes());
        for chunk in chars.chunks(self.block_nchars()) {
            let nbytes = self.nchars_to_nbytes.get(&chunk.len()).copied().unwrap_or_default();
            let mut block = chunk.to_vec();
            if self.options.reverse_blocks {
                block.reverse();
            }
            let zeros = block.iter().take_while(|&&character| self.is_zero(character)).count();
            let stripped: String = block[zeros..].iter().collect();
            let decoded = self.inner.decode(&stripped)?;
            if decoded.len() > nbytes {
                return Err(DecodeError::InvalidCharBlock {
                    block: block.into_iter().collect(),
                    decoded,
                    nbytes,
                });
            }
            output.extend(iter::repeat(0).take(nbytes - decoded.len()));
            output.extend(decoded);
        }
        Ok(output)
    }

    fn options(&self, skip_defaults: bool) -> Options {
        self.options.to_map(skip_defaults)
    }
}

impl fmt::Display for BlockEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = display(&self.options(true));
        if self.custom_inner {
            return write!(f, "BlockEncoding({}{})", self.inner, options);
        }
        write!(f, "BlockEncoding({}{})", self.alphabet, options)
    }
}
