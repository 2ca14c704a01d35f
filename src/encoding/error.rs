use crate::alphabet;
use std::fmt;
use thiserror::Error;

/// Construction-time rejections. An encoding that was built successfully never fails
/// because of its own configuration.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum OptionsError {
    #[error(transparent)]
    Alphabet(#[from] alphabet::Error),
    #[error("Base must be at least 2, found {base}")]
    InvalidBase { base: usize },
    #[error("Number of {unit} per block must be positive")]
    NonPositiveBlockSize { unit: &'static str },
    #[error(
        "Number of characters per block is too large: the maximum for base = {base} and \
         block_nbytes = {block_nbytes} is {max}, found {block_nchars}"
    )]
    TooManyBlockChars {
        base: usize,
        block_nbytes: usize,
        block_nchars: usize,
        max: usize,
    },
    #[error(
        "Number of bytes per block is too large: the maximum for base = {base} and \
         block_nchars = {block_nchars} is {max}, found {block_nbytes}"
    )]
    TooManyBlockBytes {
        base: usize,
        block_nbytes: usize,
        block_nchars: usize,
        max: usize,
    },
    #[error("Block of {size} {unit} is too large: at most {max_nbits} bits per block are supported")]
    BlockSizeTooLarge {
        unit: &'static str,
        size: usize,
        max_nbits: usize,
    },
    #[error("Block size map must not be empty")]
    EmptyBlockSizes,
    #[error("Block char size must strictly increase with block byte size")]
    NonIncreasingBlockSizes,
    #[error("Number of bits per character must be between 1 and {max}, found {char_nbits}")]
    InvalidCharNbits { char_nbits: u32, max: u32 },
    #[error("{char_nbits} bits per character cannot cover an alphabet of {base} characters")]
    InsufficientCharNbits { char_nbits: u32, base: usize },
    #[error("A padding character must be specified unless padding is 'ignore'")]
    MissingPadChar,
    #[error("Padding character {character:?} cannot be in the alphabet")]
    PadCharInAlphabet { character: char },
    #[error("Separator character {character:?} cannot be in the alphabet")]
    SepCharInAlphabet { character: char },
    #[error("Unknown option {name:?} for {kind}")]
    UnknownOption { name: String, kind: &'static str },
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },
    #[error("Unknown encoding kind {kind:?}")]
    UnknownKind { kind: String },
    #[error("An encoding can be used as source only for block encodings, not {kind}")]
    EncodingSource { kind: &'static str },
}

impl From<serde_json::Error> for OptionsError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidOptions { message: error.to_string() }
    }
}

/// Failures while encoding a bytestring.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EncodeError {
    #[error("Bytestrings cannot have leading zero bytes")]
    LeadingZeroByte,
    #[error("Invalid digit {digit} encountered for base {base}")]
    InvalidDigit { digit: u64, base: usize },
    #[error("Encoded value too large: block bytes {} encoded as {encoded:?}, expected at most {nchars} chars", Hex(.block))]
    InvalidByteBlock { block: Vec<u8>, encoded: String, nchars: usize },
    #[error("Last block of {nbytes} bytes not allowed")]
    InvalidLastByteBlock { nbytes: usize },
}

/// Failures while decoding a string.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("Non-alphabetic character {character:?} at index {index}")]
    NonAlphabeticCharacter { character: char, index: usize },
    #[error("Strings cannot have leading zero characters")]
    LeadingZeroCharacter,
    #[error(
        "{} padding: found {padding}, expected {expected_padding}",
        if .padding < .expected_padding { "Insufficient" } else { "Excessive" }
    )]
    Padding { padding: usize, expected_padding: usize },
    #[error("More pad bits found ({extra_nbits}) than bits per character ({char_nbits})")]
    TooManyPadBits { extra_nbits: u32, char_nbits: u32 },
    #[error("Pad bits must be zero")]
    NonZeroPadBits,
    #[error("Decoded value too large: block chars {block:?} decoded as {}, expected at most {nbytes} bytes", Hex(.decoded))]
    InvalidCharBlock { block: String, decoded: Vec<u8>, nbytes: usize },
    #[error("Missing separator at end of block #{block}")]
    MissingSeparator { block: usize },
    #[error("Last block of {nchars} chars not allowed")]
    InvalidLastCharBlock { nchars: usize },
}

/// Either failure, as returned by the canonicalization operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            DecodeError::Padding {
                padding: 1,
                expected_padding: 2
            }
            .to_string(),
            "Insufficient padding: found 1, expected 2"
        );
        assert_eq!(
            DecodeError::Padding {
                padding: 3,
                expected_padding: 2
            }
            .to_string(),
            "Excessive padding: found 3, expected 2"
        );
        assert_eq!(
            EncodeError::InvalidByteBlock {
                block: vec![0xff, 0x01],
                encoded: "ZZZZ".to_owned(),
                nchars: 3
            }
            .to_string(),
            "Encoded value too large: block bytes ff01 encoded as \"ZZZZ\", expected at most 3 chars"
        );
        assert_eq!(
            Error::from(EncodeError::LeadingZeroByte).to_string(),
            "Bytestrings cannot have leading zero bytes"
        );
    }
}
