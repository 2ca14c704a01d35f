//! Base-N encodings of bytestrings: alphabets, the simple, zeropad, fixchar and block
//! encoding kinds, registries of named alphabets and encodings, and random test data.

pub mod alphabet;
pub mod encoding;
pub mod random;
pub mod registry;

pub use self::{
    alphabet::{Alphabet, AlphabetSource},
    encoding::{BaseEncoding, Encoding, EncodingKind, Options},
    random::RandomData,
};
