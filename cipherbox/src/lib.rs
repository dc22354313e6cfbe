//! # Cipherbox
//!
//! A didactic symmetric-cryptography toolkit. It provides classical block
//! ciphers (DES, Triple-DES in EDE composition, DEAL and a teaching variant
//! of LOKI97), the RC4 stream cipher, seven block-cipher modes of operation
//! (ECB, CBC, PCBC, CFB, OFB, CTR, RandomDelta), four padding schemes and a
//! fixed-group Diffie-Hellman key agreement with a SHA-256 key-derivation
//! helper.
//!
//! The central type is [`CipherContext`]: it owns one keyed block cipher, a
//! [`Mode`], a [`Padding`] and (for every mode but ECB) an IV, and applies
//! them to byte buffers, `Read`/`Write` pairs, or whole files.
//!
//! ## Example
//!
//! ```rust
//! use cipherbox::{Algorithm, CipherContext, Mode, Padding, random_iv};
//!
//! let key = [0x2B_u8; 16];
//! let iv = random_iv(16);
//! let context = CipherContext::with_algorithm(
//!     Algorithm::Loki97,
//!     &key,
//!     Mode::Cbc,
//!     Padding::Pkcs7,
//!     Some(&iv),
//! )
//! .unwrap();
//!
//! let ciphertext = context.encrypt(b"attack at dawn").unwrap();
//! let recovered = context.decrypt(&ciphertext).unwrap();
//! assert_eq!(recovered, b"attack at dawn");
//! ```
//!
//! ## Key agreement
//!
//! ```rust
//! use cipherbox::dh::{DhParticipant, derive_key};
//!
//! let alice = DhParticipant::new_initiator();
//! let (p, g) = alice.group();
//! let bob = DhParticipant::new_responder(p.clone(), g.clone());
//!
//! let shared = alice.shared_secret(bob.public_value());
//! assert_eq!(shared, bob.shared_secret(alice.public_value()));
//! let key = derive_key(&shared, 32).unwrap();
//! assert_eq!(key.len(), 32);
//! ```
//!
//! ## A word of warning
//!
//! This is a study toolkit. There is no authentication, no side-channel
//! hardening, and the LOKI97/DEAL variants are simplified teaching ciphers
//! whose ciphertext is not compatible with the published algorithms. Do not
//! protect real data with it.

use hex::FromHexError;
use thiserror::Error;

pub use crate::{
    context::{Algorithm, CipherContext},
    deal::Deal,
    des::{Des, TripleDes},
    dh::{DhParticipant, derive_key},
    loki97::Loki97,
    modes::Mode,
    padding::Padding,
    rc4::Rc4,
    utils::{iv_from_hex, random_iv},
};

mod context;
mod deal;
mod des;
pub mod dh;
mod loki97;
mod modes;
mod padding;
mod rc4;
mod utils;

#[cfg(test)]
mod tests;

/// Errors returned by cipher constructors and cipher operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("[cipherbox] invalid {cipher} key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        cipher: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("[cipherbox] {0:?} mode requires an initialization vector")]
    MissingIv(Mode),
    #[error("[cipherbox] invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIv { expected: usize, actual: usize },
    #[error("[cipherbox] ECB mode does not take an initialization vector")]
    UnexpectedIv,
    #[error("[cipherbox] block length must equal the cipher block size {expected}, got {actual}")]
    InvalidBlockSize { expected: usize, actual: usize },
    #[error("[cipherbox] ciphertext length {len} is not a multiple of the {block_size}-byte block size")]
    CiphertextLength { len: usize, block_size: usize },
    #[error("[cipherbox] derived key of {requested} bytes exceeds the {max}-byte SHA-256 output")]
    KeySizeTooLarge { requested: usize, max: usize },
    #[error("[cipherbox] unable to parse hex string: {0}")]
    ParseHex(#[from] FromHexError),
    #[error("[cipherbox] io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// A keyed block cipher: a fixed-size permutation over blocks of
/// [`block_size`](BlockCipher::block_size) bytes.
///
/// Implementations compute their round-key schedule once, inside their
/// constructor, and never mutate it afterwards. That makes a keyed instance
/// freely shareable between threads, which the parallel modes of operation
/// (ECB, CTR, CBC decryption, RandomDelta) rely on.
pub trait BlockCipher: Send + Sync {
    /// Short human-readable cipher name used in error reports.
    fn name(&self) -> &'static str;

    /// Block size in bytes (8 for DES/3DES, 16 for DEAL/LOKI97).
    fn block_size(&self) -> usize;

    /// Encrypt a single block. The input must be exactly
    /// [`block_size`](BlockCipher::block_size) bytes long.
    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt a single block. The input must be exactly
    /// [`block_size`](BlockCipher::block_size) bytes long.
    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A stateful keystream generator.
///
/// Unlike [`BlockCipher`], a stream cipher evolves with every byte it
/// produces: splitting an input across several `process` calls yields the
/// same bytes as one call over the whole input.
pub trait StreamCipher {
    /// XOR the keystream into `data`, returning a buffer of equal length.
    /// Encryption and decryption are the same operation.
    fn process(&mut self, data: &[u8]) -> Vec<u8>;
}

/// Helper macro to bail out early with a `CryptoError`
/// if any condition is true.
#[macro_export]
macro_rules! bail {
    ($expression:expr, $err:expr) => {
        if $expression {
            return Err($err);
        }
    };
    ( $( $cond:expr , $err:expr ),+ $(,)? ) => {
        $(
            if $cond {
                return Err($err);
            }
        )+
    };
}
