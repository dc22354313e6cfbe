//! DEAL: a 128-bit Feistel cipher whose round function is DES.
//!
//! Two 64-bit halves, six rounds (eight for 32-byte keys), and one DES
//! instance per round. Round keys are read from the user key at wrapping
//! 8-byte offsets and whitened with multiples of the DELTA constant before
//! keying the round's DES, so the 16/24/32-byte key variants all produce
//! distinct schedules.
//!
//! Like the LOKI97 variant next door this is a teaching cipher: the Feistel
//! shape matches the published DEAL, the key schedule does not.

use crate::{BlockCipher, CryptoError, bail, des::Des, loki97::DELTA};

const BLOCK_SIZE: usize = 16;

/// # DEAL control block
///
/// Owns one keyed [`Des`] per round. Schedules are fixed at construction.
pub struct Deal {
    round_ciphers: Vec<Des>,
}

impl Deal {
    /// Build a DEAL instance from a 16, 24 or 32-byte key. The two
    /// shorter variants run 6 rounds, the 32-byte variant 8.
    pub fn new<K>(key: K) -> Result<Self, CryptoError>
    where
        K: AsRef<[u8]>,
    {
        let key = key.as_ref();
        let rounds = match key.len() {
            16 | 24 => 6,
            32 => 8,
            actual => {
                return Err(CryptoError::InvalidKeySize {
                    cipher: "DEAL",
                    expected: "16, 24 or 32",
                    actual,
                });
            }
        };

        let mut round_ciphers = Vec::with_capacity(rounds);
        for i in 0..rounds {
            let mut word = [0u8; 8];
            for (offset, byte) in word.iter_mut().enumerate() {
                *byte = key[(i * 8 + offset) % key.len()];
            }
            let round_key = u64::from_be_bytes(word) ^ DELTA.wrapping_mul(i as u64 + 1);
            round_ciphers.push(Des::new(round_key.to_be_bytes())?);
        }

        Ok(Self { round_ciphers })
    }
}

impl BlockCipher for Deal {
    fn name(&self) -> &'static str {
        "DEAL"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (mut left, mut right) = split_block(block)?;

        for des in &self.round_ciphers {
            let new_right = left ^ des.crypt(right, false);
            left = right;
            right = new_right;
        }

        Ok(join_halves(left, right))
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let (mut left, mut right) = split_block(block)?;

        // The round function is never inverted, so decryption also runs
        // DES forwards, just over the rounds in reverse.
        for des in self.round_ciphers.iter().rev() {
            let prev_right = left;
            let prev_left = right ^ des.crypt(prev_right, false);
            left = prev_left;
            right = prev_right;
        }

        Ok(join_halves(left, right))
    }
}

fn split_block(block: &[u8]) -> Result<(u64, u64), CryptoError> {
    bail!(
        block.len() != BLOCK_SIZE,
        CryptoError::InvalidBlockSize {
            expected: BLOCK_SIZE,
            actual: block.len()
        }
    );
    let left = u64::from_be_bytes(block[..8].try_into().unwrap());
    let right = u64::from_be_bytes(block[8..].try_into().unwrap());
    Ok((left, right))
}

fn join_halves(left: u64, right: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_SIZE);
    out.extend_from_slice(&left.to_be_bytes());
    out.extend_from_slice(&right.to_be_bytes());
    out
}
