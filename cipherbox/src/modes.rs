//! Block-cipher modes of operation.
//!
//! The drivers here work on chunks: [`crate::CipherContext`] feeds them one
//! buffer at a time and the [`FeedbackState`] carries the registers across
//! chunk boundaries, so a stream processed in 64 KiB pieces produces the
//! same bytes as a single buffer call.
//!
//! ECB, CTR, RandomDelta and CBC decryption have no serial dependency
//! between blocks and fan out over rayon; everything else walks the blocks
//! on the calling thread. Output bytes are assembled in block order either
//! way, so the result never depends on scheduling.

use rayon::prelude::*;

use crate::{BlockCipher, CryptoError, utils::xor_in_place};

/// Modes of operation for a block cipher.
///
/// ECB, CBC, PCBC and RandomDelta are block-aligned and combine with a
/// [`crate::Padding`]; CFB, OFB and CTR turn the cipher into a stream
/// cipher and preserve the input length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Electronic codebook: every block stands alone. Equal plaintext
    /// blocks leak as equal ciphertext blocks; kept for study purposes.
    Ecb,

    /// Cipher block chaining: each plaintext block is XORed with the
    /// previous ciphertext block before encryption.
    Cbc,

    /// Propagating CBC: chains both the previous plaintext and the
    /// previous ciphertext into every block.
    Pcbc,

    /// Full-block cipher feedback. The final chunk may be short; its
    /// ciphertext is zero-extended into the feedback register.
    Cfb,

    /// Output feedback: the cipher repeatedly encrypts its own output to
    /// form a keystream.
    Ofb,

    /// Counter mode: the keystream block for index `k` encrypts the IV
    /// with its trailing 8 bytes read as a big-endian counter plus `k`.
    Ctr,

    /// Each block is whitened with a deterministic SplitMix64 mask seeded
    /// from the IV and the block index before encryption. Educational
    /// only — the mask generator is not a cryptographic stream.
    RandomDelta,
}

impl Mode {
    /// Block-aligned modes pad on encrypt and unpad on decrypt; the
    /// stream-like modes never do.
    pub fn requires_padding(&self) -> bool {
        matches!(self, Mode::Ecb | Mode::Cbc | Mode::Pcbc | Mode::RandomDelta)
    }

    /// Every mode except ECB needs an IV of exactly one block.
    pub fn requires_iv(&self) -> bool {
        !matches!(self, Mode::Ecb)
    }
}

/// Registers carried between chunks of one top-level operation.
///
/// A fresh state is cloned from the IV at the start of every call, so no
/// feedback can bleed from one operation into the next.
pub(crate) struct FeedbackState {
    /// CBC/CFB/OFB feedback register; CTR and RandomDelta read the IV
    /// from here without mutating it.
    register: Vec<u8>,
    /// PCBC register pair.
    prev_plain: Vec<u8>,
    prev_cipher: Vec<u8>,
    /// Number of blocks already consumed (CTR counter offset and
    /// RandomDelta mask index).
    block_index: u64,
}

impl FeedbackState {
    pub(crate) fn new(iv: Option<&[u8]>) -> Self {
        let register = iv.map(<[u8]>::to_vec).unwrap_or_default();
        Self {
            prev_plain: register.clone(),
            prev_cipher: register.clone(),
            register,
            block_index: 0,
        }
    }
}

pub(crate) fn encrypt_chunk(
    cipher: &dyn BlockCipher,
    mode: Mode,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match mode {
        Mode::Ecb => ecb_crypt(cipher, data, false),
        Mode::Cbc => cbc_encrypt(cipher, state, data),
        Mode::Pcbc => pcbc_encrypt(cipher, state, data),
        Mode::Cfb => cfb_crypt(cipher, state, data, false),
        Mode::Ofb => ofb_keystream(cipher, state, data),
        Mode::Ctr => ctr_keystream(cipher, state, data),
        Mode::RandomDelta => random_delta_encrypt(cipher, state, data),
    }
}

pub(crate) fn decrypt_chunk(
    cipher: &dyn BlockCipher,
    mode: Mode,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match mode {
        Mode::Ecb => ecb_crypt(cipher, data, true),
        Mode::Cbc => cbc_decrypt(cipher, state, data),
        Mode::Pcbc => pcbc_decrypt(cipher, state, data),
        Mode::Cfb => cfb_crypt(cipher, state, data, true),
        Mode::Ofb => ofb_keystream(cipher, state, data),
        Mode::Ctr => ctr_keystream(cipher, state, data),
        Mode::RandomDelta => random_delta_decrypt(cipher, state, data),
    }
}

/// ECB processes every block independently, in parallel.
fn ecb_crypt(
    cipher: &dyn BlockCipher,
    data: &[u8],
    decrypting: bool,
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let blocks: Vec<Vec<u8>> = data
        .par_chunks(block_size)
        .map(|block| {
            if decrypting {
                cipher.decrypt_block(block)
            } else {
                cipher.encrypt_block(block)
            }
        })
        .collect::<Result<_, _>>()?;

    Ok(blocks.concat())
}

/// CBC encryption is inherently serial: every block needs the previous
/// ciphertext block.
fn cbc_encrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let mut out = Vec::with_capacity(data.len());

    for block in data.chunks(block_size) {
        xor_in_place(&mut state.register, block);
        let ciphertext = cipher.encrypt_block(&state.register)?;
        state.register.copy_from_slice(&ciphertext);
        out.extend_from_slice(&ciphertext);
    }
    Ok(out)
}

/// CBC decryption knows every `C_{k-1}` up front, so the blocks fan out.
fn cbc_decrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let register = state.register.clone();

    let blocks: Vec<Vec<u8>> = data
        .par_chunks(block_size)
        .enumerate()
        .map(|(k, block)| {
            let previous = if k == 0 {
                &register[..]
            } else {
                &data[(k - 1) * block_size..k * block_size]
            };
            let mut plain = cipher.decrypt_block(block)?;
            xor_in_place(&mut plain, previous);
            Ok(plain)
        })
        .collect::<Result<_, CryptoError>>()?;

    if let Some(last) = data.chunks(block_size).next_back() {
        state.register.copy_from_slice(last);
    }
    Ok(blocks.concat())
}

fn pcbc_encrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let mut out = Vec::with_capacity(data.len());

    for block in data.chunks(block_size) {
        let mut mixed = block.to_vec();
        xor_in_place(&mut mixed, &state.prev_plain);
        xor_in_place(&mut mixed, &state.prev_cipher);

        let ciphertext = cipher.encrypt_block(&mixed)?;
        state.prev_plain.copy_from_slice(block);
        state.prev_cipher.copy_from_slice(&ciphertext);
        out.extend_from_slice(&ciphertext);
    }
    Ok(out)
}

fn pcbc_decrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let mut out = Vec::with_capacity(data.len());

    for block in data.chunks(block_size) {
        let mut plain = cipher.decrypt_block(block)?;
        xor_in_place(&mut plain, &state.prev_plain);
        xor_in_place(&mut plain, &state.prev_cipher);

        state.prev_plain.copy_from_slice(&plain);
        state.prev_cipher.copy_from_slice(block);
        out.extend_from_slice(&plain);
    }
    Ok(out)
}

/// CFB: encrypt the feedback register, XOR with the data, feed the raw
/// ciphertext back. The same primitive direction serves both ways, only
/// the feedback source differs.
fn cfb_crypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
    decrypting: bool,
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let mut out = Vec::with_capacity(data.len());

    for chunk in data.chunks(block_size) {
        let keystream = cipher.encrypt_block(&state.register)?;
        let mut processed = chunk.to_vec();
        xor_in_place(&mut processed, &keystream);

        let feedback = if decrypting { chunk } else { &processed[..] };
        // A short final chunk is zero-extended into the register.
        state.register.fill(0);
        state.register[..feedback.len()].copy_from_slice(feedback);
        out.extend_from_slice(&processed);
    }
    Ok(out)
}

/// OFB: the register chases the cipher's own output. Encrypt and decrypt
/// are the same function.
fn ofb_keystream(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let mut out = Vec::with_capacity(data.len());

    for chunk in data.chunks(block_size) {
        let keystream = cipher.encrypt_block(&state.register)?;
        state.register.copy_from_slice(&keystream);

        let mut processed = chunk.to_vec();
        xor_in_place(&mut processed, &keystream);
        out.extend_from_slice(&processed);
    }
    Ok(out)
}

/// CTR: keystream blocks are independent, so they fan out. The counter
/// lives in the trailing 8 bytes of the IV, big-endian, and the leading
/// bytes are an untouched nonce prefix.
fn ctr_keystream(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let iv = state.register.clone();
    let base_index = state.block_index;

    let blocks: Vec<Vec<u8>> = data
        .par_chunks(block_size)
        .enumerate()
        .map(|(k, chunk)| {
            let counter_block = counter_block(&iv, base_index + k as u64);
            let keystream = cipher.encrypt_block(&counter_block)?;
            let mut processed = chunk.to_vec();
            xor_in_place(&mut processed, &keystream);
            Ok(processed)
        })
        .collect::<Result<_, CryptoError>>()?;

    state.block_index += data.len().div_ceil(block_size) as u64;
    Ok(blocks.concat())
}

fn counter_block(iv: &[u8], index: u64) -> Vec<u8> {
    let mut block = iv.to_vec();
    let tail = block.len() - 8;
    let counter = u64::from_be_bytes(block[tail..].try_into().unwrap()).wrapping_add(index);
    block[tail..].copy_from_slice(&counter.to_be_bytes());
    block
}

/// RandomDelta: whiten each block with a deterministic per-index mask,
/// then run the cipher. Blocks are independent and fan out.
fn random_delta_encrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let iv_seed = delta_seed(&state.register);
    let base_index = state.block_index;

    let blocks: Vec<Vec<u8>> = data
        .par_chunks(block_size)
        .enumerate()
        .map(|(k, block)| {
            let index = base_index + k as u64;
            let mut whitened = block.to_vec();
            xor_in_place(&mut whitened, &delta_mask(iv_seed ^ index, block_size));
            cipher.encrypt_block(&whitened)
        })
        .collect::<Result<_, _>>()?;

    state.block_index += data.len().div_ceil(block_size) as u64;
    Ok(blocks.concat())
}

fn random_delta_decrypt(
    cipher: &dyn BlockCipher,
    state: &mut FeedbackState,
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let block_size = cipher.block_size();
    let iv_seed = delta_seed(&state.register);
    let base_index = state.block_index;

    let blocks: Vec<Vec<u8>> = data
        .par_chunks(block_size)
        .enumerate()
        .map(|(k, block)| {
            let index = base_index + k as u64;
            let mut plain = cipher.decrypt_block(block)?;
            xor_in_place(&mut plain, &delta_mask(iv_seed ^ index, block_size));
            Ok(plain)
        })
        .collect::<Result<_, CryptoError>>()?;

    state.block_index += data.len().div_ceil(block_size) as u64;
    Ok(blocks.concat())
}

/// RandomDelta seeds SplitMix64 with the first four IV bytes, read
/// little-endian, XORed with the block index.
fn delta_seed(iv: &[u8]) -> u64 {
    u32::from_le_bytes(iv[..4].try_into().unwrap()) as u64
}

fn delta_mask(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed;
    let mut mask = Vec::with_capacity(len.next_multiple_of(8));
    while mask.len() < len {
        mask.extend_from_slice(&splitmix64(&mut state).to_le_bytes());
    }
    mask.truncate(len);
    mask
}

/// SplitMix64 step, the usual finalizer constants.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::{counter_block, delta_mask, splitmix64};

    #[test]
    fn counter_increments_trailing_bytes_big_endian() {
        let iv = [0xAA, 0xBB, 0xCC, 0xDD, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF];
        let block = counter_block(&iv, 1);
        assert_eq!(&block[..8], &iv[..8], "nonce prefix must not change");
        assert_eq!(block[15], 0x00);
        assert_eq!(block[14], 0x01, "increment carries into byte 14");
    }

    #[test]
    fn counter_wraps_at_the_top() {
        let iv = [0xFF; 8];
        let block = counter_block(&iv, 1);
        assert_eq!(block, [0; 8]);
    }

    #[test]
    fn splitmix_is_deterministic() {
        let mut a = 42u64;
        let mut b = 42u64;
        assert_eq!(splitmix64(&mut a), splitmix64(&mut b));
        assert_eq!(a, b);
    }

    #[test]
    fn delta_masks_differ_between_blocks() {
        assert_ne!(delta_mask(7, 16), delta_mask(8, 16));
        assert_eq!(delta_mask(7, 16), delta_mask(7, 16));
        assert_eq!(delta_mask(7, 8), delta_mask(7, 16)[..8].to_vec());
    }
}
