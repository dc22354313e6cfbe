use rand::Rng;

use crate::{CryptoError, bail};

/// Generate a pseudo-random IV of `block_size` bytes.
///
/// ## Example
///
/// ```rust
/// let iv = cipherbox::random_iv(16);
/// assert_eq!(iv.len(), 16);
/// ```
pub fn random_iv(block_size: usize) -> Vec<u8> {
    let mut iv = vec![0u8; block_size];
    rand::thread_rng().fill(iv.as_mut_slice());
    iv
}

/// Parse an IV from a hex-encoded string, validating its decoded
/// length against the cipher block size.
pub fn iv_from_hex<V>(iv_hex: V, block_size: usize) -> Result<Vec<u8>, CryptoError>
where
    V: AsRef<[u8]>,
{
    let iv = hex::decode(iv_hex)?;
    bail!(
        iv.len() != block_size,
        CryptoError::InvalidIv {
            expected: block_size,
            actual: iv.len()
        }
    );

    Ok(iv)
}

/// XOR `source` into `target`, truncated to the shorter of the two.
pub(crate) fn xor_in_place(target: &mut [u8], source: &[u8]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t ^= s;
    }
}
