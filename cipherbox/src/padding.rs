//! Padding strategies for the block-aligned modes of operation.

use rand::Rng;

/// How plaintext is expanded to a whole number of blocks.
///
/// Every scheme except [`Padding::Zeros`] always appends between 1 and
/// `block_size` bytes, so an already aligned input grows by a full block
/// and removal is unambiguous. `Zeros` appends nothing when the input is
/// aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Append zero bytes up to the block boundary. Removal strips every
    /// trailing zero, which loses data when the plaintext itself ends in
    /// `0x00` — only use this for text-like payloads.
    Zeros,

    /// PKCS#7: append `n` bytes each of value `n`.
    Pkcs7,

    /// ANSI X9.23: append `n - 1` zero bytes and a final length byte `n`.
    AnsiX923,

    /// ISO 10126: append `n - 1` random bytes and a final length byte `n`.
    Iso10126,
}

impl Padding {
    /// Append padding in place so `buf.len()` becomes a multiple of
    /// `block_size`.
    pub fn pad(&self, buf: &mut Vec<u8>, block_size: usize) {
        let rem = buf.len() % block_size;
        let pad_len = block_size - rem;

        match self {
            Padding::Zeros => {
                if rem != 0 {
                    buf.extend(std::iter::repeat_n(0u8, pad_len));
                }
            }
            Padding::Pkcs7 => buf.extend(std::iter::repeat_n(pad_len as u8, pad_len)),
            Padding::AnsiX923 => {
                buf.extend(std::iter::repeat_n(0u8, pad_len - 1));
                buf.push(pad_len as u8);
            }
            Padding::Iso10126 => {
                let mut rng = rand::thread_rng();
                for _ in 0..pad_len - 1 {
                    buf.push(rng.r#gen());
                }
                buf.push(pad_len as u8);
            }
        }
    }

    /// Strip padding in place, returning the number of bytes removed.
    ///
    /// Removal is lenient: when the trailing bytes do not form valid
    /// padding the buffer is left untouched and 0 is returned, leaving the
    /// "garbage in, garbage out" interpretation to the caller instead of
    /// acting as a padding oracle.
    pub fn unpad(&self, buf: &mut Vec<u8>, block_size: usize) -> usize {
        match self {
            Padding::Zeros => {
                let keep = buf.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
                let removed = buf.len() - keep;
                buf.truncate(keep);
                removed
            }
            Padding::Pkcs7 => {
                let Some(pad_len) = trailing_length_byte(buf, block_size) else {
                    return 0;
                };
                let body = buf.len() - pad_len;
                if !buf[body..].iter().all(|&b| b as usize == pad_len) {
                    return 0;
                }
                buf.truncate(body);
                pad_len
            }
            Padding::AnsiX923 => {
                let Some(pad_len) = trailing_length_byte(buf, block_size) else {
                    return 0;
                };
                let body = buf.len() - pad_len;
                if !buf[body..buf.len() - 1].iter().all(|&b| b == 0) {
                    return 0;
                }
                buf.truncate(body);
                pad_len
            }
            Padding::Iso10126 => {
                // The fill bytes are random, only the length byte counts.
                let Some(pad_len) = trailing_length_byte(buf, block_size) else {
                    return 0;
                };
                buf.truncate(buf.len() - pad_len);
                pad_len
            }
        }
    }
}

/// Read the final byte as a padding length and validate its range.
fn trailing_length_byte(buf: &[u8], block_size: usize) -> Option<usize> {
    let pad_len = *buf.last()? as usize;
    if pad_len == 0 || pad_len > block_size || pad_len > buf.len() {
        return None;
    }
    Some(pad_len)
}
