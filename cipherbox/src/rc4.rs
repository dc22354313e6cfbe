//! The RC4 stream cipher.

use crate::{CryptoError, StreamCipher, bail};

/// # RC4 state
///
/// A 256-byte permutation plus the two PRGA indices. The key-scheduling
/// algorithm runs once in [`Rc4::new`]; after that the state only evolves
/// forward, one keystream byte per input byte. Create a fresh instance per
/// message — the keystream is never rewound.
pub struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Initialize the permutation from a key of 1 to 256 bytes (KSA).
    pub fn new<K>(key: K) -> Result<Self, CryptoError>
    where
        K: AsRef<[u8]>,
    {
        let key = key.as_ref();
        bail!(
            key.is_empty() || key.len() > 256,
            CryptoError::InvalidKeySize {
                cipher: "RC4",
                expected: "1 to 256",
                actual: key.len()
            }
        );

        let mut s = [0u8; 256];
        for (i, byte) in s.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j
                .wrapping_add(s[i])
                .wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Ok(Self { s, i: 0, j: 0 })
    }

    /// Produce the next keystream byte (PRGA).
    fn keystream_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);

        let index = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[index as usize]
    }

    /// XOR the keystream into `data` in place.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte ^= self.keystream_byte();
        }
    }
}

impl StreamCipher for Rc4 {
    fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out);
        out
    }
}
