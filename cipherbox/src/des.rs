//! DES and Triple-DES (EDE) block ciphers.
//!
//! Classical FIPS 46-3 DES over 8-byte blocks with an 8-byte key whose
//! parity bits are ignored. All permutation tables are 0-indexed with bit 0
//! as the most significant bit of the most significant byte, and the
//! S-boxes are stored in direct 6-bit-index order so the row/column
//! shuffling is already baked in.

use crate::{BlockCipher, CryptoError, bail};

const NUM_ROUNDS: usize = 16;
const DES_KEY_SIZE: usize = 8;
const DES_BLOCK_SIZE: usize = 8;
const TRIPLE_DES_KEY_SIZE: usize = 24;

#[rustfmt::skip]
const INITIAL_PERMUTATION: [u8; 64] = [
    57, 49, 41, 33, 25, 17,  9, 1, 59, 51, 43, 35, 27, 19, 11, 3,
    61, 53, 45, 37, 29, 21, 13, 5, 63, 55, 47, 39, 31, 23, 15, 7,
    56, 48, 40, 32, 24, 16,  8, 0, 58, 50, 42, 34, 26, 18, 10, 2,
    60, 52, 44, 36, 28, 20, 12, 4, 62, 54, 46, 38, 30, 22, 14, 6,
];

#[rustfmt::skip]
const FINAL_PERMUTATION: [u8; 64] = [
    39, 7, 47, 15, 55, 23, 63, 31, 38, 6, 46, 14, 54, 22, 62, 30,
    37, 5, 45, 13, 53, 21, 61, 29, 36, 4, 44, 12, 52, 20, 60, 28,
    35, 3, 43, 11, 51, 19, 59, 27, 34, 2, 42, 10, 50, 18, 58, 26,
    33, 1, 41,  9, 49, 17, 57, 25, 32, 0, 40,  8, 48, 16, 56, 24,
];

#[rustfmt::skip]
const EXPANSION: [u8; 48] = [
    31,  0,  1,  2,  3,  4,  3,  4,  5,  6,  7,  8,
     7,  8,  9, 10, 11, 12, 11, 12, 13, 14, 15, 16,
    15, 16, 17, 18, 19, 20, 19, 20, 21, 22, 23, 24,
    23, 24, 25, 26, 27, 28, 27, 28, 29, 30, 31,  0,
];

// Each box maps a 6-bit value to a 4-bit value.
#[rustfmt::skip]
const S_BOXES: [[u8; 64]; 8] = [
    [
        14,  0,  4, 15, 13,  7,  1,  4,  2, 14, 15,  2, 11, 13,  8,  1,
         3, 10, 10,  6,  6, 12, 12, 11,  5,  9,  9,  5,  0,  3,  7,  8,
         4, 15,  1, 12, 14,  8,  8,  2, 13,  4,  6,  9,  2,  1, 11,  7,
        15,  5, 12, 11,  9,  3,  7, 14,  3, 10, 10,  0,  5,  6,  0, 13,
    ],
    [
        15,  3,  1, 13,  8,  4, 14,  7,  6, 15, 11,  2,  3,  8,  4, 14,
         9, 12,  7,  0,  2,  1, 13, 10, 12,  6,  0,  9,  5, 11, 10,  5,
         0, 13, 14,  8,  7, 10, 11,  1, 10,  3,  4, 15, 13,  4,  1,  2,
         5, 11,  8,  6, 12,  7,  6, 12,  9,  0,  3,  5,  2, 14, 15,  9,
    ],
    [
        10, 13,  0,  7,  9,  0, 14,  9,  6,  3,  3,  4, 15,  6,  5, 10,
         1,  2, 13,  8, 12,  5,  7, 14, 11, 12,  4, 11,  2, 15,  8,  1,
        13,  1,  6, 10,  4, 13,  9,  0,  8,  6, 15,  9,  3,  8,  0,  7,
        11,  4,  1, 15,  2, 14, 12,  3,  5, 11, 10,  5, 14,  2,  7, 12,
    ],
    [
         7, 13, 13,  8, 14, 11,  3,  5,  0,  6,  6, 15,  9,  0, 10,  3,
         1,  4,  2,  7,  8,  2,  5, 12, 11,  1, 12, 10,  4, 14, 15,  9,
        10,  3,  6, 15,  9,  0,  0,  6, 12, 10, 11,  1,  7, 13, 13,  8,
        15,  9,  1,  4,  3,  5, 14, 11,  5, 12,  2,  7,  8,  2,  4, 14,
    ],
    [
         2, 14, 12, 11,  4,  2,  1, 12,  7,  4, 10,  7, 11, 13,  6,  1,
         8,  5,  5,  0,  3, 15, 15, 10, 13,  3,  0,  9, 14,  8,  9,  6,
         4, 11,  2,  8,  1, 12, 11,  7, 10,  1, 13, 14,  7,  2,  8, 13,
        15,  6,  9, 15, 12,  0,  5,  9,  6, 10,  3,  4,  0,  5, 14,  3,
    ],
    [
        12, 10,  1, 15, 10,  4, 15,  2,  9,  7,  2, 12,  6,  9,  8,  5,
         0,  6, 13,  1,  3, 13,  4, 14, 14,  0,  7, 11,  5,  3, 11,  8,
         9,  4, 14,  3, 15,  2,  5, 12,  2,  9,  8,  5, 12, 15,  3, 10,
         7, 11,  0, 14,  4,  1, 10,  7,  1,  6, 13,  0, 11,  8,  6, 13,
    ],
    [
         4, 13, 11,  0,  2, 11, 14,  7, 15,  4,  0,  9,  8,  1, 13, 10,
         3, 14, 12,  3,  9,  5,  7, 12,  5,  2, 10, 15,  6,  8,  1,  6,
         1,  6,  4, 11, 11, 13, 13,  8, 12,  1,  3,  4,  7, 10, 14,  7,
        10,  9, 15,  5,  6,  0,  8, 15,  0, 14,  5,  2,  9,  3,  2, 12,
    ],
    [
        13,  1,  2, 15,  8, 13,  4,  8,  6, 10, 15,  3, 11,  7,  1,  4,
        10, 12,  9,  5,  3,  6, 14, 11,  5,  0,  0, 14, 12,  9,  7,  2,
         7,  2, 11,  1,  4, 14,  1,  7,  9,  4, 12, 10, 14,  8,  2, 13,
         0, 15,  6, 12, 10,  9, 13,  0, 15,  3,  3,  5,  5,  6,  8, 11,
    ],
];

#[rustfmt::skip]
const PERMUTATION: [u8; 32] = [
    15, 6, 19, 20, 28, 11, 27, 16,  0, 14, 22, 25,  4, 17, 30,  9,
     1, 7, 23, 13, 31, 26,  2,  8, 18, 12, 29,  5, 21, 10,  3, 24,
];

// Key schedule permutations.

#[rustfmt::skip]
const PC_1: [u8; 56] = [
    56, 48, 40, 32, 24, 16,  8,  0, 57, 49, 41, 33, 25, 17,
     9,  1, 58, 50, 42, 34, 26, 18, 10,  2, 59, 51, 43, 35,
    62, 54, 46, 38, 30, 22, 14,  6, 61, 53, 45, 37, 29, 21,
    13,  5, 60, 52, 44, 36, 28, 20, 12,  4, 27, 19, 11,  3,
];

#[rustfmt::skip]
const PC_2: [u8; 48] = [
    13, 16, 10, 23,  0,  4,  2, 27, 14,  5, 20,  9,
    22, 18, 11,  3, 25,  7, 15,  6, 26, 19, 12,  1,
    40, 51, 30, 36, 46, 54, 29, 39, 50, 44, 32, 47,
    43, 48, 38, 55, 33, 52, 45, 41, 49, 35, 28, 31,
];

// How many bits each key half rotates left before a round key is taken.
const ROTATION_SCHEDULE: [u8; NUM_ROUNDS] = [1, 1, 2, 2, 2, 2, 2, 2, 1, 2, 2, 2, 2, 2, 2, 1];

/// Move bits of `value` (the low `in_bits` bits, numbered 0 from the MSB)
/// into the positions named by `table`. The result is `table.len()` bits.
fn permute(value: u64, in_bits: u32, table: &[u8]) -> u64 {
    let mut out = 0u64;
    for &src in table {
        out = (out << 1) | ((value >> (in_bits - 1 - src as u32)) & 1);
    }
    out
}

fn rotate_left_28(half: u32, bits: u8) -> u32 {
    ((half << bits) | (half >> (28 - bits))) & 0x0FFF_FFFF
}

/// The DES round function: expand the 32-bit half to 48 bits, mix in the
/// round key, run the eight S-boxes and apply the final 32-bit permutation.
fn feistel(half: u32, round_key: u64) -> u32 {
    let mixed = permute(half as u64, 32, &EXPANSION) ^ round_key;

    let mut substituted = 0u32;
    for (i, s_box) in S_BOXES.iter().enumerate() {
        let six_bits = ((mixed >> (42 - 6 * i)) & 0x3F) as usize;
        substituted = (substituted << 4) | s_box[six_bits] as u32;
    }

    permute(substituted as u64, 32, &PERMUTATION) as u32
}

/// # DES block cipher
///
/// Keyed at construction; the 16 round keys are derived once and stay
/// read-only, so a `Des` instance can be shared across threads.
pub struct Des {
    round_keys: [u64; NUM_ROUNDS],
}

impl Des {
    /// Build a DES instance from an 8-byte key. The 8 parity bits are
    /// discarded by PC-1, so keys differing only in parity are equivalent.
    pub fn new<K>(key: K) -> Result<Self, CryptoError>
    where
        K: AsRef<[u8]>,
    {
        let key = key.as_ref();
        bail!(
            key.len() != DES_KEY_SIZE,
            CryptoError::InvalidKeySize {
                cipher: "DES",
                expected: "8",
                actual: key.len()
            }
        );

        let key = u64::from_be_bytes(key.try_into().unwrap());
        Ok(Self {
            round_keys: expand_key(key),
        })
    }

    /// Run the cipher over one 64-bit block. Decryption is the same
    /// schedule walked backwards.
    pub(crate) fn crypt(&self, block: u64, decrypting: bool) -> u64 {
        let permuted = permute(block, 64, &INITIAL_PERMUTATION);
        let mut left = (permuted >> 32) as u32;
        let mut right = permuted as u32;

        for i in 0..NUM_ROUNDS {
            let round_key = if decrypting {
                self.round_keys[NUM_ROUNDS - 1 - i]
            } else {
                self.round_keys[i]
            };
            let next = left ^ feistel(right, round_key);
            left = right;
            right = next;
        }

        // The halves are not swapped after the last round.
        let preoutput = ((right as u64) << 32) | left as u64;
        permute(preoutput, 64, &FINAL_PERMUTATION)
    }
}

fn expand_key(key: u64) -> [u64; NUM_ROUNDS] {
    let stripped = permute(key, 64, &PC_1);
    let mut left = ((stripped >> 28) & 0x0FFF_FFFF) as u32;
    let mut right = (stripped & 0x0FFF_FFFF) as u32;

    let mut round_keys = [0u64; NUM_ROUNDS];
    for (round_key, &bits) in round_keys.iter_mut().zip(&ROTATION_SCHEDULE) {
        left = rotate_left_28(left, bits);
        right = rotate_left_28(right, bits);
        let combined = ((left as u64) << 28) | right as u64;
        *round_key = permute(combined, 56, &PC_2);
    }
    round_keys
}

impl BlockCipher for Des {
    fn name(&self) -> &'static str {
        "DES"
    }

    fn block_size(&self) -> usize {
        DES_BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block = check_des_block(block)?;
        Ok(self.crypt(block, false).to_be_bytes().to_vec())
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block = check_des_block(block)?;
        Ok(self.crypt(block, true).to_be_bytes().to_vec())
    }
}

fn check_des_block(block: &[u8]) -> Result<u64, CryptoError> {
    bail!(
        block.len() != DES_BLOCK_SIZE,
        CryptoError::InvalidBlockSize {
            expected: DES_BLOCK_SIZE,
            actual: block.len()
        }
    );
    Ok(u64::from_be_bytes(block.try_into().unwrap()))
}

/// # Triple-DES in EDE composition
///
/// Three independently keyed [`Des`] instances from a 24-byte key split as
/// `K1 || K2 || K3`:
///
/// - encrypt: `E_K3(D_K2(E_K1(block)))`
/// - decrypt: `D_K1(E_K2(D_K3(block)))`
///
/// Setting `K1 == K2 == K3` degenerates to single DES.
pub struct TripleDes {
    first: Des,
    second: Des,
    third: Des,
}

impl TripleDes {
    pub fn new<K>(key: K) -> Result<Self, CryptoError>
    where
        K: AsRef<[u8]>,
    {
        let key = key.as_ref();
        bail!(
            key.len() != TRIPLE_DES_KEY_SIZE,
            CryptoError::InvalidKeySize {
                cipher: "TripleDES",
                expected: "24",
                actual: key.len()
            }
        );

        Ok(Self {
            first: Des::new(&key[..8])?,
            second: Des::new(&key[8..16])?,
            third: Des::new(&key[16..])?,
        })
    }
}

impl BlockCipher for TripleDes {
    fn name(&self) -> &'static str {
        "TripleDES"
    }

    fn block_size(&self) -> usize {
        DES_BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block = check_des_block(block)?;
        let stage = self.first.crypt(block, false);
        let stage = self.second.crypt(stage, true);
        Ok(self.third.crypt(stage, false).to_be_bytes().to_vec())
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block = check_des_block(block)?;
        let stage = self.third.crypt(block, true);
        let stage = self.second.crypt(stage, false);
        Ok(self.first.crypt(stage, true).to_be_bytes().to_vec())
    }
}
