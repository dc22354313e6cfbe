//! Diffie-Hellman key agreement over a fixed multiplicative group.
//!
//! The default group is RFC 3526 group 5 (the 1536-bit MODP safe prime,
//! generator 2). A participant draws a 256-bit private exponent, publishes
//! `y = g^x mod p` and combines a peer's public value into the shared
//! secret `peer_y^x mod p`. [`derive_key`] turns that integer into cipher
//! key material through SHA-256.
//!
//! The exchange is unauthenticated: anyone able to swap public values in
//! transit can sit in the middle. Pairing it with an authentication layer
//! is out of scope here.

use lazy_static::lazy_static;
use num_bigint::BigUint;
use num_traits::One;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{CryptoError, bail};

const PRIVATE_EXPONENT_BYTES: usize = 32;
const MAX_DERIVED_KEY: usize = 32;

lazy_static! {
    /// RFC 3526 group 5: the 1536-bit MODP prime.
    static ref GROUP5_P: BigUint = {
        let hex = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
                   020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
                   4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED\
                   EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05\
                   98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB\
                   9ED529077096966D670C354E4ABC9804F1746C08CA237327FFFFFFFFFFFFFFFF";
        BigUint::parse_bytes(hex.as_bytes(), 16).unwrap()
    };

    /// RFC 3526 group 5 generator.
    static ref GROUP5_G: BigUint = BigUint::from(2u32);
}

/// # Diffie-Hellman participant
///
/// Owns the group parameters, the private exponent `x` (which never leaves
/// the instance) and the public value `y`. Both sides of an exchange are
/// the same type; the initiator uses the built-in group and tells the
/// responder which `(p, g)` to construct with.
pub struct DhParticipant {
    p: BigUint,
    g: BigUint,
    x: BigUint,
    y: BigUint,
}

impl DhParticipant {
    /// Create a participant over the built-in RFC 3526 group 5.
    pub fn new_initiator() -> Self {
        Self::new_responder(GROUP5_P.clone(), GROUP5_G.clone())
    }

    /// Create a participant over a caller-supplied group.
    pub fn new_responder(p: BigUint, g: BigUint) -> Self {
        loop {
            let x = random_exponent();
            let y = g.modpow(&x, &p);
            // Degenerate public values would leak the absence of a secret;
            // with a 256-bit exponent this retries essentially never.
            let upper = &p - BigUint::one();
            if y > BigUint::one() && y < upper {
                return Self { p, g, x, y };
            }
        }
    }

    /// The public value `y = g^x mod p`, safe to publish.
    pub fn public_value(&self) -> &BigUint {
        &self.y
    }

    /// The group parameters `(p, g)`, safe to publish.
    pub fn group(&self) -> (&BigUint, &BigUint) {
        (&self.p, &self.g)
    }

    /// Combine a peer's public value into the shared secret
    /// `peer_y^x mod p`.
    pub fn shared_secret(&self, peer_public: &BigUint) -> BigUint {
        peer_public.modpow(&self.x, &self.p)
    }
}

/// Draw a 256-bit private exponent: top bit cleared, guaranteed non-zero.
fn random_exponent() -> BigUint {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; PRIVATE_EXPONENT_BYTES];
    loop {
        rng.fill_bytes(&mut bytes);
        bytes[0] &= 0x7F;
        if bytes.iter().any(|&byte| byte != 0) {
            return BigUint::from_bytes_be(&bytes);
        }
    }
}

/// Derive `len` bytes of key material from a shared secret: SHA-256 over
/// the secret's minimal two's-complement big-endian encoding, truncated.
///
/// Keys derived from the same secret are prefixes of each other, so both
/// sides can derive different lengths for different ciphers and still
/// agree. `len` must not exceed the 32-byte hash output.
pub fn derive_key(secret: &BigUint, len: usize) -> Result<Vec<u8>, CryptoError> {
    bail!(
        len > MAX_DERIVED_KEY,
        CryptoError::KeySizeTooLarge {
            requested: len,
            max: MAX_DERIVED_KEY
        }
    );

    let digest = Sha256::digest(signed_magnitude_bytes(secret));
    Ok(digest[..len].to_vec())
}

/// Minimal two's-complement encoding of a non-negative integer: the
/// big-endian magnitude with a leading zero byte whenever the top bit of
/// the first byte is set. Matches the `BigInteger.toByteArray` convention
/// of JVM/.NET peers, so derived keys are interoperable.
fn signed_magnitude_bytes(value: &BigUint) -> Vec<u8> {
    let magnitude = value.to_bytes_be();
    if magnitude[0] & 0x80 != 0 {
        let mut bytes = Vec::with_capacity(magnitude.len() + 1);
        bytes.push(0);
        bytes.extend_from_slice(&magnitude);
        bytes
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::signed_magnitude_bytes;
    use num_bigint::BigUint;

    #[test]
    fn encoding_prepends_zero_for_high_top_bit() {
        assert_eq!(signed_magnitude_bytes(&BigUint::from(0x80u32)), [0x00, 0x80]);
        assert_eq!(signed_magnitude_bytes(&BigUint::from(0x7Fu32)), [0x7F]);
        assert_eq!(
            signed_magnitude_bytes(&BigUint::from(0x8000u32)),
            [0x00, 0x80, 0x00]
        );
    }

    #[test]
    fn zero_encodes_as_one_byte() {
        assert_eq!(signed_magnitude_bytes(&BigUint::from(0u32)), [0x00]);
    }
}
