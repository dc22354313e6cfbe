use super::hamming_distance;
use crate::{BlockCipher, CryptoError, Loki97};

fn sample_key() -> Vec<u8> {
    (0u8..16).collect()
}

#[test]
fn loki97_round_trip_with_128_bit_key() -> Result<(), CryptoError> {
    let cipher = Loki97::new(sample_key())?;
    let block = [0xAA; 16];

    let ciphertext = cipher.encrypt_block(&block)?;
    assert_ne!(block.as_slice(), ciphertext.as_slice());

    let deciphered = cipher.decrypt_block(&ciphertext)?;
    assert_eq!(block.as_slice(), deciphered.as_slice());
    Ok(())
}

macro_rules! loki97_key_size_round_trips {
    ($( $fn_name:ident: $key_len:expr ),*$(,)?) => {
        $(
            #[test]
            fn $fn_name() -> Result<(), CryptoError> {
                let key: Vec<u8> = (0..$key_len as u8).collect();
                let cipher = Loki97::new(key)?;
                let block = *b"sixteen byte blk";

                let ciphertext = cipher.encrypt_block(&block)?;
                let deciphered = cipher.decrypt_block(&ciphertext)?;
                assert_eq!(block.as_slice(), deciphered.as_slice());
                Ok(())
            }
        )*
    };
}

loki97_key_size_round_trips! {
    loki97_round_trip_16_byte_key: 16,
    loki97_round_trip_24_byte_key: 24,
    loki97_round_trip_32_byte_key: 32,
}

#[test]
fn loki97_rejects_other_key_sizes() {
    for len in [0, 8, 15, 20, 33] {
        assert!(
            matches!(
                Loki97::new(vec![0u8; len]),
                Err(CryptoError::InvalidKeySize { actual, .. }) if actual == len
            ),
            "key of {len} bytes must be rejected"
        );
    }
}

#[test]
fn loki97_rejects_wrong_block_sizes() -> Result<(), CryptoError> {
    let cipher = Loki97::new(sample_key())?;
    assert!(matches!(
        cipher.encrypt_block(&[0u8; 8]),
        Err(CryptoError::InvalidBlockSize {
            expected: 16,
            actual: 8
        })
    ));
    Ok(())
}

#[test]
fn loki97_plaintext_avalanche() -> Result<(), CryptoError> {
    let cipher = Loki97::new(sample_key())?;
    let base = [0x5C; 16];
    let base_ct = cipher.encrypt_block(&base)?;

    for bit in [0usize, 17, 42, 63, 77, 101, 127] {
        let mut flipped = base;
        flipped[bit / 8] ^= 1 << (7 - bit % 8);

        let ct = cipher.encrypt_block(&flipped)?;
        let distance = hamming_distance(&base_ct, &ct);
        assert!(
            distance > 40,
            "plaintext bit {bit} diffused into only {distance} of 128 ciphertext bits"
        );
    }
    Ok(())
}

#[test]
fn loki97_key_avalanche() -> Result<(), CryptoError> {
    let base_key = sample_key();
    let block = [0x5C; 16];
    let base_ct = Loki97::new(&base_key)?.encrypt_block(&block)?;

    for bit in [0usize, 29, 64, 90, 127] {
        let mut key = base_key.clone();
        key[bit / 8] ^= 1 << (7 - bit % 8);

        let ct = Loki97::new(key)?.encrypt_block(&block)?;
        let distance = hamming_distance(&base_ct, &ct);
        assert!(
            distance > 40,
            "key bit {bit} diffused into only {distance} of 128 ciphertext bits"
        );
    }
    Ok(())
}

#[test]
fn loki97_is_deterministic_per_key() -> Result<(), CryptoError> {
    let block = [0x77; 16];
    let first = Loki97::new(sample_key())?.encrypt_block(&block)?;
    let second = Loki97::new(sample_key())?.encrypt_block(&block)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn loki97_alternate_polynomial_still_round_trips() -> Result<(), CryptoError> {
    // x^8 + x^4 + x^3 + x^2 + 1, another irreducible choice.
    let cipher = Loki97::with_poly(sample_key(), 0x1D)?;
    let block = *b"polynomial check";

    let ciphertext = cipher.encrypt_block(&block)?;
    let deciphered = cipher.decrypt_block(&ciphertext)?;
    assert_eq!(block.as_slice(), deciphered.as_slice());

    // And it is a genuinely different cipher.
    let default_ct = Loki97::new(sample_key())?.encrypt_block(&block)?;
    assert_ne!(default_ct, ciphertext);
    Ok(())
}
