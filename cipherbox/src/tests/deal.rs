use super::hamming_distance;
use crate::{BlockCipher, CryptoError, Deal};

macro_rules! deal_round_trips {
    ($( $fn_name:ident: $key_len:expr ),*$(,)?) => {
        $(
            #[test]
            fn $fn_name() -> Result<(), CryptoError> {
                let key: Vec<u8> = (0..$key_len as u8).map(|b| b.wrapping_mul(7)).collect();
                let cipher = Deal::new(key)?;
                let block = *b"a deal of blocks";

                let ciphertext = cipher.encrypt_block(&block)?;
                assert_ne!(block.as_slice(), ciphertext.as_slice());

                let deciphered = cipher.decrypt_block(&ciphertext)?;
                assert_eq!(block.as_slice(), deciphered.as_slice());
                Ok(())
            }
        )*
    };
}

deal_round_trips! {
    deal_round_trip_16_byte_key: 16,
    deal_round_trip_24_byte_key: 24,
    deal_round_trip_32_byte_key: 32,
}

#[test]
fn deal_rejects_other_key_sizes() {
    for len in [0, 8, 15, 20, 33] {
        assert!(
            matches!(
                Deal::new(vec![0u8; len]),
                Err(CryptoError::InvalidKeySize { actual, .. }) if actual == len
            ),
            "key of {len} bytes must be rejected"
        );
    }
}

#[test]
fn deal_key_variants_produce_distinct_ciphertexts() -> Result<(), CryptoError> {
    // A 16-byte key and its 32-byte doubling must not collapse into the
    // same schedule.
    let short_key: Vec<u8> = (0..16).collect();
    let long_key = short_key.repeat(2);
    let block = [0x3C; 16];

    let short_ct = Deal::new(short_key)?.encrypt_block(&block)?;
    let long_ct = Deal::new(long_key)?.encrypt_block(&block)?;
    assert_ne!(short_ct, long_ct);
    Ok(())
}

#[test]
fn deal_plaintext_avalanche() -> Result<(), CryptoError> {
    let key: Vec<u8> = (0..16).collect();
    let cipher = Deal::new(key)?;
    let base = [0xA5; 16];
    let base_ct = cipher.encrypt_block(&base)?;

    for bit in [3usize, 40, 66, 93, 120] {
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
