use num_bigint::BigUint;
use num_traits::One;

use crate::dh::{DhParticipant, derive_key};
use crate::{Algorithm, CipherContext, CryptoError, Mode, Padding, random_iv};

#[test]
fn participants_agree_on_the_shared_secret() {
    let alice = DhParticipant::new_initiator();
    let (p, g) = alice.group();
    let bob = DhParticipant::new_responder(p.clone(), g.clone());

    assert_eq!(
        alice.shared_secret(bob.public_value()),
        bob.shared_secret(alice.public_value())
    );
}

#[test]
fn distinct_participants_produce_distinct_public_values() {
    // 256-bit exponents colliding would mean the RNG is broken.
    let alice = DhParticipant::new_initiator();
    let bob = DhParticipant::new_initiator();
    assert_ne!(alice.public_value(), bob.public_value());
}

#[test]
fn public_value_stays_inside_the_group() {
    let participant = DhParticipant::new_initiator();
    let (p, _) = participant.group();
    let upper = p - BigUint::one();

    assert!(participant.public_value() > &BigUint::one());
    assert!(participant.public_value() < &upper);
}

#[test]
fn derived_keys_share_a_prefix() -> Result<(), CryptoError> {
    let secret = BigUint::parse_bytes(b"DEADBEEFCAFEBABE0123456789ABCDEF", 16).unwrap();

    let long = derive_key(&secret, 32)?;
    for len in [0, 1, 8, 16, 31] {
        let short = derive_key(&secret, len)?;
        assert_eq!(short.as_slice(), &long[..len]);
    }
    Ok(())
}

#[test]
fn derive_key_is_stable_for_a_given_secret() -> Result<(), CryptoError> {
    let secret = BigUint::from(0xC0FFEEu32);
    assert_eq!(derive_key(&secret, 16)?, derive_key(&secret, 16)?);
    Ok(())
}

#[test]
fn derive_key_rejects_more_than_the_hash_yields() {
    let secret = BigUint::from(42u32);
    assert!(matches!(
        derive_key(&secret, 33),
        Err(CryptoError::KeySizeTooLarge {
            requested: 33,
            max: 32
        })
    ));
}

#[test]
fn agreed_key_drives_a_cipher_end_to_end() -> Result<(), CryptoError> {
    // Scenario: Alice and Bob agree on a key, then move a UTF-8 message
    // through LOKI97-CBC with it.
    let alice = DhParticipant::new_initiator();
    let (p, g) = alice.group();
    let bob = DhParticipant::new_responder(p.clone(), g.clone());

    let alice_key = derive_key(&alice.shared_secret(bob.public_value()), 32)?;
    let bob_key = derive_key(&bob.shared_secret(alice.public_value()), 32)?;
    assert_eq!(alice_key, bob_key);

    let iv = random_iv(16);
    let message = "schrödinger's crème brûlée, encrypted ✓";

    let sender = CipherContext::with_algorithm(
        Algorithm::Loki97,
        &alice_key,
        Mode::Cbc,
        Padding::Pkcs7,
        Some(&iv),
    )?;
    let ciphertext = sender.encrypt(message.as_bytes())?;

    let receiver = CipherContext::with_algorithm(
        Algorithm::Loki97,
        &bob_key,
        Mode::Cbc,
        Padding::Pkcs7,
        Some(&iv),
    )?;
    let recovered = receiver.decrypt(&ciphertext)?;
    assert_eq!(message.as_bytes(), recovered.as_slice());
    Ok(())
}
