use std::io::Cursor;

use crate::{Algorithm, CipherContext, CryptoError, Mode, Padding};

// Three full 64 KiB chunks plus a ragged tail.
const BODY_LEN: usize = 3 * 64 * 1024 + 3395;

fn body() -> Vec<u8> {
    (0..BODY_LEN).map(|i| (i * 31 % 251) as u8).collect()
}

fn context_for(mode: Mode, padding: Padding) -> Result<CipherContext, CryptoError> {
    let key: Vec<u8> = (0..16).collect();
    let iv = mode.requires_iv().then(|| vec![0x42u8; 16]);
    CipherContext::with_algorithm(Algorithm::Loki97, &key, mode, padding, iv.as_deref())
}

macro_rules! stream_round_trips {
    ($( $fn_name:ident: ( $mode:expr , $padding:expr ) ),*$(,)?) => {
        $(
            #[test]
            fn $fn_name() -> Result<(), CryptoError> {
                let body = body();
                let context = context_for($mode, $padding)?;

                let mut ciphertext = Vec::new();
                context.encrypt_stream(&mut Cursor::new(&body), &mut ciphertext)?;

                let mut recovered = Vec::new();
                context.decrypt_stream(&mut Cursor::new(&ciphertext), &mut recovered)?;

                assert_eq!(
                    body, recovered,
                    "stream round trip failed for {:?}/{:?}",
                    $mode, $padding
                );
                Ok(())
            }
        )*
    };
}

stream_round_trips! {
    stream_ecb_pkcs7:         (Mode::Ecb,         Padding::Pkcs7),
    stream_cbc_pkcs7:         (Mode::Cbc,         Padding::Pkcs7),
    stream_cbc_ansi_x923:     (Mode::Cbc,         Padding::AnsiX923),
    stream_pcbc_iso_10126:    (Mode::Pcbc,        Padding::Iso10126),
    stream_cfb_pkcs7:         (Mode::Cfb,         Padding::Pkcs7),
    stream_ofb_pkcs7:         (Mode::Ofb,         Padding::Pkcs7),
    stream_ctr_pkcs7:         (Mode::Ctr,         Padding::Pkcs7),
    stream_random_delta_pkcs7:(Mode::RandomDelta, Padding::Pkcs7),
}

#[test]
fn stream_output_matches_buffer_output() -> Result<(), CryptoError> {
    // Chunked processing must chain its registers exactly like one big
    // buffer call.
    let body = body();
    for mode in [Mode::Cbc, Mode::Cfb, Mode::Ofb, Mode::Ctr, Mode::RandomDelta] {
        let context = context_for(mode, Padding::Pkcs7)?;

        let buffered = context.encrypt(&body)?;
        let mut streamed = Vec::new();
        context.encrypt_stream(&mut Cursor::new(&body), &mut streamed)?;

        assert_eq!(buffered, streamed, "{mode:?} streams differently");
    }
    Ok(())
}

#[test]
fn stream_padding_only_touches_the_final_chunk() -> Result<(), CryptoError> {
    let body = body();
    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;

    let mut ciphertext = Vec::new();
    context.encrypt_stream(&mut Cursor::new(&body), &mut ciphertext)?;

    let expected = BODY_LEN + 16 - BODY_LEN % 16;
    assert_eq!(expected, ciphertext.len());
    Ok(())
}

#[test]
fn stream_modes_do_not_pad_streams() -> Result<(), CryptoError> {
    let body = body();
    for mode in [Mode::Cfb, Mode::Ofb, Mode::Ctr] {
        let context = context_for(mode, Padding::Pkcs7)?;
        let mut ciphertext = Vec::new();
        context.encrypt_stream(&mut Cursor::new(&body), &mut ciphertext)?;
        assert_eq!(BODY_LEN, ciphertext.len(), "{mode:?} expanded the stream");
    }
    Ok(())
}

#[test]
fn exact_chunk_multiple_still_round_trips() -> Result<(), CryptoError> {
    // A body that ends exactly on the 64 KiB boundary exercises the
    // zero-length final read.
    let body: Vec<u8> = (0..2 * 64 * 1024).map(|i| (i % 241) as u8).collect();
    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;

    let mut ciphertext = Vec::new();
    context.encrypt_stream(&mut Cursor::new(&body), &mut ciphertext)?;
    assert_eq!(body.len() + 16, ciphertext.len(), "full final block of padding");

    let mut recovered = Vec::new();
    context.decrypt_stream(&mut Cursor::new(&ciphertext), &mut recovered)?;
    assert_eq!(body, recovered);
    Ok(())
}

#[test]
fn empty_stream_round_trips() -> Result<(), CryptoError> {
    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;

    let mut ciphertext = Vec::new();
    context.encrypt_stream(&mut Cursor::new(&[] as &[u8]), &mut ciphertext)?;
    assert_eq!(16, ciphertext.len());

    let mut recovered = Vec::new();
    context.decrypt_stream(&mut Cursor::new(&ciphertext), &mut recovered)?;
    assert!(recovered.is_empty());
    Ok(())
}

#[test]
fn decrypt_stream_rejects_ragged_ciphertext() -> Result<(), CryptoError> {
    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;
    let mut sink = Vec::new();
    let result = context.decrypt_stream(&mut Cursor::new(&[0u8; 21]), &mut sink);
    assert!(matches!(
        result,
        Err(CryptoError::CiphertextLength {
            len: 21,
            block_size: 16
        })
    ));
    Ok(())
}

#[test]
fn file_round_trip() -> Result<(), CryptoError> {
    let dir = std::env::temp_dir();
    let pid = std::process::id();
    let plain_path = dir.join(format!("cipherbox-{pid}-plain.bin"));
    let cipher_path = dir.join(format!("cipherbox-{pid}-cipher.bin"));
    let recovered_path = dir.join(format!("cipherbox-{pid}-recovered.bin"));

    let body = body();
    std::fs::write(&plain_path, &body)?;

    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;
    context.encrypt_file(&plain_path, &cipher_path)?;
    context.decrypt_file(&cipher_path, &recovered_path)?;

    let recovered = std::fs::read(&recovered_path)?;
    for path in [&plain_path, &cipher_path, &recovered_path] {
        let _ = std::fs::remove_file(path);
    }
    assert_eq!(body, recovered);
    Ok(())
}

#[test]
fn context_is_reusable_across_operations() -> Result<(), CryptoError> {
    // Feedback registers must be re-initialized from the IV on every
    // call, so back-to-back encryptions agree.
    let context = context_for(Mode::Cbc, Padding::Pkcs7)?;
    let first = context.encrypt(b"same input, same output")?;
    let second = context.encrypt(b"same input, same output")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn wrapped_cipher_instances_also_work() -> Result<(), CryptoError> {
    // `CipherContext::new` accepts any externally keyed BlockCipher.
    let cipher = Box::new(crate::TripleDes::new((0..24).collect::<Vec<u8>>())?);
    let context = CipherContext::new(cipher, Mode::Ecb, Padding::Pkcs7, None)?;

    let ciphertext = context.encrypt(b"wrapped")?;
    assert_eq!(context.decrypt(&ciphertext)?, b"wrapped");
    Ok(())
}
