//! The cipher context: one keyed block cipher, a mode, a padding scheme
//! and an optional IV, applied to buffers, streams or files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::modes::{self, FeedbackState};
use crate::{BlockCipher, CryptoError, Deal, Des, Loki97, Mode, Padding, TripleDes, bail};

/// Streams are processed in chunks of this many bytes. The size is a
/// multiple of every supported block size, so only the final chunk of a
/// stream can be ragged.
const STREAM_BUF_SIZE: usize = 64 * 1024;

/// Constructor-time selector for the built-in block ciphers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Des,
    TripleDes,
    Deal,
    Loki97,
}

impl Algorithm {
    /// Block size in bytes of the selected cipher.
    pub fn block_size(&self) -> usize {
        match self {
            Algorithm::Des | Algorithm::TripleDes => 8,
            Algorithm::Deal | Algorithm::Loki97 => 16,
        }
    }
}

/// # Cipher context
///
/// Owns a keyed [`BlockCipher`], a [`Mode`], a [`Padding`] and an owned
/// copy of the IV. The context validates the IV contract once, at
/// construction: ECB must not get an IV, every other mode needs exactly
/// one block's worth.
///
/// All feedback state lives for the duration of a single `encrypt`/
/// `decrypt` call and is re-initialized from the IV on entry, so a context
/// can be reused for any number of operations — but two operations must
/// not overlap on the same context.
///
/// ## Example
///
/// ```rust
/// use cipherbox::{Algorithm, CipherContext, Mode, Padding};
///
/// let context = CipherContext::with_algorithm(
///     Algorithm::Des,
///     b"8bytekey",
///     Mode::Ecb,
///     Padding::Pkcs7,
///     None,
/// )
/// .unwrap();
/// let ciphertext = context.encrypt(b"secret").unwrap();
/// assert_eq!(context.decrypt(&ciphertext).unwrap(), b"secret");
/// ```
pub struct CipherContext {
    cipher: Box<dyn BlockCipher>,
    mode: Mode,
    padding: Padding,
    iv: Option<Vec<u8>>,
}

impl CipherContext {
    /// Wrap an already keyed cipher. Fails with [`CryptoError::UnexpectedIv`],
    /// [`CryptoError::MissingIv`] or [`CryptoError::InvalidIv`] when the IV
    /// does not fit the mode.
    pub fn new(
        cipher: Box<dyn BlockCipher>,
        mode: Mode,
        padding: Padding,
        iv: Option<&[u8]>,
    ) -> Result<Self, CryptoError> {
        let block_size = cipher.block_size();
        match (mode.requires_iv(), iv) {
            (false, Some(_)) => return Err(CryptoError::UnexpectedIv),
            (true, None) => return Err(CryptoError::MissingIv(mode)),
            (true, Some(iv)) if iv.len() != block_size => {
                return Err(CryptoError::InvalidIv {
                    expected: block_size,
                    actual: iv.len(),
                });
            }
            _ => {}
        }

        Ok(Self {
            cipher,
            mode,
            padding,
            iv: iv.map(<[u8]>::to_vec),
        })
    }

    /// Key one of the built-in ciphers and wrap it in a context.
    pub fn with_algorithm(
        algorithm: Algorithm,
        key: &[u8],
        mode: Mode,
        padding: Padding,
        iv: Option<&[u8]>,
    ) -> Result<Self, CryptoError> {
        let cipher: Box<dyn BlockCipher> = match algorithm {
            Algorithm::Des => Box::new(Des::new(key)?),
            Algorithm::TripleDes => Box::new(TripleDes::new(key)?),
            Algorithm::Deal => Box::new(Deal::new(key)?),
            Algorithm::Loki97 => Box::new(Loki97::new(key)?),
        };
        Self::new(cipher, mode, padding, iv)
    }

    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// The IV this context was built with, if any. The context never
    /// writes the IV into its output; prefixing it to a ciphertext is the
    /// caller's convention.
    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    fn fresh_state(&self) -> FeedbackState {
        FeedbackState::new(self.iv.as_deref())
    }

    /// Encrypt a byte buffer. Block-aligned modes pad first; stream modes
    /// return exactly `plaintext.len()` bytes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut state = self.fresh_state();
        let mut data = plaintext.to_vec();
        if self.mode.requires_padding() {
            self.padding.pad(&mut data, self.block_size());
        }
        modes::encrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, &data)
    }

    /// Decrypt a byte buffer and strip padding for block-aligned modes.
    ///
    /// A padding mismatch is not an error: the raw decrypted bytes come
    /// back unstripped and their interpretation is the caller's problem.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let block_size = self.block_size();
        if self.mode.requires_padding() {
            bail!(
                ciphertext.len() % block_size != 0,
                CryptoError::CiphertextLength {
                    len: ciphertext.len(),
                    block_size
                }
            );
        }

        let mut state = self.fresh_state();
        let mut plain = modes::decrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, ciphertext)?;
        if self.mode.requires_padding() {
            self.padding.unpad(&mut plain, block_size);
        }
        Ok(plain)
    }

    /// Encrypt everything `reader` yields into `writer`, 64 KiB at a
    /// time. Only the final, short chunk is padded (block modes), so the
    /// output matches a single [`CipherContext::encrypt`] call over the
    /// whole input.
    pub fn encrypt_stream<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<(), CryptoError>
    where
        R: Read,
        W: Write,
    {
        let mut state = self.fresh_state();
        let mut buf = vec![0u8; STREAM_BUF_SIZE];

        loop {
            let read = read_full(reader, &mut buf)?;
            if read < STREAM_BUF_SIZE {
                let mut tail = buf[..read].to_vec();
                if self.mode.requires_padding() {
                    self.padding.pad(&mut tail, self.block_size());
                }
                if !tail.is_empty() {
                    let ciphertext =
                        modes::encrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, &tail)?;
                    writer.write_all(&ciphertext)?;
                }
                writer.flush()?;
                return Ok(());
            }

            let ciphertext =
                modes::encrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, &buf)?;
            writer.write_all(&ciphertext)?;
        }
    }

    /// Decrypt everything `reader` yields into `writer`. The reader is
    /// kept one chunk ahead so unpadding can be deferred to the final
    /// chunk.
    pub fn decrypt_stream<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<(), CryptoError>
    where
        R: Read,
        W: Write,
    {
        let mut state = self.fresh_state();
        let block_size = self.block_size();
        let mut current = vec![0u8; STREAM_BUF_SIZE];
        let mut next = vec![0u8; STREAM_BUF_SIZE];
        let mut current_len = read_full(reader, &mut current)?;

        loop {
            let next_len = if current_len < STREAM_BUF_SIZE {
                0
            } else {
                read_full(reader, &mut next)?
            };
            let is_final = current_len < STREAM_BUF_SIZE || next_len == 0;
            let chunk = &current[..current_len];

            if is_final {
                if !chunk.is_empty() {
                    if self.mode.requires_padding() {
                        bail!(
                            chunk.len() % block_size != 0,
                            CryptoError::CiphertextLength {
                                len: chunk.len(),
                                block_size
                            }
                        );
                    }
                    let mut plain =
                        modes::decrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, chunk)?;
                    if self.mode.requires_padding() {
                        self.padding.unpad(&mut plain, block_size);
                    }
                    writer.write_all(&plain)?;
                }
                writer.flush()?;
                return Ok(());
            }

            let plain = modes::decrypt_chunk(self.cipher.as_ref(), self.mode, &mut state, chunk)?;
            writer.write_all(&plain)?;

            std::mem::swap(&mut current, &mut next);
            current_len = next_len;
        }
    }

    /// Encrypt `source` into `dest` through buffered file I/O.
    pub fn encrypt_file(
        &self,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<(), CryptoError> {
        let mut reader = BufReader::new(File::open(source)?);
        let mut writer = BufWriter::new(File::create(dest)?);
        self.encrypt_stream(&mut reader, &mut writer)
    }

    /// Decrypt `source` into `dest` through buffered file I/O.
    pub fn decrypt_file(
        &self,
        source: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<(), CryptoError> {
        let mut reader = BufReader::new(File::open(source)?);
        let mut writer = BufWriter::new(File::create(dest)?);
        self.decrypt_stream(&mut reader, &mut writer)
    }
}

/// Read until `buf` is full or the reader hits EOF. A short return value
/// therefore always means end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, CryptoError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
