use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use cipherbox::{Algorithm, Mode, Padding};

const ABOUT: &str = "A command-line file encryption tool built on the cipherbox toolkit";
const LONG_ABOUT: &str = "\
cipherbox-cli encrypts and decrypts files with the cipherbox study toolkit: \
DES, Triple-DES, DEAL or LOKI97 under any of the seven supported modes of \
operation and four padding schemes.

When encrypting with an IV-bearing mode and no --iv flag, a random IV is \
generated and written as a prefix of the output file; decrypting without \
--iv reads that prefix back. Passing --iv explicitly skips the prefix on \
both sides.";

#[derive(Parser, Debug)]
#[command(name = "cipherbox-cli", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Opts {
    /// Cipher key as a hex string (length must match the
    /// chosen algorithm).
    #[clap(short, long)]
    pub key: String,

    /// Which block cipher to run.
    #[clap(short, long, value_enum)]
    pub algorithm: CipherChoice,

    /// Which mode of operation to run the cipher under.
    #[clap(short, long, value_enum)]
    pub mode: ModeChoice,

    /// How plaintext is padded to the block grid (ignored by
    /// the stream modes cfb/ofb/ctr).
    #[clap(short, long, value_enum)]
    pub padding: PaddingChoice,

    /// Initialization vector as a hex string of exactly one
    /// block. Omit it to use the IV-prefix convention.
    #[clap(long)]
    pub iv: Option<String>,

    /// Source file to read.
    #[clap(short, long)]
    pub file: PathBuf,

    /// Destination file to write.
    #[clap(short, long)]
    pub dest: Option<PathBuf>,

    /// What action to perform, either to encrypt or
    /// to decrypt.
    #[clap(value_enum)]
    pub action: Action,
}

impl Opts {
    pub fn dest_path(&self) -> PathBuf {
        if let Some(path) = &self.dest {
            return path.clone();
        }

        let mut path = PathBuf::new();
        path.push("./");
        path.push("processed.bin");

        path
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Action {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CipherChoice {
    /// DES with an 8-byte key.
    Des,
    /// Triple-DES (EDE) with a 24-byte key.
    TripleDes,
    /// DEAL with a 16, 24 or 32-byte key.
    Deal,
    /// LOKI97 with a 16, 24 or 32-byte key.
    Loki97,
}

impl From<CipherChoice> for Algorithm {
    fn from(choice: CipherChoice) -> Self {
        match choice {
            CipherChoice::Des => Algorithm::Des,
            CipherChoice::TripleDes => Algorithm::TripleDes,
            CipherChoice::Deal => Algorithm::Deal,
            CipherChoice::Loki97 => Algorithm::Loki97,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeChoice {
    Ecb,
    Cbc,
    Pcbc,
    Cfb,
    Ofb,
    Ctr,
    RandomDelta,
}

impl From<ModeChoice> for Mode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Ecb => Mode::Ecb,
            ModeChoice::Cbc => Mode::Cbc,
            ModeChoice::Pcbc => Mode::Pcbc,
            ModeChoice::Cfb => Mode::Cfb,
            ModeChoice::Ofb => Mode::Ofb,
            ModeChoice::Ctr => Mode::Ctr,
            ModeChoice::RandomDelta => Mode::RandomDelta,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaddingChoice {
    Zeros,
    Pkcs7,
    AnsiX923,
    Iso10126,
}

impl From<PaddingChoice> for Padding {
    fn from(choice: PaddingChoice) -> Self {
        match choice {
            PaddingChoice::Zeros => Padding::Zeros,
            PaddingChoice::Pkcs7 => Padding::Pkcs7,
            PaddingChoice::AnsiX923 => Padding::AnsiX923,
            PaddingChoice::Iso10126 => Padding::Iso10126,
        }
    }
}
