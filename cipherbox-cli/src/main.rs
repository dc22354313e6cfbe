use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use anyhow::Context;
use cipherbox::{Algorithm, CipherContext, Mode, Padding, iv_from_hex, random_iv};
use clap::Parser;

use crate::opts::{Action, Opts};

mod opts;

fn main() -> anyhow::Result<()> {
    let options = Opts::parse();

    let key = hex::decode(&options.key).context("--key must be a hex string")?;
    let algorithm: Algorithm = options.algorithm.into();
    let mode: Mode = options.mode.into();
    let padding: Padding = options.padding.into();
    let dest = options.dest_path();

    let mut reader = BufReader::new(
        File::open(&options.file)
            .with_context(|| format!("cannot open {}", options.file.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(&dest).with_context(|| format!("cannot create {}", dest.display()))?,
    );

    match options.action {
        Action::Encrypt => {
            let iv = match &options.iv {
                Some(iv_hex) => Some((iv_from_hex(iv_hex, algorithm.block_size())?, false)),
                None if mode.requires_iv() => Some((random_iv(algorithm.block_size()), true)),
                None => None,
            };

            let context = CipherContext::with_algorithm(
                algorithm,
                &key,
                mode,
                padding,
                iv.as_ref().map(|(bytes, _)| bytes.as_slice()),
            )?;
            // A generated IV travels as a prefix of the ciphertext file.
            if let Some((bytes, generated)) = &iv {
                if *generated {
                    writer.write_all(bytes)?;
                }
            }
            context.encrypt_stream(&mut reader, &mut writer)?;
        }
        Action::Decrypt => {
            let iv = if mode.requires_iv() {
                Some(match &options.iv {
                    Some(iv_hex) => iv_from_hex(iv_hex, algorithm.block_size())?,
                    None => {
                        let mut prefix = vec![0u8; algorithm.block_size()];
                        reader
                            .read_exact(&mut prefix)
                            .context("ciphertext is too short to carry an IV prefix")?;
                        prefix
                    }
                })
            } else {
                None
            };

            let context =
                CipherContext::with_algorithm(algorithm, &key, mode, padding, iv.as_deref())?;
            context.decrypt_stream(&mut reader, &mut writer)?;
        }
    }

    println!(
        "{:?} {} -> {}",
        options.action,
        options.file.display(),
        dest.display()
    );
    Ok(())
}
