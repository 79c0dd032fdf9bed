//! Loading and storing modulator bitstreams
//!
//! Two on-disk formats are supported: text, with one `0` or `1` per line (blank lines and `#`
//! comments are skipped), and packed bytes holding eight bits each, least significant bit first.

use std::io::{self, BufRead, Read, Write};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BitstreamError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected 0 or 1, found {found:?}")]
    InvalidSymbol { line: usize, found: String },

    #[error("bitstream is empty")]
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Packed,
}

/// Parse a text bitstream
pub fn read_text<R: BufRead>(reader: R) -> Result<Vec<bool>, BitstreamError> {
    let mut bits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let symbol = line.split('#').next().unwrap_or("").trim();
        match symbol {
            "" => continue,
            "0" => bits.push(false),
            "1" => bits.push(true),
            other => {
                return Err(BitstreamError::InvalidSymbol {
                    line: idx + 1,
                    found: other.to_string(),
                })
            }
        }
    }
    if bits.is_empty() {
        return Err(BitstreamError::Empty);
    }
    debug!("read {} bits of text bitstream", bits.len());
    Ok(bits)
}

/// Read a packed bitstream
pub fn read_packed<R: Read>(mut reader: R) -> Result<Vec<bool>, BitstreamError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(BitstreamError::Empty);
    }
    debug!("read {} bytes of packed bitstream", bytes.len());
    Ok(unpack(&bytes))
}

pub fn read<R: BufRead>(reader: R, format: Format) -> Result<Vec<bool>, BitstreamError> {
    match format {
        Format::Text => read_text(reader),
        Format::Packed => read_packed(reader),
    }
}

pub fn write_text<W: Write>(mut writer: W, bits: &[bool]) -> Result<(), BitstreamError> {
    for bit in bits {
        writeln!(writer, "{}", *bit as u8)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write bits packed LSB first; a trailing partial byte is zero padded
pub fn write_packed<W: Write>(mut writer: W, bits: &[bool]) -> Result<(), BitstreamError> {
    writer.write_all(&pack(bits))?;
    writer.flush()?;
    Ok(())
}

pub fn unpack(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|b| (0..8).map(move |i| b & (1 << i) != 0))
        .collect()
}

pub fn pack(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, bit)| byte | (*bit as u8) << i)
        })
        .collect()
}
