//! `PlantUML` text encoding.
//!
//! The server takes diagram text in the URL path: UTF-8 bytes are deflated,
//! and the raw deflate stream is written in a 64-symbol URL-safe alphabet,
//! 3 bytes to 4 symbols.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Symbol alphabet, indexed by 6-bit value.
pub const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// zlib framing around the raw deflate stream.
const ZLIB_HEADER_LEN: usize = 2;
const ZLIB_CHECKSUM_LEN: usize = 4;

/// Encode diagram text into a URL path token.
///
/// Deterministic: the same text always yields the same token.
///
/// # Errors
///
/// Returns an error if compression fails.
pub fn encode(text: &str) -> std::io::Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;

    let end = compressed.len().saturating_sub(ZLIB_CHECKSUM_LEN);
    let deflated = compressed.get(ZLIB_HEADER_LEN..end).unwrap_or_default();
    Ok(encode_bytes(deflated))
}

/// Map bytes onto [`ALPHABET`], 3 bytes to 4 symbols.
///
/// A trailing group of 1 or 2 bytes yields 2 or 3 symbols; there is no
/// padding.
#[must_use]
pub fn encode_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);

        let symbols = [
            b1 >> 2,
            ((b1 & 0x3) << 4) | (b2 >> 4),
            ((b2 & 0xF) << 2) | (b3 >> 6),
            b3 & 0x3F,
        ];
        for &symbol in &symbols[..=chunk.len()] {
            out.push(char::from(ALPHABET[usize::from(symbol)]));
        }
    }

    out
}
