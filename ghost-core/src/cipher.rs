//! Repeating-key XOR obfuscation and base64 transport.
//!
//! This is a speed bump against casual edits of stored blobs, not
//! encryption: the key ships with every client. Integrity comes from the
//! checksum and the server-side re-simulation, never from this layer.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::codec::{decode_samples, encode_samples, MotionSample};
use crate::error::DecodeError;

pub const OBFUSCATION_KEY: &[u8] = b"gh0st-spl1ne-r4c3r";

/// Applying this twice restores the input.
pub fn xor_in_place(bytes: &mut [u8]) {
    for (byte, key) in bytes.iter_mut().zip(OBFUSCATION_KEY.iter().cycle()) {
        *byte ^= key;
    }
}

pub fn xor_transform(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    xor_in_place(&mut out);
    out
}

/// Obfuscates `payload` and encodes it as base64 text.
pub fn seal(payload: &[u8]) -> String {
    BASE64_STANDARD.encode(xor_transform(payload))
}

/// Inverse of [`seal`].
pub fn unseal(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = BASE64_STANDARD
        .decode(text.trim())
        .map_err(|_| DecodeError::InvalidBase64)?;
    xor_in_place(&mut bytes);
    Ok(bytes)
}

pub fn seal_ghost(samples: &[MotionSample]) -> String {
    seal(&encode_samples(samples))
}

/// Decodes a stored ghost; anything unreadable yields no samples.
pub fn open_ghost(text: &str) -> Vec<MotionSample> {
    unseal(text)
        .map(|bytes| decode_samples(&bytes))
        .unwrap_or_default()
}
