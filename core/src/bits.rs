//! Conversions between text, flat bit sequences and 8-bit groups.
//!
//! Bits are carried as `u8` values restricted to 0 and 1, most significant
//! bit first within every byte.

use crate::error::{Result, SimulatorError};

/// Width of one byte group in bits
pub const BYTE_BITS: usize = 8;

/// Convert text to bits, one byte per character (its code point), MSB first.
///
/// Characters above U+00FF cannot be represented in a single byte and are
/// rejected.
pub fn text_to_bits(text: &str) -> Result<Vec<u8>> {
    let mut bits = Vec::with_capacity(text.len() * BYTE_BITS);
    for ch in text.chars() {
        let code = u8::try_from(u32::from(ch)).map_err(|_| SimulatorError::UnsupportedCharacter(ch))?;
        push_byte(&mut bits, code);
    }
    Ok(bits)
}

/// Convert bits back to text. A trailing group shorter than 8 bits is dropped.
pub fn bits_to_text(bits: &[u8]) -> String {
    bits.chunks_exact(BYTE_BITS)
        .map(|group| char::from(group_value(group)))
        .collect()
}

/// Split bits into 8-bit groups, right-padding the last group with zeros.
pub fn byte_groups(bits: &[u8]) -> Vec<[u8; BYTE_BITS]> {
    bits.chunks(BYTE_BITS)
        .map(|chunk| {
            let mut group = [0u8; BYTE_BITS];
            group[..chunk.len()].copy_from_slice(chunk);
            group
        })
        .collect()
}

/// Pack bits into bytes, zero-padding the final byte.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    byte_groups(bits).iter().map(|group| group_value(group)).collect()
}

/// Unpack bytes into bits, MSB first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * BYTE_BITS);
    for &byte in bytes {
        push_byte(&mut bits, byte);
    }
    bits
}

fn push_byte(bits: &mut Vec<u8>, byte: u8) {
    for i in (0..BYTE_BITS).rev() {
        bits.push((byte >> i) & 1);
    }
}

/// Interpret up to 8 bits as an unsigned big-endian value
pub(crate) fn group_value(group: &[u8]) -> u8 {
    group.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let bits = text_to_bits("U").unwrap();
        assert_eq!(bits, vec![0, 1, 0, 1, 0, 1, 0, 1]);
        assert_eq!(bits_to_text(&bits), "U");

        let text = "Olá, ÿ!";
        assert_eq!(bits_to_text(&text_to_bits(text).unwrap()), text);
    }

    #[test]
    fn test_wide_character_rejected() {
        match text_to_bits("a€") {
            Err(SimulatorError::UnsupportedCharacter('€')) => {}
            other => panic!("Expected UnsupportedCharacter, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_trailing_group_dropped() {
        let mut bits = text_to_bits("AB").unwrap();
        bits.extend_from_slice(&[1, 1, 0]);
        assert_eq!(bits_to_text(&bits), "AB");
    }

    #[test]
    fn test_byte_groups_pad_last_group() {
        let groups = byte_groups(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1], [1, 0, 1, 0, 0, 0, 0, 0]);
        assert_eq!(bits_to_bytes(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1]), vec![0xFF, 0xA0]);
    }

    #[test]
    fn test_bytes_to_bits() {
        assert_eq!(bytes_to_bits(&[0x7E]), vec![0, 1, 1, 1, 1, 1, 1, 0]);
        assert!(bytes_to_bits(&[]).is_empty());
    }
}
