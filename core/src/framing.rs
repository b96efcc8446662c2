use crate::bits::{bits_to_bytes, bytes_to_bits, group_value, BYTE_BITS};
use crate::{ESCAPE_BYTE, FLAG_BYTE};

/// Bit-stuffing delimiter (0x7E)
pub const FLAG_BITS: [u8; 8] = [0, 1, 1, 1, 1, 1, 1, 0];

/// Longest run of ones allowed inside a bit-stuffed payload
const MAX_ONES_RUN: usize = 5;

/// Frame delimiting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// One-byte length header counting itself plus the payload bytes
    CharacterCount,
    /// Flag-delimited bytes with an escape byte before in-band flag/escape values
    ByteStuffing,
    /// Flag-delimited bits with a zero inserted after five consecutive ones
    BitStuffing,
}

impl Framing {
    pub const ALL: [Framing; 3] = [Framing::CharacterCount, Framing::ByteStuffing, Framing::BitStuffing];

    pub fn encode(self, payload: &[u8]) -> Vec<u8> {
        match self {
            Framing::CharacterCount => encode_character_count(payload),
            Framing::ByteStuffing => encode_byte_stuffing(payload),
            Framing::BitStuffing => encode_bit_stuffing(payload),
        }
    }

    pub fn decode(self, frame: &[u8]) -> Vec<u8> {
        match self {
            Framing::CharacterCount => decode_character_count(frame),
            Framing::ByteStuffing => decode_byte_stuffing(frame),
            Framing::BitStuffing => decode_bit_stuffing(frame),
        }
    }
}

/// Prefix the payload with an 8-bit count of (payload bytes + 1).
///
/// The payload is appended unpadded; only the count rounds it up to whole
/// bytes. Counts above 255 wrap, so frames are limited to 254 payload bytes.
pub fn encode_character_count(payload: &[u8]) -> Vec<u8> {
    let count = payload.len().div_ceil(BYTE_BITS) + 1;
    if count > u8::MAX as usize {
        log::warn!("Character-count header overflow: {} bytes do not fit in one byte", count);
    }

    let mut frame = bytes_to_bits(&[count as u8]);
    frame.extend_from_slice(payload);
    frame
}

/// Read the count header and return the `(count - 1) * 8` bits that follow it,
/// or as many as the frame actually holds.
pub fn decode_character_count(frame: &[u8]) -> Vec<u8> {
    if frame.len() < BYTE_BITS {
        return Vec::new();
    }

    let count = group_value(&frame[..BYTE_BITS]) as usize;
    let wanted = count.saturating_sub(1) * BYTE_BITS;
    let available = frame.len() - BYTE_BITS;
    if wanted > available {
        log::warn!("Character-count frame truncated: header wants {} bits, {} present", wanted, available);
    }

    frame[BYTE_BITS..BYTE_BITS + wanted.min(available)].to_vec()
}

pub fn encode_byte_stuffing(payload: &[u8]) -> Vec<u8> {
    let bytes = bits_to_bytes(payload);
    let mut stuffed = Vec::with_capacity(bytes.len() + 2);

    stuffed.push(FLAG_BYTE);
    for byte in bytes {
        if byte == FLAG_BYTE || byte == ESCAPE_BYTE {
            stuffed.push(ESCAPE_BYTE);
        }
        stuffed.push(byte);
    }
    stuffed.push(FLAG_BYTE);

    bytes_to_bits(&stuffed)
}

/// Strip the outer flags and undo escaping.
///
/// The first and last bytes are assumed to be flags. A byte after an escape
/// is always payload; an unescaped flag inside the frame is discarded.
pub fn decode_byte_stuffing(frame: &[u8]) -> Vec<u8> {
    let bytes = bits_to_bytes(frame);
    if bytes.len() < 2 {
        return Vec::new();
    }

    let mut payload = Vec::with_capacity(bytes.len() - 2);
    let mut escaped = false;
    for &byte in &bytes[1..bytes.len() - 1] {
        if escaped {
            payload.push(byte);
            escaped = false;
        } else if byte == ESCAPE_BYTE {
            escaped = true;
        } else if byte != FLAG_BYTE {
            payload.push(byte);
        }
    }

    bytes_to_bits(&payload)
}

pub fn encode_bit_stuffing(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + payload.len() / MAX_ONES_RUN + 2 * FLAG_BITS.len());
    frame.extend_from_slice(&FLAG_BITS);

    let mut ones = 0;
    for &bit in payload {
        frame.push(bit);
        if bit == 1 {
            ones += 1;
            if ones == MAX_ONES_RUN {
                frame.push(0);
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }

    frame.extend_from_slice(&FLAG_BITS);
    frame
}

/// Strip 8 flag bits from each end and drop every zero that follows five ones.
pub fn decode_bit_stuffing(frame: &[u8]) -> Vec<u8> {
    if frame.len() < 2 * FLAG_BITS.len() {
        return Vec::new();
    }

    let body = &frame[FLAG_BITS.len()..frame.len() - FLAG_BITS.len()];
    let mut payload = Vec::with_capacity(body.len());
    let mut ones = 0;
    for &bit in body {
        if bit == 1 {
            ones += 1;
            payload.push(bit);
        } else {
            // stuffed zero
            if ones != MAX_ONES_RUN {
                payload.push(bit);
            }
            ones = 0;
        }
    }
    payload
}
