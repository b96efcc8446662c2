use std::fmt;

/// Width of the ones-complement checksum in bits
pub const CHECKSUM_BITS: usize = 16;

/// Width of the CRC in bits
pub const CRC_BITS: usize = 32;

/// CRC-32 generator polynomial without its implicit x^32 term
pub const CRC32_POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Error-control strategy applied before framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorControl {
    None,
    EvenParity,
    Checksum,
    Crc32,
    Hamming,
}

/// Outcome of verifying a received payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    Success,
    ParityError,
    ChecksumError,
    CrcError,
    /// Hamming always corrects and never reports failure
    HammingOk,
    NoVerification,
}

impl LinkStatus {
    /// True when verification ran and detected corruption
    pub fn is_integrity_failure(self) -> bool {
        matches!(self, LinkStatus::ParityError | LinkStatus::ChecksumError | LinkStatus::CrcError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Success => "Success",
            LinkStatus::ParityError => "Parity Error",
            LinkStatus::ChecksumError => "Checksum Error",
            LinkStatus::CrcError => "CRC Error",
            LinkStatus::HammingOk => "Hamming OK",
            LinkStatus::NoVerification => "No Verification",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorControl {
    pub const ALL: [ErrorControl; 5] = [
        ErrorControl::None,
        ErrorControl::EvenParity,
        ErrorControl::Checksum,
        ErrorControl::Crc32,
        ErrorControl::Hamming,
    ];

    /// Append (or interleave, for Hamming) the redundancy bits
    pub fn encode(self, payload: &[u8]) -> Vec<u8> {
        match self {
            ErrorControl::None => payload.to_vec(),
            ErrorControl::EvenParity => add_even_parity(payload),
            ErrorControl::Checksum => add_checksum(payload),
            ErrorControl::Crc32 => add_crc(payload),
            ErrorControl::Hamming => hamming_encode(payload),
        }
    }

    /// Verify or correct the received bits and strip the redundancy.
    ///
    /// The payload is returned even when verification fails.
    pub fn decode(self, received: &[u8]) -> (Vec<u8>, LinkStatus) {
        let status_if = |ok: bool, failure: LinkStatus| if ok { LinkStatus::Success } else { failure };

        match self {
            ErrorControl::None => (received.to_vec(), LinkStatus::NoVerification),
            ErrorControl::EvenParity => (
                strip_trailing(received, 1),
                status_if(verify_even_parity(received), LinkStatus::ParityError),
            ),
            ErrorControl::Checksum => (
                strip_trailing(received, CHECKSUM_BITS),
                status_if(verify_checksum(received), LinkStatus::ChecksumError),
            ),
            ErrorControl::Crc32 => (
                strip_trailing(received, CRC_BITS),
                status_if(verify_crc(received), LinkStatus::CrcError),
            ),
            ErrorControl::Hamming => (hamming_decode(received), LinkStatus::HammingOk),
        }
    }
}

fn strip_trailing(bits: &[u8], count: usize) -> Vec<u8> {
    bits[..bits.len().saturating_sub(count)].to_vec()
}

fn ones(bits: &[u8]) -> usize {
    bits.iter().filter(|&&bit| bit == 1).count()
}

fn bits_of(value: u32, width: usize) -> Vec<u8> {
    (0..width).rev().map(|i| ((value >> i) & 1) as u8).collect()
}

pub fn add_even_parity(payload: &[u8]) -> Vec<u8> {
    let mut out = payload.to_vec();
    out.push((ones(payload) % 2) as u8);
    out
}

/// Payload plus parity bit must hold an even number of ones
pub fn verify_even_parity(received: &[u8]) -> bool {
    ones(received) % 2 == 0
}

/// Internet-style checksum: ones-complement sum of 16-bit big-endian words,
/// zero-padded on the right, then complemented.
pub fn checksum16(bits: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for word in bits.chunks(CHECKSUM_BITS) {
        let value = word
            .iter()
            .chain(std::iter::repeat(&0).take(CHECKSUM_BITS - word.len()))
            .fold(0u32, |acc, &bit| (acc << 1) | bit as u32);
        sum += value;
        if sum > 0xFFFF {
            // end-around carry
            sum = (sum & 0xFFFF) + 1;
        }
    }
    !(sum as u16)
}

pub fn add_checksum(payload: &[u8]) -> Vec<u8> {
    let mut out = payload.to_vec();
    out.extend(bits_of(checksum16(payload) as u32, CHECKSUM_BITS));
    out
}

/// Recompute the checksum over all but the last 16 bits and compare
pub fn verify_checksum(received: &[u8]) -> bool {
    if received.len() < CHECKSUM_BITS {
        return false;
    }
    let (data, tail) = received.split_at(received.len() - CHECKSUM_BITS);
    bits_of(checksum16(data) as u32, CHECKSUM_BITS) == tail
}

/// Remainder of `payload · x^32` divided by the CRC-32 generator.
///
/// Plain polynomial division: no initial all-ones register and no final
/// inversion, so the value differs from IEEE 802.3 CRC-32.
pub fn crc32(bits: &[u8]) -> u32 {
    let mut remainder: u32 = 0;
    for &bit in bits {
        let leading = (remainder >> 31) as u8 ^ (bit & 1);
        remainder <<= 1;
        if leading == 1 {
            remainder ^= CRC32_POLYNOMIAL;
        }
    }
    remainder
}

pub fn add_crc(payload: &[u8]) -> Vec<u8> {
    let mut out = payload.to_vec();
    out.extend(bits_of(crc32(payload), CRC_BITS));
    out
}

pub fn verify_crc(received: &[u8]) -> bool {
    if received.len() < CRC_BITS {
        return false;
    }
    let (data, tail) = received.split_at(received.len() - CRC_BITS);
    bits_of(crc32(data), CRC_BITS) == tail
}

fn is_power_of_two(position: usize) -> bool {
    position & (position - 1) == 0
}

/// Number of parity bits `r` needed for `m` data bits: smallest `2^r >= m + r + 1`
pub fn hamming_parity_bits(data_bits: usize) -> usize {
    let mut r = 0;
    while (1usize << r) < data_bits + r + 1 {
        r += 1;
    }
    r
}

/// Hamming single-error-correcting code over the whole payload.
///
/// Parity bits sit at the 1-indexed power-of-two positions, data bits fill the
/// rest in order. Parity `p` makes the XOR over every position with bit `p`
/// set equal to zero.
pub fn hamming_encode(data: &[u8]) -> Vec<u8> {
    let r = hamming_parity_bits(data.len());
    let n = data.len() + r;
    let mut codeword = vec![0u8; n];

    let mut data_bits = data.iter();
    for position in 1..=n {
        if !is_power_of_two(position) {
            if let Some(&bit) = data_bits.next() {
                codeword[position - 1] = bit;
            }
        }
    }

    for i in 0..r {
        let parity = 1usize << i;
        let xor = (1..=n)
            .filter(|&k| k & parity != 0 && k != parity)
            .fold(0u8, |acc, k| acc ^ codeword[k - 1]);
        codeword[parity - 1] = xor;
    }

    codeword
}

/// Correct at most one flipped bit and return the data bits.
///
/// A double error yields a wrong "correction" without any indication.
pub fn hamming_decode(received: &[u8]) -> Vec<u8> {
    let n = received.len();
    let mut r = 0;
    while (1usize << r) < n + 1 {
        r += 1;
    }

    let syndrome: usize = (0..r)
        .map(|i| 1usize << i)
        .filter(|&parity| {
            (1..=n)
                .filter(|&k| k & parity != 0)
                .fold(0u8, |acc, k| acc ^ received[k - 1])
                != 0
        })
        .sum();

    let mut codeword = received.to_vec();
    if syndrome > 0 {
        if syndrome <= n {
            log::warn!("Hamming: corrected bit at position {}", syndrome);
            codeword[syndrome - 1] ^= 1;
        } else {
            log::warn!("Hamming: syndrome {} points outside a {}-bit codeword", syndrome, n);
        }
    }

    (1..=n)
        .filter(|&position| !is_power_of_two(position))
        .map(|position| codeword[position - 1])
        .collect()
}
