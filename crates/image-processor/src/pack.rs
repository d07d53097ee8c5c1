//! Bit packing of a dithered raster into the printer's hex image payload.
//!
//! The payload is a frame-start marker (one `1` bit followed by 318 `0`
//! bits) and then one bit per pixel, row-major from the top-left corner,
//! where `1` means "burn this dot".

use tracing::debug;

use crate::raster::Raster;

/// Number of marker bits preceding the pixel data.
pub const HEADER_BITS: usize = 319;

/// Pixels whose channel sum is above this are left white.
const WHITE_SUM_THRESHOLD: i32 = 600;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Packed image bits, one `u8` (0 or 1) per bit, most significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSequence {
    bits: Vec<u8>,
}

impl BitSequence {
    /// Total number of bits, header included.
    pub fn bit_count(&self) -> usize {
        self.bits.len()
    }

    /// The frame-start marker bits.
    pub fn header(&self) -> &[u8] {
        &self.bits[..HEADER_BITS]
    }

    /// One bit per pixel, row-major.
    pub fn pixel_bits(&self) -> &[u8] {
        &self.bits[HEADER_BITS..]
    }

    /// Render as a lowercase hex number without leading zero digits.
    ///
    /// Bits are grouped into nibbles from the least significant end, so when
    /// the length is not a multiple of four the first digit carries fewer
    /// than four bits.
    pub fn to_hex(&self) -> String {
        let pad = (4 - self.bit_count() % 4) % 4;
        let padded: Vec<u8> = std::iter::repeat_n(0u8, pad)
            .chain(self.bits.iter().copied())
            .collect();

        let hex: String = padded
            .chunks(4)
            .map(|nibble| {
                let v = nibble.iter().fold(0usize, |acc, &b| (acc << 1) | usize::from(b));
                char::from(HEX_DIGITS[v])
            })
            .skip_while(|&c| c == '0')
            .collect();

        if hex.is_empty() { "0".to_string() } else { hex }
    }
}

/// Pack a dithered raster into the marker-prefixed bit sequence.
///
/// Darkness is read back from the stored channels: a pixel is printed unless
/// `R + G + B > 600`.
pub fn pack_bits(raster: &Raster) -> BitSequence {
    let (width, height) = raster.dimensions();
    let mut bits = Vec::with_capacity(HEADER_BITS + width as usize * height as usize);

    bits.push(1);
    bits.resize(HEADER_BITS, 0);
    bits.extend(raster.pixels().iter().map(|px| {
        let sum: i32 = px.iter().sum();
        u8::from(sum <= WHITE_SUM_THRESHOLD)
    }));

    let seq = BitSequence { bits };
    debug!(width, height, bit_count = seq.bit_count(), "Packed raster bits");
    seq
}
