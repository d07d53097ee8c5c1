//! Luck series printer protocol implementation.
//!
//! Image command: `1D 76 30 00 30 00` + 2-byte line count (LE), padded to a
//! 16-byte block and followed by the hex image payload. The framed stream is
//! sent in 128-byte chunks.
//! Write characteristic: ff02. Notify characteristics: ff01, ff03.

use super::PrinterProtocol;
use crate::profile::Density;
use crate::{LuckPrinterError, Result};

/// BLE characteristic for writing commands and data.
const WRITE_CHARACTERISTIC: uuid::Uuid =
    uuid::Uuid::from_u128(0x0000_ff02_0000_1000_8000_00805f9b34fb);

/// BLE characteristics the printer notifies on.
const NOTIFY_CHARACTERISTICS: [uuid::Uuid; 2] = [
    uuid::Uuid::from_u128(0x0000_ff01_0000_1000_8000_00805f9b34fb),
    uuid::Uuid::from_u128(0x0000_ff03_0000_1000_8000_00805f9b34fb),
];

// -- Command opcodes --
const CMD_ENABLE: [u8; 3] = [0x10, 0xff, 0x40];
const CMD_ENABLE_ACK: [u8; 4] = [0x10, 0xff, 0xf1, 0x03];
const CMD_DISABLE_SHUTDOWN: [u8; 5] = [0x10, 0xff, 0x12, 0x00, 0x00];
const CMD_SET_DENSITY: [u8; 4] = [0x10, 0xff, 0x10, 0x00];
const CMD_PRINT_RASTER: [u8; 6] = [0x1d, 0x76, 0x30, 0x00, 0x30, 0x00];
const CMD_FEED: [u8; 3] = [0x1b, 0x4a, 0x64];
const CMD_PRINT_END: [u8; 4] = [0x10, 0xff, 0xf1, 0x45];

/// Size of every image chunk and padded control block.
pub const CHUNK_SIZE: usize = 128;

/// Opcode plus length field, zero-padded to this many bytes.
const RASTER_HEADER_LEN: usize = 16;

/// Hex characters per printed dot line (384 bits).
const HEX_CHARS_PER_LINE: usize = 96;

/// Extra lines the device expects on top of the payload line count.
const LINE_OVERHEAD: usize = 3;

/// Encode the line-count field of the image command.
///
/// The low byte carries the two low hex digits and the high byte the rest,
/// e.g. `0x05 -> (0x05, 0x00)` and `0x1a3 -> (0xa3, 0x01)`.
pub fn encode_length(hex_lines: u16) -> (u8, u8) {
    let [lo, hi] = hex_lines.to_le_bytes();
    (lo, hi)
}

/// Number of lines the device counts for a payload of `hex_len` characters.
fn hex_lines(hex_len: usize) -> Result<u16> {
    let lines = hex_len / HEX_CHARS_PER_LINE + LINE_OVERHEAD;
    u16::try_from(lines).map_err(|_| {
        LuckPrinterError::InvalidImage(format!(
            "image needs {lines} lines, more than the length field can carry"
        ))
    })
}

/// Pad a command with trailing zeros to a full chunk.
fn pad_block(cmd: &[u8]) -> Vec<u8> {
    let mut buf = cmd.to_vec();
    buf.resize(CHUNK_SIZE.max(cmd.len()), 0);
    buf
}

/// Luck series protocol implementation.
#[derive(Debug, Clone, Default)]
pub struct LuckProtocol;

impl LuckProtocol {
    pub fn new() -> Self {
        Self
    }
}

impl PrinterProtocol for LuckProtocol {
    fn name(&self) -> &str {
        "Luck"
    }

    fn write_characteristic(&self) -> uuid::Uuid {
        WRITE_CHARACTERISTIC
    }

    fn notify_characteristics(&self) -> Vec<uuid::Uuid> {
        NOTIFY_CHARACTERISTICS.to_vec()
    }

    fn build_enable_sequence(&self) -> Vec<Vec<u8>> {
        vec![CMD_ENABLE.to_vec(), CMD_ENABLE_ACK.to_vec()]
    }

    fn build_disable_shutdown(&self) -> Vec<u8> {
        CMD_DISABLE_SHUTDOWN.to_vec()
    }

    fn build_density_command(&self, density: Density) -> Vec<u8> {
        let mut cmd = CMD_SET_DENSITY.to_vec();
        cmd.extend_from_slice(&density.code());
        pad_block(&cmd)
    }

    fn build_image_frames(&self, payload_hex: &str) -> Result<Vec<Vec<u8>>> {
        let (lo, hi) = encode_length(hex_lines(payload_hex.len())?);

        let mut header = CMD_PRINT_RASTER.to_vec();
        header.extend_from_slice(&[lo, hi]);
        header.resize(RASTER_HEADER_LEN, 0);

        let mut framed = hex::encode(header);
        framed.push_str(payload_hex);

        let chunk_hex = CHUNK_SIZE * 2;
        let frames = framed
            .as_bytes()
            .chunks(chunk_hex)
            .map(|chunk| {
                let mut chunk = chunk.to_vec();
                chunk.resize(chunk_hex, b'0');
                hex::decode(&chunk).map_err(|e| {
                    LuckPrinterError::InvalidImage(format!("image payload is not hex: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            payload_hex_len = payload_hex.len(),
            length_lo = lo,
            length_hi = hi,
            chunk_count = frames.len(),
            "Framed image payload"
        );
        Ok(frames)
    }

    fn build_finish_sequence(&self) -> Vec<Vec<u8>> {
        // The feed opcode sits at the end of its block, not the start.
        let mut feed = vec![0u8; CHUNK_SIZE - CMD_FEED.len()];
        feed.extend_from_slice(&CMD_FEED);
        vec![feed, CMD_PRINT_END.to_vec()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_length_single_digit() {
        assert_eq!(encode_length(0x05), (0x05, 0x00));
    }

    #[test]
    fn test_encode_length_two_digits() {
        assert_eq!(encode_length(0x1a), (0x1a, 0x00));
        assert_eq!(encode_length(0xff), (0xff, 0x00));
    }

    #[test]
    fn test_encode_length_three_digits() {
        assert_eq!(encode_length(0x1a3), (0xa3, 0x01));
        assert_eq!(encode_length(0x100), (0x00, 0x01));
    }

    #[test]
    fn test_hex_lines_counts_full_lines_plus_overhead() {
        assert_eq!(hex_lines(0).unwrap(), 3);
        assert_eq!(hex_lines(95).unwrap(), 3);
        assert_eq!(hex_lines(96).unwrap(), 4);
        // 384 x 2 image: 80 header digits + 2 * 96
        assert_eq!(hex_lines(80 + 192).unwrap(), 5);
    }

    #[test]
    fn test_hex_lines_overflow_is_invalid_image() {
        let too_long = (usize::from(u16::MAX) - LINE_OVERHEAD + 1) * HEX_CHARS_PER_LINE;
        let err = hex_lines(too_long).unwrap_err();
        assert!(err.is_invalid_image());
        assert_eq!(hex_lines(too_long - 1).unwrap(), u16::MAX);
    }

    #[test]
    fn test_density_command_block() {
        let proto = LuckProtocol::new();
        for (density, code) in [
            (Density::Low, 0x00u8),
            (Density::Normal, 0x01),
            (Density::High, 0x02),
        ] {
            let cmd = proto.build_density_command(density);
            assert_eq!(cmd.len(), 128);
            assert_eq!(&cmd[..6], &[0x10, 0xff, 0x10, 0x00, code, 0x00]);
            assert!(cmd[6..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_control_commands_verbatim() {
        let proto = LuckProtocol::new();
        assert_eq!(proto.name(), "Luck");
        assert_eq!(
            proto.build_enable_sequence(),
            vec![vec![0x10, 0xff, 0x40], vec![0x10, 0xff, 0xf1, 0x03]]
        );
        assert_eq!(
            proto.build_disable_shutdown(),
            vec![0x10, 0xff, 0x12, 0x00, 0x00]
        );

        let finish = proto.build_finish_sequence();
        assert_eq!(finish.len(), 2);
        assert_eq!(finish[0].len(), 128);
        assert!(finish[0][..125].iter().all(|&b| b == 0));
        assert_eq!(&finish[0][125..], &[0x1b, 0x4a, 0x64]);
        assert_eq!(finish[1], vec![0x10, 0xff, 0xf1, 0x45]);
    }

    #[test]
    fn test_first_frame_layout() {
        let proto = LuckProtocol::new();
        let payload = "ab".repeat(112);
        let frames = proto.build_image_frames(&payload).unwrap();

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.len(), 128);
        // 224 / 96 + 3 = 5
        assert_eq!(
            &frame[..16],
            &[0x1d, 0x76, 0x30, 0x00, 0x30, 0x00, 0x05, 0x00, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert!(frame[16..].iter().all(|&b| b == 0xab));
    }

    #[test]
    fn test_exact_multiple_has_no_padding_chunk() {
        let proto = LuckProtocol::new();
        // 32 header digits + 480 = 512 digits = 2 full chunks
        let payload = "f".repeat(480);
        let frames = proto.build_image_frames(&payload).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].iter().all(|&b| b == 0xff));
    }

    #[test]
    fn test_short_tail_is_zero_padded() {
        let proto = LuckProtocol::new();
        // 32 + 482 = 514 digits -> 2 full chunks + 1 byte
        let payload = "f".repeat(482);
        let frames = proto.build_image_frames(&payload).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.len() == 128));
        assert_eq!(frames[2][0], 0xff);
        assert!(frames[2][1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_odd_length_payload_pads_final_nibble() {
        let proto = LuckProtocol::new();
        // 32 + 225 digits: the lone trailing 'c' becomes 0xc0
        let payload = format!("{}c", "0".repeat(224));
        let frames = proto.build_image_frames(&payload).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1][0], 0xc0);
    }

    #[test]
    fn test_three_digit_line_count_in_header() {
        let proto = LuckProtocol::new();
        // 384 x 416 image: 80 + 416 * 96 digits -> 416 + 3 = 0x1a3 lines
        let payload = format!("4{}", "0".repeat(79 + 416 * 96));
        let frames = proto.build_image_frames(&payload).unwrap();
        assert_eq!(&frames[0][6..8], &[0xa3, 0x01]);
    }

    #[test]
    fn test_non_hex_payload_rejected() {
        let proto = LuckProtocol::new();
        let err = proto.build_image_frames("xyz").unwrap_err();
        assert!(err.is_invalid_image());
    }
}
