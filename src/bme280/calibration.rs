//! Factory trimming coefficients.
//!
//! The sensor stores them in two register windows: 26 bytes from `0x88`
//! (temperature, pressure, `dig_h1` in the last byte) and 7 bytes from `0xe1`
//! (the rest of humidity). The two windows are read back to back into one
//! 33-byte block, which is covered by the CRC byte at `0xe8`.

use super::error::{Error, Result};
use super::{Interface, CALIBRATION_CRC_REG, CALIBRATION_OFFSET_H2, CALIBRATION_OFFSET_T_P};

pub const WINDOW_A_LEN: usize = 26;
pub const WINDOW_B_LEN: usize = 7;
pub const BLOCK_LEN: usize = WINDOW_A_LEN + WINDOW_B_LEN;

const CRC_POLYNOMIAL: u8 = 0x1d;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationCoefficients {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,

    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,

    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// 12 bits, unsigned.
    pub dig_h4: i16,
    /// 12 bits, unsigned.
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibrationCoefficients {
    /// Decodes the concatenated 33-byte calibration block.
    pub fn from_block(buffer: &[u8; BLOCK_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([buffer[i], buffer[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([buffer[i], buffer[i + 1]]);
        let (dig_h4, dig_h5) = unpack_h4_h5(buffer[29], buffer[30], buffer[31]);

        Self {
            dig_t1: u16_at(0),
            dig_t2: i16_at(2),
            dig_t3: i16_at(4),

            dig_p1: u16_at(6),
            dig_p2: i16_at(8),
            dig_p3: i16_at(10),
            dig_p4: i16_at(12),
            dig_p5: i16_at(14),
            dig_p6: i16_at(16),
            dig_p7: i16_at(18),
            dig_p8: i16_at(20),
            dig_p9: i16_at(22),

            // byte 24 is reserved
            dig_h1: buffer[25],
            dig_h2: i16_at(26),
            dig_h3: buffer[28],
            dig_h4,
            dig_h5,
            dig_h6: buffer[32] as i8,
        }
    }

    /// Reads both calibration windows and the CRC byte, then checks the block.
    ///
    /// Returns the decoded coefficients only when the CRC matches, so a
    /// caller never sees a partly valid set.
    pub fn load<I: Interface>(interface: &mut I) -> Result<Self, I::Error> {
        let mut crc = [0u8; 1];
        interface
            .write_read(&[CALIBRATION_CRC_REG], &mut crc)
            .map_err(Error::Transport)?;

        let mut buffer = [0u8; BLOCK_LEN];
        let (window_a, window_b) = buffer.split_at_mut(WINDOW_A_LEN);
        interface
            .write_read(&[CALIBRATION_OFFSET_T_P], window_a)
            .map_err(Error::Transport)?;
        interface
            .write_read(&[CALIBRATION_OFFSET_H2], window_b)
            .map_err(Error::Transport)?;

        let computed = crc8(&buffer);
        if computed != crc[0] {
            return Err(Error::CalibrationCrc {
                expected: crc[0],
                computed,
            });
        }

        Ok(Self::from_block(&buffer))
    }
}

/// `dig_h4` and `dig_h5` share their middle byte: its low nibble ends
/// `dig_h4`, its high nibble ends `dig_h5`.
pub fn unpack_h4_h5(h4_msb: u8, shared: u8, h5_msb: u8) -> (i16, i16) {
    let dig_h4 = ((h4_msb as i16) << 4) | (shared & 0x0f) as i16;
    let dig_h5 = ((h5_msb as i16) << 4) | (shared >> 4) as i16;
    (dig_h4, dig_h5)
}

/// CRC-8 over the calibration block: polynomial 0x1d, register preset to
/// 0xff, MSB first, result inverted.
pub fn crc8(buffer: &[u8]) -> u8 {
    let mut crc_reg: u8 = 0xff;

    for &byte in buffer {
        let mut din = byte;
        for _ in 0..8 {
            let feedback = (crc_reg & 0x80 != 0) ^ (din & 0x80 != 0);
            crc_reg <<= 1;
            din <<= 1;
            if feedback {
                crc_reg ^= CRC_POLYNOMIAL;
            }
        }
    }

    crc_reg ^ 0xff
}
