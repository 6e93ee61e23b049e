use core::fmt;

use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use super::calibration::WINDOW_A_LEN;
use super::Interface;

/// Largest write + read span a single chip-select frame can carry.
///
/// The longest request the driver makes is the first calibration window:
/// one register byte plus [`WINDOW_A_LEN`] data bytes.
pub const MAX_FRAME: usize = 32;

const READ_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError<S, P> {
    /// The full-duplex transfer itself failed.
    Spi(S),
    /// Driving the chip-select line failed.
    Pin(P),
    /// `write.len() + read.len()` exceeds [`MAX_FRAME`].
    FrameTooLong,
    /// A write that is not made of register/value pairs.
    UnpairedWrite,
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for SpiError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiError::Spi(e) => write!(f, "spi transfer failed: {:?}", e),
            SpiError::Pin(e) => write!(f, "chip select failed: {:?}", e),
            SpiError::FrameTooLong => write!(f, "spi frame longer than {} bytes", MAX_FRAME),
            SpiError::UnpairedWrite => write!(f, "spi write is not register/value pairs"),
        }
    }
}

/// Chip-selected device on a full-duplex bus.
///
/// The bus clocks a byte in for every byte it clocks out, so a register read
/// is sent as one frame of `write.len() + read.len()` bytes: the write span
/// sits at the front, the tail is padding, and the bytes of interest are
/// spliced back out of the frame from `write.len()` on.
pub struct SpiInterface<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS, S, P> SpiInterface<SPI, CS>
where
    SPI: Transfer<u8, Error = S>,
    CS: OutputPin<Error = P>,
{
    /// The chip select is left as given; it is only driven around transfers.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn transfer_frame(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), SpiError<S, P>> {
        let len = write.len() + read.len();
        if len > MAX_FRAME {
            return Err(SpiError::FrameTooLong);
        }

        let mut buffer = [0u8; MAX_FRAME];
        let frame = &mut buffer[..len];
        frame[..write.len()].copy_from_slice(write);

        self.cs.set_low().map_err(SpiError::Pin)?;
        let result = self.spi.transfer(frame).map(|received| {
            read.copy_from_slice(&received[write.len()..]);
        });
        self.cs.set_high().map_err(SpiError::Pin)?;

        result.map_err(SpiError::Spi)
    }
}

impl<SPI, CS, S, P> Interface for SpiInterface<SPI, CS>
where
    SPI: Transfer<u8, Error = S>,
    CS: OutputPin<Error = P>,
{
    type Error = SpiError<S, P>;

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error> {
        if write.len() > MAX_FRAME {
            return Err(SpiError::FrameTooLong);
        }
        let mut frame = [0u8; MAX_FRAME];
        let frame = &mut frame[..write.len()];
        frame.copy_from_slice(write);
        if let Some(register) = frame.first_mut() {
            if !read.is_empty() {
                *register |= READ_BIT;
            }
        }
        self.transfer_frame(frame, read)
    }

    // Burst writes are register/value pairs; each register byte goes out
    // with the read bit cleared.
    fn write(&mut self, write: &[u8]) -> Result<(), Self::Error> {
        if write.len() % 2 != 0 {
            return Err(SpiError::UnpairedWrite);
        }
        if write.len() > MAX_FRAME {
            return Err(SpiError::FrameTooLong);
        }
        let mut frame = [0u8; MAX_FRAME];
        let frame = &mut frame[..write.len()];
        frame.copy_from_slice(write);
        for register in frame.iter_mut().step_by(2) {
            *register &= !READ_BIT;
        }
        self.transfer_frame(frame, &mut [])
    }
}
