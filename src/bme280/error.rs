use core::fmt;

/// Driver error, generic over the bus fault type of the [`Interface`](super::Interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The identity register did not hold the expected chip id.
    ChipIdMismatch { found: u8 },
    /// The calibration block does not match the CRC stored on the device.
    CalibrationCrc { expected: u8, computed: u8 },
    /// The bus failed; the underlying error is passed through as is.
    Transport(E),
    /// The call needs a successful `init` first.
    NotInitialized,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChipIdMismatch { found } => {
                write!(f, "unexpected chip id {:#04x}", found)
            }
            Error::CalibrationCrc { expected, computed } => write!(
                f,
                "calibration crc mismatch: device {:#04x}, computed {:#04x}",
                expected, computed
            ),
            Error::Transport(e) => write!(f, "bus error: {:?}", e),
            Error::NotInitialized => write!(f, "sensor not initialized"),
        }
    }
}

pub type Result<T, E> = core::result::Result<T, Error<E>>;
