use core::fmt;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use super::i2c::{Address, I2cInterface};
use super::spi::{SpiError, SpiInterface};
use super::Interface;

/// Bus fault from whichever variant of [`Transport`] is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<I, S> {
    I2c(I),
    Spi(S),
}

impl<I: fmt::Debug, S: fmt::Debug> fmt::Display for TransportError<I, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::I2c(e) => write!(f, "i2c bus error: {:?}", e),
            TransportError::Spi(e) => write!(f, "spi bus error: {:?}", e),
        }
    }
}

/// Either an addressed I2C device or a chip-selected SPI device.
///
/// Use this when the bus is picked at runtime (board variant, config file).
/// The variant is fixed when the value is built.
pub enum Transport<I2C, SPI, CS> {
    I2c(I2cInterface<I2C>),
    Spi(SpiInterface<SPI, CS>),
}

impl<I2C, SPI, CS, IE, SE, PE> Transport<I2C, SPI, CS>
where
    I2C: Write<Error = IE> + WriteRead<Error = IE>,
    SPI: Transfer<u8, Error = SE>,
    CS: OutputPin<Error = PE>,
{
    pub fn i2c(i2c: I2C, address: Address) -> Self {
        Transport::I2c(I2cInterface::new(i2c, address))
    }

    pub fn spi(spi: SPI, cs: CS) -> Self {
        Transport::Spi(SpiInterface::new(spi, cs))
    }

    pub fn is_i2c(&self) -> bool {
        matches!(self, Transport::I2c(_))
    }
}

impl<I2C, SPI, CS, IE, SE, PE> Interface for Transport<I2C, SPI, CS>
where
    I2C: Write<Error = IE> + WriteRead<Error = IE>,
    SPI: Transfer<u8, Error = SE>,
    CS: OutputPin<Error = PE>,
{
    type Error = TransportError<IE, SpiError<SE, PE>>;

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error> {
        match self {
            Transport::I2c(bus) => bus.write_read(write, read).map_err(TransportError::I2c),
            Transport::Spi(bus) => bus.write_read(write, read).map_err(TransportError::Spi),
        }
    }

    fn write(&mut self, write: &[u8]) -> Result<(), Self::Error> {
        match self {
            Transport::I2c(bus) => bus.write(write).map_err(TransportError::I2c),
            Transport::Spi(bus) => bus.write(write).map_err(TransportError::Spi),
        }
    }
}
