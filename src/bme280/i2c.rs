use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::Interface;

/// Bus clock the sensor is driven at when the controller is opened (fast mode).
pub const I2C_FAST_MODE_HZ: u32 = 400_000;

/// 7-bit device address, selected by the level on the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// SDO tied to GND.
    #[default]
    Primary = 0x76,
    /// SDO tied to VDDIO.
    Secondary = 0x77,
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address as u8
    }
}

pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> I2cInterface<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self {
            i2c,
            address: address.into(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Interface for I2cInterface<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = E;

    // Register address then data with a repeated start, no stop in between.
    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, write, read)
    }

    fn write(&mut self, write: &[u8]) -> Result<(), E> {
        self.i2c.write(self.address, write)
    }
}
