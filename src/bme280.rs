pub mod calibration;
pub mod compensation;
pub mod config;
pub mod driver;
pub mod error;
pub mod i2c;
pub mod spi;
pub mod transport;

pub(crate) const ID_REG: u8 = 0xd0;
pub(crate) const ID_CODE: u8 = 0x60;

pub(crate) const RESET_REG: u8 = 0xe0;
pub(crate) const RESET_CODE: u8 = 0xb6;

pub(crate) const CALIBRATION_OFFSET_T_P: u8 = 0x88;
pub(crate) const CALIBRATION_OFFSET_H2: u8 = 0xe1;
pub(crate) const CALIBRATION_CRC_REG: u8 = 0xe8;

pub(crate) const CTRL_HUM_REG: u8 = 0xf2;
pub(crate) const CTRL_MEAS_REG: u8 = 0xf4;
pub(crate) const CONFIG_REG: u8 = 0xf5;
pub(crate) const PRESS_MSB_REG: u8 = 0xf7;

/// Register-level access to the sensor over one of its serial buses.
///
/// `write` sends register/value pairs (`[reg, value, reg, value, ..]`); the
/// chip-select variant relies on the pairing to clear the read bit on each
/// register byte and rejects odd lengths. `write_read` sends `write` and then
/// fills `read` with the bytes the device returns, as one bus transaction.
/// On the chip-select variant both spans together are capped at
/// [`spi::MAX_FRAME`] bytes; the addressed variant has no cap of its own.
/// Bus faults come back untouched in `Self::Error`; nothing is retried here.
pub trait Interface {
    type Error;

    fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error>;

    fn write(&mut self, write: &[u8]) -> Result<(), Self::Error> {
        self.write_read(write, &mut [])
    }
}
