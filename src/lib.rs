#![cfg_attr(not(test), no_std)]
//! Platform agnostic driver for the Bosch BME280 humidity, pressure and
//! temperature sensor, built on the `embedded-hal` blocking traits.
//!
//! The sensor can sit on I2C (address 0x76 or 0x77, fast mode) or on 4-wire
//! SPI behind a chip select. Either way the bus controller is set up by the
//! caller; the driver takes the open bus handle.
//!
//! ```
//! # use embedded_hal_mock::delay::MockNoop;
//! # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! # let block = [
//! #     0x70, 0x6b, 0x43, 0x67, 0x18, 0xfc, 0x7d, 0x8e, 0x43, 0xd6, 0xd0, 0x0b, 0x27, 0x0b,
//! #     0x8c, 0x00, 0xf9, 0xff, 0x8c, 0x3c, 0xf8, 0xc6, 0x70, 0x17, 0x00, 0x4b, 0x6a, 0x01,
//! #     0x00, 0x13, 0x29, 0x03, 0x1e,
//! # ];
//! # let i2c = I2cMock::new(&[
//! #     I2cTransaction::write_read(0x76, vec![0xd0], vec![0x60]),
//! #     I2cTransaction::write(0x76, vec![0xe0, 0xb6]),
//! #     I2cTransaction::write_read(0x76, vec![0xe8], vec![0xaf]),
//! #     I2cTransaction::write_read(0x76, vec![0x88], block[..26].to_vec()),
//! #     I2cTransaction::write_read(0x76, vec![0xe1], block[26..].to_vec()),
//! #     I2cTransaction::write(0x76, vec![0xf2, 0x01]),
//! #     I2cTransaction::write(0x76, vec![0xf5, 0x01]),
//! #     I2cTransaction::write(0x76, vec![0xf4, 0x2b]),
//! #     I2cTransaction::write_read(0x76, vec![0xf7], vec![0x65, 0x5a, 0xc0, 0x7e, 0xed, 0x00, 0x75, 0x30]),
//! # ]);
//! # let delay = MockNoop::new();
//! use bme280_core::{Address, BME280};
//!
//! let mut bme280 = BME280::new_i2c(i2c, Address::Primary, delay);
//! bme280.init().unwrap();
//!
//! let measurement = bme280.sample().unwrap();
//! println!("T = {:.2} °C", measurement.temperature);
//! println!("H = {:.2} %", measurement.humidity);
//! println!("P = {:.2} hPa", measurement.pressure / 100.0);
//! # let (interface, _) = bme280.release();
//! # interface.release().done();
//! ```

pub mod bme280;

pub use crate::bme280::calibration::CalibrationCoefficients;
pub use crate::bme280::compensation::{Measurement, RawSample};
pub use crate::bme280::config::{Filter, Mode, Oversampling, Settings, StandbyTime};
pub use crate::bme280::driver::{State, BME280};
pub use crate::bme280::error::Error;
pub use crate::bme280::i2c::{Address, I2cInterface, I2C_FAST_MODE_HZ};
pub use crate::bme280::spi::{SpiError, SpiInterface};
pub use crate::bme280::transport::{Transport, TransportError};
pub use crate::bme280::Interface;
