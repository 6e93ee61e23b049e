use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use log::{debug, error, info, warn};

use super::calibration::CalibrationCoefficients;
use super::compensation::{Measurement, RawSample};
use super::config::{Mode, Settings};
use super::error::{Error, Result};
use super::i2c::{Address, I2cInterface};
use super::spi::SpiInterface;
use super::{Interface, ID_CODE, ID_REG, PRESS_MSB_REG, RESET_CODE, RESET_REG};

/// Start-up time after a soft reset before the registers can be accessed.
pub const RESET_DELAY_MS: u8 = 2;

/// Fixed wait between the forced-mode trigger and the data read.
///
/// This is shorter than a conversion takes even at x1 oversampling (see
/// [`Settings::max_measurement_time_us`]), so a forced read can return the
/// previous conversion's data.
pub const FORCED_MODE_DELAY_MS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Initialized,
    /// The last `init` failed; call it again to retry.
    Faulted,
}

/// BME280 driver over any [`Interface`].
///
/// Every bus access takes `&mut self` and blocks until the transaction is
/// done; share an instance between threads only behind a lock.
pub struct BME280<I, D> {
    interface: I,
    delay: D,
    state: State,
    calibration: Option<CalibrationCoefficients>,
    settings: Settings,
    last: Option<Measurement>,
}

impl<I2C, D, E> BME280<I2cInterface<I2C>, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u8>,
{
    pub fn new_i2c(i2c: I2C, address: Address, delay: D) -> Self {
        Self::new(I2cInterface::new(i2c, address), delay)
    }
}

impl<SPI, CS, D, S, P> BME280<SpiInterface<SPI, CS>, D>
where
    SPI: Transfer<u8, Error = S>,
    CS: OutputPin<Error = P>,
    D: DelayMs<u8>,
{
    pub fn new_spi(spi: SPI, cs: CS, delay: D) -> Self {
        Self::new(SpiInterface::new(spi, cs), delay)
    }
}

impl<I, D> BME280<I, D>
where
    I: Interface,
    D: DelayMs<u8>,
{
    pub fn new(interface: I, delay: D) -> Self {
        Self {
            interface,
            delay,
            state: State::Uninitialized,
            calibration: None,
            settings: Settings::default(),
            last: None,
        }
    }

    pub fn release(self) -> (I, D) {
        (self.interface, self.delay)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Coefficients loaded by the last successful `init`.
    pub fn calibration(&self) -> Option<&CalibrationCoefficients> {
        self.calibration.as_ref()
    }

    /// The most recent successful reading. A failed `sample` leaves it as is.
    pub fn last_measurement(&self) -> Option<Measurement> {
        self.last
    }

    /// Checks the chip id, resets the device, loads and verifies the
    /// calibration block and writes the default settings.
    ///
    /// On failure the driver is left `Faulted` with no calibration; calling
    /// `init` again starts over.
    pub fn init(&mut self) -> Result<(), I::Error> {
        self.calibration = None;
        self.last = None;
        self.settings = Settings::default();

        match self.try_init() {
            Ok(calibration) => {
                debug!("bme280 calibration: {:?}", calibration);
                self.calibration = Some(calibration);
                self.state = State::Initialized;
                info!("bme280 initialized");
                Ok(())
            }
            Err(e) => {
                self.state = State::Faulted;
                Err(e)
            }
        }
    }

    fn try_init(&mut self) -> Result<CalibrationCoefficients, I::Error> {
        let id = self.chip_id()?;
        if id != ID_CODE {
            error!("bme280 chip id mismatch: {:#04x}", id);
            return Err(Error::ChipIdMismatch { found: id });
        }

        self.reset()?;

        let calibration = CalibrationCoefficients::load(&mut self.interface).map_err(|e| {
            if let Error::CalibrationCrc { expected, computed } = &e {
                error!(
                    "bme280 calibration crc mismatch: device {:#04x}, computed {:#04x}",
                    expected, computed
                );
            }
            e
        })?;

        self.settings
            .write(&mut self.interface)
            .map_err(Error::Transport)?;

        Ok(calibration)
    }

    pub fn chip_id(&mut self) -> Result<u8, I::Error> {
        let mut id = [0u8; 1];
        self.interface
            .write_read(&[ID_REG], &mut id)
            .map_err(Error::Transport)?;
        Ok(id[0])
    }

    fn reset(&mut self) -> Result<(), I::Error> {
        self.interface
            .write(&[RESET_REG, RESET_CODE])
            .map_err(Error::Transport)?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    /// Rewrites the control registers and, once all three writes went
    /// through, replaces the stored settings.
    ///
    /// Calibration and chip id are not checked again.
    pub fn change_settings(&mut self, settings: Settings) -> Result<(), I::Error> {
        self.ensure_initialized()?;

        let conversion_us = settings.max_measurement_time_us();
        if settings.mode == Mode::Forced && conversion_us > FORCED_MODE_DELAY_MS as u32 * 1000 {
            warn!(
                "bme280 forced mode waits {} ms but conversion takes up to {} us",
                FORCED_MODE_DELAY_MS, conversion_us
            );
        }

        settings
            .write(&mut self.interface)
            .map_err(Error::Transport)?;
        self.settings = settings;
        Ok(())
    }

    /// Reads one set of raw counts, triggering a conversion first in forced
    /// mode.
    pub fn read_raw(&mut self) -> Result<RawSample, I::Error> {
        self.ensure_initialized()?;

        if self.settings.mode == Mode::Forced {
            self.settings
                .trigger(&mut self.interface)
                .map_err(Error::Transport)?;
            self.delay.delay_ms(FORCED_MODE_DELAY_MS);
        }

        let mut data = [0u8; 8];
        self.interface
            .write_read(&[PRESS_MSB_REG], &mut data)
            .map_err(Error::Transport)?;
        Ok(RawSample::from_bytes(&data))
    }

    /// Takes a reading and compensates it.
    ///
    /// Temperature, pressure and humidity all come from the same raw sample
    /// and the same `t_fine`.
    pub fn sample(&mut self) -> Result<Measurement, I::Error> {
        let raw = self.read_raw()?;
        let calibration = self.calibration.as_ref().ok_or(Error::NotInitialized)?;
        let measurement = Measurement::compensate(&raw, calibration);
        self.last = Some(measurement);
        Ok(measurement)
    }

    fn ensure_initialized(&self) -> Result<(), I::Error> {
        match self.state {
            State::Initialized => Ok(()),
            _ => Err(Error::NotInitialized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bme280::calibration::tests::{coefficients, BLOCK, BLOCK_CRC};
    use crate::bme280::calibration::WINDOW_A_LEN;
    use crate::bme280::config::{Filter, Oversampling, StandbyTime};
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::MockError;
    use std::io::ErrorKind;
    use std::vec::Vec;

    const ADDR: u8 = 0x76;
    // pressure 415148, temperature 519888, humidity 30000
    const DATA: [u8; 8] = [0x65, 0x5a, 0xc0, 0x7e, 0xed, 0x00, 0x75, 0x30];

    fn init_transactions(id: u8, crc: u8) -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write_read(ADDR, vec![0xd0], vec![id]),
            I2cTransaction::write(ADDR, vec![0xe0, 0xb6]),
            I2cTransaction::write_read(ADDR, vec![0xe8], vec![crc]),
            I2cTransaction::write_read(ADDR, vec![0x88], BLOCK[..WINDOW_A_LEN].to_vec()),
            I2cTransaction::write_read(ADDR, vec![0xe1], BLOCK[WINDOW_A_LEN..].to_vec()),
            I2cTransaction::write(ADDR, vec![0xf2, 0x01]),
            I2cTransaction::write(ADDR, vec![0xf5, 0x01]),
            I2cTransaction::write(ADDR, vec![0xf4, 0x2b]),
        ]
    }

    fn driver(transactions: &[I2cTransaction]) -> BME280<I2cInterface<I2cMock>, MockNoop> {
        BME280::new_i2c(I2cMock::new(transactions), Address::Primary, MockNoop::new())
    }

    fn finish(bme280: BME280<I2cInterface<I2cMock>, MockNoop>) {
        let (interface, _) = bme280.release();
        interface.release().done();
    }

    #[test]
    fn init_then_sample_in_normal_mode() {
        let mut transactions = init_transactions(0x60, BLOCK_CRC);
        transactions.push(I2cTransaction::write_read(ADDR, vec![0xf7], DATA.to_vec()));

        let mut bme280 = driver(&transactions);
        assert_eq!(bme280.state(), State::Uninitialized);
        bme280.init().unwrap();
        assert_eq!(bme280.state(), State::Initialized);
        assert_eq!(bme280.calibration(), Some(&coefficients()));

        let m = bme280.sample().unwrap();
        assert!((m.temperature - 25.082421875).abs() < 1e-6);
        assert!((m.pressure - 100653.25814481472).abs() < 1e-6);
        assert!((m.humidity - 55.000712804837015).abs() < 1e-6);
        assert_eq!(bme280.last_measurement(), Some(m));
        finish(bme280);
    }

    #[test]
    fn wrong_chip_id_faults_before_reset() {
        let transactions = [I2cTransaction::write_read(ADDR, vec![0xd0], vec![0x58])];
        let mut bme280 = driver(&transactions);
        assert!(matches!(
            bme280.init(),
            Err(Error::ChipIdMismatch { found: 0x58 })
        ));
        assert_eq!(bme280.state(), State::Faulted);
        assert_eq!(bme280.calibration(), None);
        finish(bme280);
    }

    #[test]
    fn crc_mismatch_faults_without_writing_settings() {
        let transactions = init_transactions(0x60, BLOCK_CRC ^ 0x01);
        let mut bme280 = driver(&transactions[..5]);
        assert!(matches!(
            bme280.init(),
            Err(Error::CalibrationCrc { expected, computed })
                if expected == BLOCK_CRC ^ 0x01 && computed == BLOCK_CRC
        ));
        assert_eq!(bme280.state(), State::Faulted);
        assert_eq!(bme280.calibration(), None);
        assert!(matches!(bme280.sample(), Err(Error::NotInitialized)));
        finish(bme280);
    }

    #[test]
    fn init_can_be_retried_after_a_fault() {
        let mut transactions = vec![I2cTransaction::write_read(ADDR, vec![0xd0], vec![0x00])
            .with_error(MockError::Io(ErrorKind::TimedOut))];
        transactions.extend(init_transactions(0x60, BLOCK_CRC));

        let mut bme280 = driver(&transactions);
        assert!(matches!(bme280.init(), Err(Error::Transport(_))));
        assert_eq!(bme280.state(), State::Faulted);
        bme280.init().unwrap();
        assert_eq!(bme280.state(), State::Initialized);
        finish(bme280);
    }

    #[test]
    fn calls_before_init_are_rejected() {
        let mut bme280 = driver(&[]);
        assert!(matches!(bme280.sample(), Err(Error::NotInitialized)));
        assert!(matches!(bme280.read_raw(), Err(Error::NotInitialized)));
        assert!(matches!(
            bme280.change_settings(Settings::default()),
            Err(Error::NotInitialized)
        ));
        finish(bme280);
    }

    #[test]
    fn forced_mode_triggers_each_reading() {
        let settings = Settings {
            mode: Mode::Forced,
            osrs_t: Oversampling::X2,
            osrs_p: Oversampling::X4,
            osrs_h: Oversampling::X1,
            filter: Filter::X4,
            standby: StandbyTime::Ms62_5,
        };
        let mut transactions = init_transactions(0x60, BLOCK_CRC);
        transactions.extend([
            I2cTransaction::write(ADDR, vec![0xf2, 0x01]),
            I2cTransaction::write(ADDR, vec![0xf5, 0x31]),
            I2cTransaction::write(ADDR, vec![0xf4, 0x59]),
            I2cTransaction::write(ADDR, vec![0xf4, 0x59]),
            I2cTransaction::write_read(ADDR, vec![0xf7], DATA.to_vec()),
            I2cTransaction::write(ADDR, vec![0xf4, 0x59]),
            I2cTransaction::write_read(ADDR, vec![0xf7], DATA.to_vec()),
        ]);

        let mut bme280 = driver(&transactions);
        bme280.init().unwrap();
        bme280.change_settings(settings).unwrap();
        assert_eq!(bme280.settings(), &settings);
        let first = bme280.read_raw().unwrap();
        let second = bme280.read_raw().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.temperature, 519888);
        finish(bme280);
    }

    #[test]
    fn failed_settings_write_keeps_the_previous_settings() {
        let mut transactions = init_transactions(0x60, BLOCK_CRC);
        transactions.extend([
            I2cTransaction::write(ADDR, vec![0xf2, 0x01])
                .with_error(MockError::Io(ErrorKind::TimedOut)),
            I2cTransaction::write_read(ADDR, vec![0xf7], DATA.to_vec()),
        ]);

        let mut bme280 = driver(&transactions);
        bme280.init().unwrap();
        let forced = Settings {
            mode: Mode::Forced,
            ..Settings::default()
        };
        assert!(matches!(
            bme280.change_settings(forced),
            Err(Error::Transport(_))
        ));
        assert_eq!(bme280.settings(), &Settings::default());

        // still in normal mode: no trigger before the burst read
        let raw = bme280.read_raw().unwrap();
        assert_eq!(raw.temperature, 519888);
        finish(bme280);
    }

    #[test]
    fn failed_sample_keeps_the_last_reading() {
        let mut transactions = init_transactions(0x60, BLOCK_CRC);
        transactions.extend([
            I2cTransaction::write_read(ADDR, vec![0xf7], DATA.to_vec()),
            I2cTransaction::write_read(ADDR, vec![0xf7], vec![0; 8])
                .with_error(MockError::Io(ErrorKind::TimedOut)),
        ]);

        let mut bme280 = driver(&transactions);
        bme280.init().unwrap();
        let good = bme280.sample().unwrap();
        assert!(matches!(bme280.sample(), Err(Error::Transport(_))));
        assert_eq!(bme280.last_measurement(), Some(good));
        assert_eq!(bme280.state(), State::Initialized);
        finish(bme280);
    }
}
