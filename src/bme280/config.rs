use super::{Interface, CONFIG_REG, CTRL_HUM_REG, CTRL_MEAS_REG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Sleep = 0b00,
    /// One conversion, then back to sleep.
    Forced = 0b01,
    /// Free running, one conversion per standby period.
    #[default]
    Normal = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    /// Channel disabled; the data registers hold 0x80000 (0x8000 for humidity).
    Skipped = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    /// Number of internal samples averaged into one reading.
    pub fn samples(self) -> u32 {
        match self {
            Oversampling::Skipped => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    #[default]
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// Inactive time between conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StandbyTime {
    #[default]
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

/// Measurement configuration.
///
/// `Default` is the conservative power-on setup: normal mode, x1
/// oversampling on every channel, no filtering, shortest standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub mode: Mode,
    pub osrs_t: Oversampling,
    pub osrs_p: Oversampling,
    pub osrs_h: Oversampling,
    pub filter: Filter,
    pub standby: StandbyTime,
}

/// Bit 0 of `config`, always written set.
const SPI_3W_BIT: u8 = 1;

impl Settings {
    pub fn ctrl_hum(&self) -> u8 {
        self.osrs_h as u8 & 0b111
    }

    pub fn ctrl_meas(&self) -> u8 {
        (self.osrs_t as u8) << 5 | (self.osrs_p as u8) << 3 | self.mode as u8
    }

    pub fn config(&self) -> u8 {
        (self.standby as u8) << 5 | (self.filter as u8) << 3 | SPI_3W_BIT
    }

    /// Worst case conversion time for these oversampling settings, from the
    /// datasheet's measurement time formula.
    pub fn max_measurement_time_us(&self) -> u32 {
        let mut time = 1250 + 2300 * self.osrs_t.samples();
        if self.osrs_p != Oversampling::Skipped {
            time += 2300 * self.osrs_p.samples() + 575;
        }
        if self.osrs_h != Oversampling::Skipped {
            time += 2300 * self.osrs_h.samples() + 575;
        }
        time
    }

    /// Writes the three control registers.
    ///
    /// `ctrl_hum` only takes effect once `ctrl_meas` is written, so
    /// `ctrl_meas` goes last.
    pub fn write<I: Interface>(&self, interface: &mut I) -> Result<(), I::Error> {
        log::debug!(
            "bme280 settings: ctrl_hum={:#04x} config={:#04x} ctrl_meas={:#04x}",
            self.ctrl_hum(),
            self.config(),
            self.ctrl_meas()
        );
        interface.write(&[CTRL_HUM_REG, self.ctrl_hum()])?;
        interface.write(&[CONFIG_REG, self.config()])?;
        interface.write(&[CTRL_MEAS_REG, self.ctrl_meas()])
    }

    /// Writes only `ctrl_meas`, which in forced mode starts one conversion.
    pub fn trigger<I: Interface>(&self, interface: &mut I) -> Result<(), I::Error> {
        interface.write(&[CTRL_MEAS_REG, self.ctrl_meas()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bme280::i2c::{Address, I2cInterface};
    use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn defaults_are_conservative() {
        let settings = Settings::default();
        assert_eq!(settings.mode, Mode::Normal);
        assert_eq!(settings.osrs_t, Oversampling::X1);
        assert_eq!(settings.osrs_p, Oversampling::X1);
        assert_eq!(settings.osrs_h, Oversampling::X1);
        assert_eq!(settings.filter, Filter::Off);
        assert_eq!(settings.standby, StandbyTime::Ms0_5);

        assert_eq!(settings.ctrl_hum(), 0x01);
        assert_eq!(settings.ctrl_meas(), 0x2b);
        assert_eq!(settings.config(), 0x01);
    }

    #[test]
    fn fields_land_in_their_bit_positions() {
        let settings = Settings {
            mode: Mode::Forced,
            osrs_t: Oversampling::X2,
            osrs_p: Oversampling::X16,
            osrs_h: Oversampling::X8,
            filter: Filter::X16,
            standby: StandbyTime::Ms1000,
        };
        assert_eq!(settings.ctrl_hum(), 0b100);
        // osrs_t << 5 | osrs_p << 3 | mode
        assert_eq!(settings.ctrl_meas(), 0x40 | 0x28 | 0x01);
        // standby << 5 | filter << 3 | 1
        assert_eq!(settings.config(), 0xa0 | 0x20 | 0x01);
    }

    #[test]
    fn forced_mode_encoding() {
        let settings = Settings {
            mode: Mode::Forced,
            osrs_t: Oversampling::X2,
            osrs_p: Oversampling::X4,
            osrs_h: Oversampling::X1,
            filter: Filter::X4,
            standby: StandbyTime::Ms62_5,
        };
        assert_eq!(settings.ctrl_meas(), 0x59);
        assert_eq!(settings.config(), 0x31);
    }

    #[test]
    fn registers_are_written_humidity_config_then_measurement() {
        let settings = Settings {
            mode: Mode::Forced,
            osrs_t: Oversampling::X4,
            osrs_p: Oversampling::X4,
            osrs_h: Oversampling::X4,
            filter: Filter::X2,
            standby: StandbyTime::Ms125,
        };
        let i2c = I2cMock::new(&[
            I2cTransaction::write(0x76, vec![0xf2, 0x03]),
            I2cTransaction::write(0x76, vec![0xf5, 0x49]),
            I2cTransaction::write(0x76, vec![0xf4, 0x79]),
        ]);
        let mut interface = I2cInterface::new(i2c, Address::Primary);
        settings.write(&mut interface).unwrap();
        interface.release().done();
    }

    #[test]
    fn measurement_time_follows_oversampling() {
        assert_eq!(Settings::default().max_measurement_time_us(), 9300);

        let settings = Settings {
            osrs_t: Oversampling::X16,
            osrs_p: Oversampling::Skipped,
            osrs_h: Oversampling::Skipped,
            ..Settings::default()
        };
        assert_eq!(settings.max_measurement_time_us(), 1250 + 2300 * 16);
    }
}
