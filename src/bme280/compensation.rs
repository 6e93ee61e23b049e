//! Conversion of raw ADC counts to physical units.
//!
//! These are the double precision formulas from the datasheet. Temperature
//! produces the `t_fine` term first; pressure and humidity are defined in
//! terms of it, so all three outputs of one reading come from the same
//! [`RawSample`].

use super::calibration::CalibrationCoefficients;

pub const TEMPERATURE_MIN: f64 = -40.0;
pub const TEMPERATURE_MAX: f64 = 85.0;
pub const PRESSURE_MIN: f64 = 30_000.0;
pub const PRESSURE_MAX: f64 = 110_000.0;
pub const HUMIDITY_MIN: f64 = 0.0;
pub const HUMIDITY_MAX: f64 = 100.0;

/// Uncompensated counts from one burst read of the data registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// 20 bits.
    pub pressure: u32,
    /// 20 bits.
    pub temperature: u32,
    /// 16 bits.
    pub humidity: u16,
}

impl RawSample {
    /// `press_msb` .. `hum_lsb`: pressure and temperature are 20 bits packed
    /// msb, lsb, xlsb[7:4]; humidity is 16 bits big endian.
    pub fn from_bytes(data: &[u8; 8]) -> Self {
        Self {
            pressure: (data[0] as u32) << 12 | (data[1] as u32) << 4 | (data[2] as u32) >> 4,
            temperature: (data[3] as u32) << 12 | (data[4] as u32) << 4 | (data[5] as u32) >> 4,
            humidity: u16::from_be_bytes([data[6], data[7]]),
        }
    }
}

/// One compensated reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Pascal.
    pub pressure: f64,
    /// Percent relative humidity.
    pub humidity: f64,
}

impl Measurement {
    pub fn compensate(raw: &RawSample, calibration: &CalibrationCoefficients) -> Self {
        let t_fine = t_fine(raw.temperature, calibration);
        Self {
            temperature: temperature(t_fine),
            pressure: pressure(raw.pressure, t_fine, calibration),
            humidity: humidity(raw.humidity, t_fine, calibration),
        }
    }
}

/// Fine resolution temperature shared by the pressure and humidity formulas.
pub fn t_fine(adc_t: u32, calibration: &CalibrationCoefficients) -> i32 {
    let adc_t = adc_t as f64;
    let dig_t1 = calibration.dig_t1 as f64;

    let var1 = (adc_t / 16384.0 - dig_t1 / 1024.0) * calibration.dig_t2 as f64;
    let var2 = adc_t / 131072.0 - dig_t1 / 8192.0;
    let var2 = var2 * var2 * calibration.dig_t3 as f64;

    (var1 + var2) as i32
}

pub fn temperature(t_fine: i32) -> f64 {
    (t_fine as f64 / 5120.0).clamp(TEMPERATURE_MIN, TEMPERATURE_MAX)
}

pub fn pressure(adc_p: u32, t_fine: i32, calibration: &CalibrationCoefficients) -> f64 {
    let c = calibration;

    let mut var1 = t_fine as f64 / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * c.dig_p6 as f64 / 32768.0;
    var2 += var1 * c.dig_p5 as f64 * 2.0;
    var2 = var2 / 4.0 + c.dig_p4 as f64 * 65536.0;
    let var3 = c.dig_p3 as f64 * var1 * var1 / 524288.0;
    var1 = (var3 + c.dig_p2 as f64 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * c.dig_p1 as f64;

    // dig_p1 == 0 or a degenerate t_fine; no valid reading to divide out
    if var1 <= 0.0 {
        return PRESSURE_MIN;
    }

    let mut p = 1048576.0 - adc_p as f64;
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    let var1 = c.dig_p9 as f64 * p * p / 2147483648.0;
    let var2 = p * c.dig_p8 as f64 / 32768.0;
    p += (var1 + var2 + c.dig_p7 as f64) / 16.0;

    p.clamp(PRESSURE_MIN, PRESSURE_MAX)
}

pub fn humidity(adc_h: u16, t_fine: i32, calibration: &CalibrationCoefficients) -> f64 {
    let c = calibration;

    let var1 = t_fine as f64 - 76800.0;
    let var2 = c.dig_h4 as f64 * 64.0 + c.dig_h5 as f64 / 16384.0 * var1;
    let var3 = adc_h as f64 - var2;
    let var4 = c.dig_h2 as f64 / 65536.0;
    let var5 = 1.0 + c.dig_h3 as f64 / 67108864.0 * var1;
    let var6 = 1.0 + c.dig_h6 as f64 / 67108864.0 * var1 * var5;
    let var6 = var3 * var4 * (var5 * var6);

    let h = var6 * (1.0 - c.dig_h1 as f64 * var6 / 524288.0);
    h.clamp(HUMIDITY_MIN, HUMIDITY_MAX)
}
