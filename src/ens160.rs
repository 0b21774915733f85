// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use bitfield::bitfield;
use i2cdev::core::*;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::{debug, trace};
use std::error::Error;
use std::fmt;
use std::{thread, time};

/// Default 7-bit bus address of the ENS160.
pub const DEFAULT_I2C_ADDRESS: u16 = 0x53;
/// Bus device the convenience constructor opens.
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
/// Expected content of the part id register.
pub const ENS160_PART_ID: u16 = 0x0160;

// ENS160 register addresses.
// This 2-byte register contains the part number of the ENS160, little endian.
const REG_PART_ID: u8 = 0x00;
// This 1-byte register sets the operating mode of the ENS160.
const REG_OPMODE: u8 = 0x10;
// This 1-byte register configures the action of the INTn pin.
const REG_CONFIG: u8 = 0x11;
// This 1-byte register allows some additional commands to be executed.
const REG_COMMAND: u8 = 0x12;
// This 2-byte register takes ambient temperature data for compensation.
const REG_TEMP_IN: u8 = 0x13;
// This 2-byte register takes relative humidity data for compensation.
const REG_RH_IN: u8 = 0x15;
// This 1-byte register indicates the current status of the ENS160.
const REG_DEVICE_STATUS: u8 = 0x20;
// This 2-byte register reports the calculated TVOC concentration in ppb.
const REG_DATA_TVOC: u8 = 0x22;
// This 2-byte register reports the calculated equivalent CO2 concentration in ppm.
const REG_DATA_ECO2: u8 = 0x24;
// First general purpose read register, holds the gas resistance index.
const REG_GPR_READ0: u8 = 0x48;
// Fifth general purpose read register, holds the firmware version after GET_APPVER.
const REG_GPR_READ4: u8 = 0x4C;

// COMMAND register opcodes. The device only services these in idle mode.
const CMD_GET_APPVER: u8 = 0x0E;
const CMD_CLRGPR: u8 = 0xCC;

// Settle time granted to the device after mode and command writes.
const SETTLE_MILLIS: u64 = 20;

///
///ENS160 error enum, generic over the error type
///of the underlying bus device. DeviceNotFound when
///the part id register does not answer or holds a
///foreign part number. InvalidMode when the operating
///mode register holds an undocumented value. ValueRange
///when a compensation value is outside the documented
///bounds, rejected before any bus traffic.
///
#[derive(Debug)]
pub enum Ens160Error<E> {
    /// Transport failure on the I2C bus
    Bus(E),
    /// Part id read at initialization, 0x0000 when the register was unreadable
    DeviceNotFound(u16),
    /// Raw content of the operating mode register
    InvalidMode(u8),
    /// Which value was rejected and its documented bounds
    ValueRange(&'static str),
}

///Implementation of display for Ens160Error
impl<E: fmt::Display> fmt::Display for Ens160Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Ens160Error::Bus(ref e) => write!(f, "I2C transport error: {}", e),
            Ens160Error::DeviceNotFound(id) => {
                write!(f, "No ENS160 on the bus, part id register read 0x{:04X}", id)
            }
            Ens160Error::InvalidMode(raw) => {
                write!(f, "Operating mode register holds undocumented value 0x{:02X}", raw)
            }
            Ens160Error::ValueRange(what) => write!(f, "Value out of range: {}", what),
        }
    }
}

///Implementation for Error to Ens160Error
impl<E: fmt::Debug + fmt::Display> Error for Ens160Error<E> {}

/// Operating mode of the sensor, written to the OPMODE register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatingMode {
    /// DEEP SLEEP mode (low power standby)
    DeepSleep = 0x00,
    /// IDLE mode (low power, commands accepted)
    Idle = 0x01,
    /// STANDARD gas sensing mode
    Standard = 0x02,
    /// Reboots the device
    Reset = 0xF0,
}

impl TryFrom<u8> for OperatingMode {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0x00 => Ok(Self::DeepSleep),
            0x01 => Ok(Self::Idle),
            0x02 => Ok(Self::Standard),
            0xF0 => Ok(Self::Reset),
            other => Err(other),
        }
    }
}

/// Validity field of the status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Outputs are trustworthy
    NormalOperation,
    /// First run after a long poweroff, outputs still settling
    WarmUp,
    /// First minutes after power on
    InitialStartUp,
    /// Outputs must be discarded
    InvalidOutput,
}

impl From<u8> for Validity {
    fn from(v: u8) -> Self {
        match v {
            0b00 => Self::NormalOperation,
            0b01 => Self::WarmUp,
            0b10 => Self::InitialStartUp,
            0b11 => Self::InvalidOutput,
            _ => unreachable!(),
        }
    }
}

bitfield! {
    /// Snapshot of the DEVICE_STATUS register.
    pub struct Status(u8);
    impl Debug;
    pub bool, running_normally, _: 7;
    pub bool, error, _: 6;
    pub into Validity, validity, _: 3, 2;
    pub bool, new_data, _: 1;
    pub bool, new_gpr_data, _: 0;
}

/// Air quality category, classified from the eCO2 concentration.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum AirQualityIndex {
    Excellent = 1,
    Good = 2,
    Moderate = 3,
    Poor = 4,
    Unhealthy = 5,
}

impl AirQualityIndex {
    /// Classifies an eCO2 concentration in ppm into the five categories.
    /// The table is fixed, so classification is deterministic.
    pub fn from_eco2(eco2_ppm: u16) -> Self {
        match eco2_ppm {
            0..=599 => Self::Excellent,
            600..=999 => Self::Good,
            1000..=1499 => Self::Moderate,
            1500..=2499 => Self::Poor,
            _ => Self::Unhealthy,
        }
    }
}

/// One converted reading of the sensor outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Measurement {
    /// Equivalent CO2 concentration in ppm
    pub eco2: u16,
    /// Total volatile organic compounds in ppb
    pub tvoc: u16,
    /// Air quality category derived from eCO2
    pub aqi: AirQualityIndex,
    /// Unscaled gas resistance index
    pub raw_resistance: u32,
}

impl Default for Measurement {
    fn default() -> Self {
        Measurement {
            eco2: 0,
            tvoc: 0,
            aqi: AirQualityIndex::Excellent,
            raw_resistance: 0,
        }
    }
}

/// Polarity of the INTn pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPolarity {
    ActiveLow,
    ActiveHigh,
}

/// Output stage of the INTn pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPinDrive {
    OpenDrain,
    PushPull,
}

/// Configuration of the INTn pin, written to the CONFIG register.
#[derive(Debug, Clone, Copy)]
pub struct InterruptConfig {
    /// Master enable for the pin
    pub enabled: bool,
    /// Assert when a new measurement is available
    pub on_new_data: bool,
    /// Assert when new general purpose read data is available
    pub on_new_gpr_data: bool,
    pub polarity: InterruptPolarity,
    pub pin_drive: InterruptPinDrive,
}

impl InterruptConfig {
    fn to_bits(self) -> u8 {
        let mut bits = 0u8;
        if self.enabled {
            bits |= 1 << 0;
        }
        if self.on_new_data {
            bits |= 1 << 1;
        }
        if self.on_new_gpr_data {
            bits |= 1 << 3;
        }
        if self.pin_drive == InterruptPinDrive::PushPull {
            bits |= 1 << 5;
        }
        if self.polarity == InterruptPolarity::ActiveHigh {
            bits |= 1 << 6;
        }
        bits
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        InterruptConfig {
            enabled: false,
            on_new_data: false,
            on_new_gpr_data: false,
            polarity: InterruptPolarity::ActiveLow,
            pin_drive: InterruptPinDrive::OpenDrain,
        }
    }
}

/// ENS160 struct, wraps a bus device implementing the
/// I2CDevice trait and has implemented related ENS160
/// operations. Keeps the last valid measurement and the
/// last operating mode written.
///
pub struct Ens160<D: I2CDevice> {
    pub i2cdev: D,
    mode: OperatingMode,
    last: Measurement,
}

impl Ens160<LinuxI2CDevice> {
    /// Create a new ENS160 struct on the default bus and address.
    ///
    /// Tries to open /dev/i2c-1 on standard address 0x53.
    /// If fails, returns an LinuxI2CError from i2cdev
    ///
    pub fn new() -> Result<Ens160<LinuxI2CDevice>, LinuxI2CError> {
        Self::with_bus(DEFAULT_I2C_BUS, DEFAULT_I2C_ADDRESS)
    }

    /// Create a new ENS160 struct on the given bus device and address.
    pub fn with_bus(bus: &str, address: u16) -> Result<Ens160<LinuxI2CDevice>, LinuxI2CError> {
        let device = LinuxI2CDevice::new(bus, address)?;
        Ok(Self::from_device(device))
    }
}

/// Implementation of ENS160 related
/// operations
///
///
impl<D: I2CDevice> Ens160<D> {
    /// Wrap an already opened bus device.
    pub fn from_device(i2cdev: D) -> Ens160<D> {
        Ens160 {
            i2cdev,
            // power on state of the OPMODE register
            mode: OperatingMode::DeepSleep,
            last: Measurement::default(),
        }
    }

    /// Releases the underlying bus device and destroys the driver.
    pub fn release(self) -> D {
        self.i2cdev
    }

    /// Checks the part id of the device and switches it to
    /// standard gas sensing mode.
    /// If the part id register is unreadable or holds a foreign
    /// part number, returns DeviceNotFound and leaves the
    /// operating mode register untouched.
    ///
    pub fn initialize(&mut self) -> Result<(), Ens160Error<D::Error>> {
        // a device that never answers reads the same as a foreign part
        let id = match self.part_id() {
            Ok(id) => id,
            Err(_) => return Err(Ens160Error::DeviceNotFound(0x0000)),
        };
        if id != ENS160_PART_ID {
            return Err(Ens160Error::DeviceNotFound(id));
        }
        debug!("ens160: part id 0x{:04X} verified", id);
        self.set_mode(OperatingMode::Standard)
    }

    /// Reads the 2 byte part number of the device.
    pub fn part_id(&mut self) -> Result<u16, Ens160Error<D::Error>> {
        self.read_register::<2>(REG_PART_ID).map(u16::from_le_bytes)
    }

    /// Writes the given operating mode to the device and records it.
    /// If fails returns Ens160Error,
    /// else return nothing.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Ens160Error<D::Error>> {
        self.write_register([REG_OPMODE, mode as u8])?;
        let settle = time::Duration::from_millis(SETTLE_MILLIS);
        thread::sleep(settle);
        self.mode = mode;
        debug!("ens160: operating mode set to {:?}", mode);
        Ok(())
    }

    /// Reads the operating mode register back from the device.
    /// Returns InvalidMode if the register holds a value outside
    /// the documented set.
    pub fn mode(&mut self) -> Result<OperatingMode, Ens160Error<D::Error>> {
        let raw = self.read_register::<1>(REG_OPMODE)?[0];
        OperatingMode::try_from(raw).map_err(Ens160Error::InvalidMode)
    }

    /// Reboot the sensor device.
    /// If fails, return Ens160Error.
    ///
    pub fn reset(&mut self) -> Result<(), Ens160Error<D::Error>> {
        self.set_mode(OperatingMode::Reset)
    }

    /// Reads one status byte and decodes validity, new-data and
    /// new-GPR-data flags.
    pub fn read_status(&mut self) -> Result<Status, Ens160Error<D::Error>> {
        self.read_register::<1>(REG_DEVICE_STATUS).map(|v| Status(v[0]))
    }

    /// Gets the newest measurement of the device.
    ///
    /// Checks the status register first. When the device reports
    /// new data under normal operation, reads eCO2, TVOC and the
    /// gas resistance index, classifies the air quality and caches
    /// the result. Otherwise the previously cached measurement is
    /// returned unchanged, so stale outputs never overwrite a valid
    /// reading. Transport failures are propagated, not retried.
    ///
    pub fn poll(&mut self) -> Result<Measurement, Ens160Error<D::Error>> {
        let status = self.read_status()?;
        if !status.new_data() || status.validity() != Validity::NormalOperation {
            trace!("ens160: no fresh sample, keeping cached measurement");
            return Ok(self.last);
        }
        let eco2 = self.eco2()?;
        let tvoc = self.tvoc()?;
        let raw_resistance = self.read_register::<4>(REG_GPR_READ0).map(u32::from_le_bytes)?;
        let measurement = Measurement {
            eco2,
            tvoc,
            aqi: AirQualityIndex::from_eco2(eco2),
            raw_resistance,
        };
        self.last = measurement;
        trace!("ens160: new measurement {:?}", measurement);
        Ok(measurement)
    }

    /// Returns the last measurement accepted by poll without
    /// touching the bus.
    pub fn last_measurement(&self) -> Measurement {
        self.last
    }

    /// Reads the equivalent CO2 concentration in ppm, range 400-65000.
    pub fn eco2(&mut self) -> Result<u16, Ens160Error<D::Error>> {
        self.read_register::<2>(REG_DATA_ECO2).map(u16::from_le_bytes)
    }

    /// Reads the TVOC concentration in ppb, range 0-65000.
    pub fn tvoc(&mut self) -> Result<u16, Ens160Error<D::Error>> {
        self.read_register::<2>(REG_DATA_TVOC).map(u16::from_le_bytes)
    }

    /// Configures the INTn pin of the device.
    pub fn set_interrupt_config(&mut self, config: InterruptConfig) -> Result<(), Ens160Error<D::Error>> {
        self.write_register([REG_CONFIG, config.to_bits()])
    }

    /// Sets the ambient temperature used by the gas sensing algorithm,
    /// floating point degrees C.
    /// Values outside the operating range of the device, -40 to 85
    /// degrees C, return ValueRange and nothing is written.
    ///
    pub fn set_temperature_compensation(&mut self, celsius: f32) -> Result<(), Ens160Error<D::Error>> {
        if !(-40.0..=85.0).contains(&celsius) {
            return Err(Ens160Error::ValueRange(
                "temperature compensation must be within -40..=85 degrees C",
            ));
        }
        // Kelvin times 64, rounded
        let raw = ((celsius + 273.15) * 64.0 + 0.5) as u16;
        let raw = raw.to_le_bytes();
        self.write_register([REG_TEMP_IN, raw[0], raw[1]])
    }

    /// Checks the temperature compensation setting of the device,
    /// in degrees C.
    pub fn temperature_compensation(&mut self) -> Result<f32, Ens160Error<D::Error>> {
        self.read_register::<2>(REG_TEMP_IN)
            .map(|v| f32::from(u16::from_le_bytes(v)) / 64.0 - 273.15)
    }

    /// Sets the ambient relative humidity used by the gas sensing
    /// algorithm, percentage 0-100.
    /// Values outside 0 to 100 percent return ValueRange and nothing
    /// is written.
    ///
    pub fn set_humidity_compensation(&mut self, percent: f32) -> Result<(), Ens160Error<D::Error>> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(Ens160Error::ValueRange(
                "relative humidity compensation must be within 0..=100 percent",
            ));
        }
        let raw = ((percent * 512.0) + 0.5) as u16;
        let raw = raw.to_le_bytes();
        self.write_register([REG_RH_IN, raw[0], raw[1]])
    }

    /// Checks the relative humidity compensation setting of the
    /// device, in percent.
    pub fn humidity_compensation(&mut self) -> Result<f32, Ens160Error<D::Error>> {
        self.read_register::<2>(REG_RH_IN)
            .map(|v| f32::from(u16::from_le_bytes(v)) / 512.0)
    }

    /// Checks the firmware version of the device.
    /// Issues the GET_APPVER command and reads the version triple
    /// from the general purpose read registers. The device services
    /// commands in idle mode only.
    ///
    pub fn firmware_version(&mut self) -> Result<(u8, u8, u8), Ens160Error<D::Error>> {
        self.write_register([REG_COMMAND, CMD_GET_APPVER])?;
        let settle = time::Duration::from_millis(SETTLE_MILLIS);
        thread::sleep(settle);
        let v = self.read_register::<3>(REG_GPR_READ4)?;
        Ok((v[0], v[1], v[2]))
    }

    /// Clears the general purpose read registers and the
    /// new-GPR-data flag.
    pub fn clear_gpr_flags(&mut self) -> Result<(), Ens160Error<D::Error>> {
        self.write_register([REG_COMMAND, CMD_CLRGPR])?;
        thread::sleep(time::Duration::from_millis(SETTLE_MILLIS));
        Ok(())
    }

    fn read_register<const N: usize>(&mut self, register: u8) -> Result<[u8; N], Ens160Error<D::Error>> {
        self.i2cdev.write(&[register]).map_err(Ens160Error::Bus)?;
        let mut buffer = [0u8; N];
        self.i2cdev.read(&mut buffer).map_err(Ens160Error::Bus)?;
        Ok(buffer)
    }

    fn write_register<const N: usize>(&mut self, buffer: [u8; N]) -> Result<(), Ens160Error<D::Error>> {
        self.i2cdev.write(&buffer).map_err(Ens160Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use i2cdev::mock::MockI2CDevice;

    fn mock_with_part_id() -> MockI2CDevice {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REG_PART_ID as usize, &[0x60, 0x01]);
        dev
    }

    #[test]
    fn initialize_switches_a_matching_device_to_standard() {
        let mut sensor = Ens160::from_device(mock_with_part_id());
        sensor.initialize().unwrap();
        assert_eq!(sensor.mode().unwrap(), OperatingMode::Standard);
    }

    #[test]
    fn initialize_rejects_a_foreign_part_id_without_mutating_mode() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REG_PART_ID as usize, &[0x34, 0x12]);
        let mut sensor = Ens160::from_device(dev);
        match sensor.initialize() {
            Err(Ens160Error::DeviceNotFound(id)) => assert_eq!(id, 0x1234),
            other => panic!("expected DeviceNotFound, got {:?}", other),
        }
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_OPMODE).unwrap(), 0x00);
    }

    #[test]
    fn set_mode_round_trips_through_the_mode_register() {
        let modes = [
            OperatingMode::DeepSleep,
            OperatingMode::Idle,
            OperatingMode::Standard,
            OperatingMode::Reset,
        ];
        for mode in modes {
            let mut sensor = Ens160::from_device(MockI2CDevice::new());
            sensor.set_mode(mode).unwrap();
            assert_eq!(sensor.mode().unwrap(), mode);
        }
    }

    #[test]
    fn mode_rejects_an_undocumented_register_value() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REG_OPMODE as usize, &[0x07]);
        let mut sensor = Ens160::from_device(dev);
        match sensor.mode() {
            Err(Ens160Error::InvalidMode(raw)) => assert_eq!(raw, 0x07),
            other => panic!("expected InvalidMode, got {:?}", other),
        }
    }

    #[test]
    fn status_decoding_is_bit_exact() {
        let status = Status(0x82);
        assert!(status.running_normally());
        assert!(!status.error());
        assert_eq!(status.validity(), Validity::NormalOperation);
        assert!(status.new_data());
        assert!(!status.new_gpr_data());

        let status = Status(0x4D);
        assert!(!status.running_normally());
        assert!(status.error());
        assert_eq!(status.validity(), Validity::InvalidOutput);
        assert!(!status.new_data());
        assert!(status.new_gpr_data());

        assert_eq!(Status(0x04).validity(), Validity::WarmUp);
        assert_eq!(Status(0x08).validity(), Validity::InitialStartUp);
    }

    #[test]
    fn poll_converts_a_fresh_measurement() {
        let mut dev = mock_with_part_id();
        dev.regmap.write_regs(REG_DEVICE_STATUS as usize, &[0x82]);
        dev.regmap.write_regs(REG_DATA_TVOC as usize, &[0x7D, 0x00]);
        dev.regmap.write_regs(REG_DATA_ECO2 as usize, &[0xC2, 0x01]);
        dev.regmap.write_regs(REG_GPR_READ0 as usize, &[0x12, 0x34, 0x56, 0x00]);
        let mut sensor = Ens160::from_device(dev);

        let m = sensor.poll().unwrap();
        assert_eq!(m.eco2, 450);
        assert_eq!(m.tvoc, 125);
        assert_eq!(m.aqi, AirQualityIndex::Excellent);
        assert_eq!(m.raw_resistance, 0x0056_3412);
        assert_eq!(sensor.last_measurement(), m);
    }

    #[test]
    fn poll_keeps_the_cached_measurement_while_no_new_data() {
        let mut dev = mock_with_part_id();
        dev.regmap.write_regs(REG_DEVICE_STATUS as usize, &[0x82]);
        dev.regmap.write_regs(REG_DATA_ECO2 as usize, &[0xC2, 0x01]);
        let mut sensor = Ens160::from_device(dev);
        let first = sensor.poll().unwrap();

        // new-data flag low, underlying outputs change anyway
        sensor.i2cdev.regmap.write_regs(REG_DEVICE_STATUS as usize, &[0x80]);
        sensor.i2cdev.regmap.write_regs(REG_DATA_ECO2 as usize, &[0xFF, 0x03]);
        let second = sensor.poll().unwrap();
        let third = sensor.poll().unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn poll_discards_samples_outside_normal_operation() {
        let mut dev = mock_with_part_id();
        // new data flagged during warm up
        dev.regmap.write_regs(REG_DEVICE_STATUS as usize, &[0x86]);
        dev.regmap.write_regs(REG_DATA_ECO2 as usize, &[0xC2, 0x01]);
        let mut sensor = Ens160::from_device(dev);
        assert_eq!(sensor.poll().unwrap(), Measurement::default());
    }

    #[test]
    fn aqi_classification_is_deterministic() {
        use AirQualityIndex::*;
        assert_eq!(AirQualityIndex::from_eco2(450), Excellent);
        assert_eq!(AirQualityIndex::from_eco2(599), Excellent);
        assert_eq!(AirQualityIndex::from_eco2(600), Good);
        assert_eq!(AirQualityIndex::from_eco2(999), Good);
        assert_eq!(AirQualityIndex::from_eco2(1200), Moderate);
        assert_eq!(AirQualityIndex::from_eco2(1499), Moderate);
        assert_eq!(AirQualityIndex::from_eco2(1500), Poor);
        assert_eq!(AirQualityIndex::from_eco2(2499), Poor);
        assert_eq!(AirQualityIndex::from_eco2(2500), Unhealthy);
        assert_eq!(AirQualityIndex::from_eco2(u16::MAX), Unhealthy);
        assert_eq!(Excellent as u8, 1);
        assert_eq!(Moderate as u8, 3);
        assert_eq!(Unhealthy as u8, 5);
    }

    #[test]
    fn temperature_compensation_round_trips_within_quantization() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        sensor.set_temperature_compensation(25.0).unwrap();
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_TEMP_IN).unwrap(), 0x8A);
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_TEMP_IN + 1).unwrap(), 0x4A);
        let celsius = sensor.temperature_compensation().unwrap();
        assert!((celsius - 25.0).abs() < 0.02);
    }

    #[test]
    fn humidity_compensation_round_trips_within_quantization() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        sensor.set_humidity_compensation(50.0).unwrap();
        let percent = sensor.humidity_compensation().unwrap();
        assert!((percent - 50.0).abs() < 0.01);
    }

    #[test]
    fn out_of_range_humidity_is_rejected_before_any_write() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        match sensor.set_humidity_compensation(120.0) {
            Err(Ens160Error::ValueRange(_)) => {}
            other => panic!("expected ValueRange, got {:?}", other),
        }
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_RH_IN).unwrap(), 0x00);
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_RH_IN + 1).unwrap(), 0x00);
    }

    #[test]
    fn out_of_range_temperature_is_rejected_before_any_write() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        assert!(matches!(
            sensor.set_temperature_compensation(120.0),
            Err(Ens160Error::ValueRange(_))
        ));
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_TEMP_IN).unwrap(), 0x00);
    }

    #[test]
    fn interrupt_config_encoding_is_bit_exact() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        let config = InterruptConfig {
            enabled: true,
            on_new_data: true,
            on_new_gpr_data: false,
            polarity: InterruptPolarity::ActiveHigh,
            pin_drive: InterruptPinDrive::PushPull,
        };
        sensor.set_interrupt_config(config).unwrap();
        assert_eq!(sensor.i2cdev.smbus_read_byte_data(REG_CONFIG).unwrap(), 0x63);

        assert_eq!(InterruptConfig::default().to_bits(), 0x00);
        let gpr_only = InterruptConfig {
            enabled: true,
            on_new_gpr_data: true,
            ..InterruptConfig::default()
        };
        assert_eq!(gpr_only.to_bits(), 0x09);
    }

    #[test]
    fn firmware_version_is_read_from_the_gpr_registers() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REG_GPR_READ4 as usize, &[7, 1, 0]);
        let mut sensor = Ens160::from_device(dev);
        assert_eq!(sensor.firmware_version().unwrap(), (7, 1, 0));
        assert_eq!(
            sensor.i2cdev.smbus_read_byte_data(REG_COMMAND).unwrap(),
            CMD_GET_APPVER
        );
    }

    #[test]
    fn clear_gpr_flags_issues_the_clear_command() {
        let mut sensor = Ens160::from_device(MockI2CDevice::new());
        sensor.clear_gpr_flags().unwrap();
        assert_eq!(
            sensor.i2cdev.smbus_read_byte_data(REG_COMMAND).unwrap(),
            CMD_CLRGPR
        );
    }

    #[test]
    fn part_id_is_decoded_little_endian() {
        let mut sensor = Ens160::from_device(mock_with_part_id());
        assert_eq!(sensor.part_id().unwrap(), ENS160_PART_ID);
    }
}
