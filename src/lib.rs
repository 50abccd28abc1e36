//! # APDS-9900 Digital Proximity and Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the APDS-9900 (and the
//! register-compatible APDS-9901) ambient light and proximity sensor, built
//! using the [`embedded-hal`] traits for I2C communication.
//!
//! The APDS-9900 provides:
//! - A clear (visible + IR) and an IR-only ambient light channel
//! - An IR LED driven proximity channel
//! - Programmable integration, proximity and wait times
//! - Interrupt thresholds with persistence filters
//! - I2C interface (address 0x39)
//!
//! ## Error reporting
//!
//! The driver never panics and never retries. Every bus transaction stores
//! its outcome in a single last-error slot that [`Apds9900::last_error`]
//! reads and clears. Getters return `0` when their transfer failed, so a
//! reading of `0` is only trustworthy when `last_error()` returns `None`
//! right after it.
//!
//! Setters with a restricted range return `false` when the argument is out
//! of range. In that case nothing is sent and the last-error slot is left
//! alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apds9900::{AlsGain, Apds9900};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Apds9900::new(i2c);
//!
//! if !sensor.begin() {
//!     // nothing answered on 0x39
//! }
//!
//! sensor.set_integration_time(100);
//! sensor.set_als_gain_control(AlsGain::Gain8x as u8);
//! sensor.enable_als(true);
//! sensor.wake_up();
//!
//! let clear = sensor.als_cdata();
//! if let Some(error) = sensor.last_error() {
//!     // `clear` is a fallback value, not a measurement
//! #   let _ = (clear, error);
//! }
//! # }
//! ```
//!
//! ## Sharing the bus
//!
//! The driver takes any [`embedded_hal::i2c::I2c`] by value. Pass `&mut bus`
//! to keep using the bus elsewhere once the driver is dropped, or call
//! [`Apds9900::destroy`] to get an owned bus back. A driver instance is not
//! meant to be used from several contexts at once; wrap it in a mutex if it
//! has to be.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

use embedded_hal::i2c::{ErrorType, I2c};

pub mod ll;
pub mod timing;

pub use timing::TimeBase;

/// I2C address of the APDS-9900 sensor
pub const I2C_ADDRESS: u8 = 0x39;

/// Proximity time used when the caller has no specific requirement
pub const DEFAULT_PROXIMITY_TIME_MS: u16 = 3;

/// LED drive strength (`PDRIVE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum LedDrive {
    /// 100 mA
    Ma100 = 0b00,
    /// 50 mA
    Ma50 = 0b01,
    /// 25 mA
    Ma25 = 0b10,
    /// 12.5 mA
    Ma12_5 = 0b11,
}

/// Proximity diode selection (`PDIODE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ProximityDiode {
    /// Channel 0 diode
    Ch0 = 0,
    /// Channel 1 diode
    Ch1 = 1,
}

/// ALS gain (`AGAIN`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AlsGain {
    /// 1x gain
    Gain1x = 0b00,
    /// 8x gain
    Gain8x = 0b01,
    /// 16x gain
    Gain16x = 0b10,
    /// 120x gain
    Gain120x = 0b11,
}

/// Parts served by this driver, identified by the `ID` register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Part {
    /// APDS-9900, ID `0x29`
    Apds9900,
    /// APDS-9901, ID `0x20`
    Apds9901,
}

impl Part {
    /// Map an `ID` register value to a part.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x29 => Some(Part::Apds9900),
            0x20 => Some(Part::Apds9901),
            _ => None,
        }
    }
}

// STATUS bits
const STATUS_AVALID: u8 = 0x01;
const STATUS_PVALID: u8 = 0x02;
const STATUS_AINT: u8 = 0x10;
const STATUS_PINT: u8 = 0x20;

/// Device status information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct StatusInfo {
    /// ALS channels completed an integration cycle
    pub als_valid: bool,
    /// Proximity channel completed an integration cycle
    pub prox_valid: bool,
    /// ALS interrupt asserted
    pub als_interrupt: bool,
    /// Proximity interrupt asserted
    pub prox_interrupt: bool,
}

impl From<u8> for StatusInfo {
    fn from(status: u8) -> Self {
        Self {
            als_valid: status & STATUS_AVALID != 0,
            prox_valid: status & STATUS_PVALID != 0,
            als_interrupt: status & STATUS_AINT != 0,
            prox_interrupt: status & STATUS_PINT != 0,
        }
    }
}

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
}

impl<E: embedded_hal::i2c::Error> Error<E> {
    /// Bus-independent classification of the failure
    pub fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Error::I2c(e) => e.kind(),
        }
    }
}

/// Complete measurement setup, applied with [`Apds9900::configure`]
///
/// There is no proximity diode field: the diode select and the LED drive
/// strength share bits 7:6 of `CONTROL`, so applying both would always lose
/// one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// ALS integration time in ms
    pub integration_time_ms: u16,
    /// Proximity integration time in ms
    pub proximity_time_ms: u16,
    /// Wait time between cycles in ms; above 696 ms selects the long wait base
    pub wait_time_ms: u16,
    /// Number of proximity LED pulses
    pub proximity_pulse_count: u8,
    /// LED drive strength
    pub led_drive: LedDrive,
    /// ALS gain
    pub als_gain: AlsGain,
    /// ALS interrupt persistence, 0..=15
    pub als_persistence: u8,
    /// Proximity interrupt persistence, 0..=15
    pub prox_persistence: u8,
    /// Enable the ALS function
    pub enable_als: bool,
    /// Enable the proximity function
    pub enable_proximity: bool,
    /// Enable the wait timer
    pub enable_wait: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            integration_time_ms: 100,
            proximity_time_ms: DEFAULT_PROXIMITY_TIME_MS,
            wait_time_ms: 3,
            proximity_pulse_count: 8,
            led_drive: LedDrive::Ma100,
            als_gain: AlsGain::Gain1x,
            als_persistence: 0,
            prox_persistence: 0,
            enable_als: true,
            enable_proximity: true,
            enable_wait: false,
        }
    }
}

/// High-level APDS-9900 driver
///
/// The driver keeps no copy of the device registers: every getter reads the
/// device and every setter that touches a shared register reads it first.
pub struct Apds9900<I2C: ErrorType> {
    i2c: I2C,
    address: u8,
    last_error: Option<Error<I2C::Error>>,
    hold_errors: bool,
}

#[derive(Clone, Copy)]
enum EnableBit {
    Pon,
    Aen,
    Pen,
    Wen,
}

#[derive(Clone, Copy)]
enum Persistence {
    Als,
    Prox,
}

#[derive(Clone, Copy)]
enum ControlField {
    Pdrive,
    Again,
}

impl<I2C, E> Apds9900<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Create a new APDS-9900 driver instance on the default address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2C_ADDRESS)
    }

    /// Create a new driver instance on a non-default 7-bit address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            last_error: None,
            hold_errors: false,
        }
    }

    /// 7-bit bus address of the device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Take the outcome of the most recent bus transaction.
    ///
    /// Returns `None` if it succeeded and resets the slot to `None`, so a
    /// second call only reports errors from transactions issued in between.
    pub fn last_error(&mut self) -> Option<Error<E>> {
        self.last_error.take()
    }

    /// Check the device answers with an empty write.
    ///
    /// The check does not touch the last-error slot.
    pub fn is_connected(&mut self) -> bool {
        self.i2c.write(self.address, &[]).is_ok()
    }

    /// Check the device is present and select the command register with the
    /// auto-increment protocol, which the 16-bit reads depend on.
    pub fn begin(&mut self) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.write_command(ll::COMMAND | ll::AUTO_INCREMENT);
        true
    }

    /// Apply a full measurement setup.
    ///
    /// Timing, pulse count, control and persistence settings are written
    /// first, then the function enables, and the device is powered on last.
    /// Stops at the first rejected setting or failed transaction and returns
    /// `false`. A failure anywhere in the sequence is kept in
    /// [`last_error`](Self::last_error), even when a later transaction of the
    /// same setter succeeds. An error left unread before the call is dropped.
    pub fn configure(&mut self, config: &Config) -> bool {
        self.last_error = None;
        self.hold_errors = true;
        let applied = self.apply(config).is_some();
        self.hold_errors = false;
        applied
    }

    fn apply(&mut self, config: &Config) -> Option<()> {
        self.set_integration_time(config.integration_time_ms);
        self.settled(true)?;
        self.set_proximity_time(config.proximity_time_ms);
        self.settled(true)?;
        self.set_wait_time(config.wait_time_ms);
        self.settled(true)?;
        self.set_proximity_pulse_count(config.proximity_pulse_count);
        self.settled(true)?;

        let accepted = self.set_led_drive_strength(config.led_drive as u8);
        self.settled(accepted)?;
        let accepted = self.set_als_gain_control(config.als_gain as u8);
        self.settled(accepted)?;
        let accepted = self.set_als_interrupt_persistence(config.als_persistence);
        self.settled(accepted)?;
        let accepted = self.set_prox_interrupt_persistence(config.prox_persistence);
        self.settled(accepted)?;

        self.enable_als(config.enable_als);
        self.settled(true)?;
        self.enable_proximity(config.enable_proximity);
        self.settled(true)?;
        self.enable_wait(config.enable_wait);
        self.settled(true)?;
        self.wake_up();
        self.settled(true)
    }

    fn settled(&self, accepted: bool) -> Option<()> {
        (accepted && self.last_error.is_none()).then_some(())
    }

    // Power

    /// Set the `PON` bit. Issues no write if it is already set.
    pub fn wake_up(&mut self) {
        let result = self.device().enable().read();
        let current = self.record(result);
        if current.as_ref().is_some_and(|enable| enable.pon()) {
            return;
        }
        let result = self.device().enable().write(|w| {
            if let Some(enable) = current {
                *w = enable;
            }
            w.set_pon(true);
        });
        self.record(result);
    }

    /// Clear the `PON` bit. Always writes.
    pub fn sleep(&mut self) {
        self.update_enable(EnableBit::Pon, false);
    }

    /// Enable or disable the ambient light function (`AEN`)
    pub fn enable_als(&mut self, enable: bool) {
        self.update_enable(EnableBit::Aen, enable);
    }

    /// Enable or disable the proximity function (`PEN`)
    pub fn enable_proximity(&mut self, enable: bool) {
        self.update_enable(EnableBit::Pen, enable);
    }

    /// Enable or disable the wait timer (`WEN`)
    pub fn enable_wait(&mut self, enable: bool) {
        self.update_enable(EnableBit::Wen, enable);
    }

    // A failed read leaves the zero reset value as the base of the write.
    fn update_enable(&mut self, bit: EnableBit, on: bool) {
        let result = self.device().enable().read();
        let current = self.record(result);
        let result = self.device().enable().write(|w| {
            if let Some(enable) = current {
                *w = enable;
            }
            match bit {
                EnableBit::Pon => w.set_pon(on),
                EnableBit::Aen => w.set_aen(on),
                EnableBit::Pen => w.set_pen(on),
                EnableBit::Wen => w.set_wen(on),
            }
        });
        self.record(result);
    }

    // Timing

    /// Set the ALS integration time, in steps of 2.72 ms from 3 to 696 ms.
    pub fn set_integration_time(&mut self, ms: u16) {
        let value = TimeBase::Short.encode(ms);
        let result = self.device().atime().write(|w| w.set_atime(value));
        self.record(result);
    }

    /// ALS integration time in ms. May differ slightly from the value set
    /// because of rounding.
    pub fn integration_time(&mut self) -> u16 {
        let result = self.device().atime().read();
        let value = self.record(result).map_or(0, |r| r.atime());
        TimeBase::Short.decode(value)
    }

    /// Set the proximity integration time, in steps of 2.72 ms from 3 to
    /// 696 ms. The datasheet recommends [`DEFAULT_PROXIMITY_TIME_MS`].
    pub fn set_proximity_time(&mut self, ms: u16) {
        let value = TimeBase::Short.encode(ms);
        let result = self.device().ptime().write(|w| w.set_ptime(value));
        self.record(result);
    }

    /// Proximity integration time in ms, subject to rounding.
    pub fn proximity_time(&mut self) -> u16 {
        let result = self.device().ptime().read();
        let value = self.record(result).map_or(0, |r| r.ptime());
        TimeBase::Short.decode(value)
    }

    /// Set the wait time.
    ///
    /// Up to 696 ms the wait timer counts in 2.72 ms steps. Longer waits set
    /// `WLONG` and count in 32 ms steps, up to 8160 ms. `CONFIG` is always
    /// written before `WTIME`.
    pub fn set_wait_time(&mut self, ms: u16) {
        let base = TimeBase::for_wait(ms);
        let result = self
            .device()
            .configuration()
            .write(|w| w.set_wlong(base == TimeBase::Long));
        self.record(result);
        let value = base.encode(ms);
        let result = self.device().wtime().write(|w| w.set_wtime(value));
        self.record(result);
    }

    /// Wait time in ms, subject to rounding.
    pub fn wait_time(&mut self) -> u16 {
        let result = self.device().configuration().read();
        let base = if self.record(result).is_some_and(|r| r.wlong()) {
            TimeBase::Long
        } else {
            TimeBase::Short
        };
        let result = self.device().wtime().read();
        let value = self.record(result).map_or(0, |r| r.wtime());
        base.decode(value)
    }

    // Interrupts

    /// Set the ALS interrupt thresholds. `low` must be smaller than `high`.
    pub fn set_als_thresholds(&mut self, low: u16, high: u16) -> bool {
        if low >= high {
            return false;
        }
        let result = self.device().ailt().write(|w| w.set_ailt(low));
        self.record(result);
        let result = self.device().aiht().write(|w| w.set_aiht(high));
        self.record(result);
        true
    }

    /// Set the proximity interrupt thresholds. `low` must be smaller than
    /// `high`.
    pub fn set_prox_thresholds(&mut self, low: u16, high: u16) -> bool {
        if low >= high {
            return false;
        }
        let result = self.device().pilt().write(|w| w.set_pilt(low));
        self.record(result);
        let result = self.device().piht().write(|w| w.set_piht(high));
        self.record(result);
        true
    }

    /// Number of consecutive out-of-range ALS readings before an interrupt,
    /// 0..=15. See the datasheet for the mapping.
    pub fn set_als_interrupt_persistence(&mut self, value: u8) -> bool {
        self.set_persistence(Persistence::Als, value)
    }

    /// Number of consecutive out-of-range proximity readings before an
    /// interrupt, 0..=15.
    pub fn set_prox_interrupt_persistence(&mut self, value: u8) -> bool {
        self.set_persistence(Persistence::Prox, value)
    }

    fn set_persistence(&mut self, field: Persistence, value: u8) -> bool {
        if value > 0x0F {
            return false;
        }
        let result = self.device().pers().read();
        let current = self.record(result);
        let stored = current.as_ref().map_or(0, |pers| match field {
            Persistence::Als => pers.apers(),
            Persistence::Prox => pers.ppers(),
        });
        if stored == value {
            return true;
        }
        let result = self.device().pers().write(|w| {
            if let Some(pers) = current {
                *w = pers;
            }
            match field {
                Persistence::Als => w.set_apers(value),
                Persistence::Prox => w.set_ppers(value),
            }
        });
        self.record(result);
        true
    }

    /// Number of LED pulses per proximity cycle
    pub fn set_proximity_pulse_count(&mut self, value: u8) {
        let result = self.device().ppcount().write(|w| w.set_ppcount(value));
        self.record(result);
    }

    // Control

    /// LED drive strength, 0..=3 (see [`LedDrive`]).
    ///
    /// Shares bits 7:6 of `CONTROL` with
    /// [`set_proximity_diode_select`](Self::set_proximity_diode_select): the
    /// last of the two calls decides the field.
    pub fn set_led_drive_strength(&mut self, value: u8) -> bool {
        if value > LedDrive::Ma12_5 as u8 {
            return false;
        }
        self.update_control(ControlField::Pdrive, value);
        true
    }

    /// Proximity diode channel, 0 or 1 (see [`ProximityDiode`]).
    ///
    /// Writes the same bits as
    /// [`set_led_drive_strength`](Self::set_led_drive_strength) and
    /// overwrites its setting.
    pub fn set_proximity_diode_select(&mut self, channel: u8) -> bool {
        if channel > ProximityDiode::Ch1 as u8 {
            return false;
        }
        self.update_control(ControlField::Pdrive, channel);
        true
    }

    /// ALS gain, 0..=3 (see [`AlsGain`]).
    pub fn set_als_gain_control(&mut self, value: u8) -> bool {
        if value > AlsGain::Gain120x as u8 {
            return false;
        }
        self.update_control(ControlField::Again, value);
        true
    }

    fn update_control(&mut self, field: ControlField, value: u8) {
        let result = self.device().control().read();
        let current = self.record(result);
        let result = self.device().control().write(|w| {
            if let Some(control) = current {
                *w = control;
            }
            match field {
                ControlField::Pdrive => w.set_pdrive(value),
                ControlField::Again => w.set_again(value),
            }
        });
        self.record(result);
    }

    // Identification and status

    /// Revision register
    pub fn revision(&mut self) -> u8 {
        let result = self.device().rev().read();
        self.record(result).map_or(0, |r| r.rev())
    }

    /// Device ID register
    pub fn device_id(&mut self) -> u8 {
        let result = self.device().id().read();
        self.record(result).map_or(0, |r| r.id())
    }

    /// Identify the part from its ID register, `None` for unknown IDs and
    /// failed reads.
    pub fn part(&mut self) -> Option<Part> {
        let id = self.device_id();
        Part::from_id(id)
    }

    /// Raw status register
    pub fn status(&mut self) -> u8 {
        let result = self.device().status().read();
        self.record(result).map_or(0, |r| r.status())
    }

    /// Decoded status register
    pub fn status_info(&mut self) -> StatusInfo {
        StatusInfo::from(self.status())
    }

    // Measurements

    /// Clear channel ADC count
    pub fn als_cdata(&mut self) -> u16 {
        let result = self.device().cdata().read();
        self.record(result).map_or(0, |r| r.cdata())
    }

    /// IR channel ADC count
    pub fn als_irdata(&mut self) -> u16 {
        let result = self.device().irdata().read();
        self.record(result).map_or(0, |r| r.irdata())
    }

    /// Proximity ADC count
    pub fn prox_data(&mut self) -> u16 {
        let result = self.device().pdata().read();
        self.record(result).map_or(0, |r| r.pdata())
    }
}
