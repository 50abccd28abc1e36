//! Low-level register and interface definitions for APDS-9900
//!
//! The register block is generated by `device-driver` and talks to the chip
//! through [`DeviceInterface`]. The semantic API in the crate root goes
//! through the generated accessors; the raw primitives at the bottom of this
//! module reach registers and command bytes the map does not describe
//! (interrupt clear special functions, reserved registers). They bypass
//! every range check: the caller is responsible for the bit layout.
//!
//! Each operation is exactly one bus transaction and records its outcome in
//! the driver's last-error slot (see [`Apds9900::last_error`]). Reads that
//! fail return `0`.

use device_driver::RegisterInterface;
use embedded_hal::i2c::I2c;

use crate::{Apds9900, Error};

/// Command register select bit
pub const COMMAND: u8 = 0x80;
/// Auto-increment protocol for multi-byte transfers
pub const AUTO_INCREMENT: u8 = 0x20;

// Allow missing docs for generated device code
#[allow(missing_docs)]
mod device_generated {
    device_driver::create_device!(
        device_name: Device,
        dsl: {
            config {
                type RegisterAddressType = u8;
                type DefaultByteOrder = LE;
                type DefmtFeature = "defmt-03";
            }

            /// ENABLE - function enables (0x00)
            register Enable {
                const ADDRESS = 0x00;
                const SIZE_BITS = 8;

                /// Power on
                pon: bool = 0,
                /// ALS enable
                aen: bool = 1,
                /// Proximity enable
                pen: bool = 2,
                /// Wait enable
                wen: bool = 3,
                /// ALS interrupt enable
                aien: bool = 4,
                /// Proximity interrupt enable
                pien: bool = 5,
            },

            /// ATIME - ALS integration time (0x01), 256 - cycles
            register Atime {
                const ADDRESS = 0x01;
                const SIZE_BITS = 8;

                atime: uint = 0..8,
            },

            /// PTIME - proximity integration time (0x02), 256 - cycles
            register Ptime {
                const ADDRESS = 0x02;
                const SIZE_BITS = 8;

                ptime: uint = 0..8,
            },

            /// WTIME - wait time (0x03), 256 - cycles
            register Wtime {
                const ADDRESS = 0x03;
                const SIZE_BITS = 8;

                wtime: uint = 0..8,
            },

            /// AILTL/AILTH - ALS low threshold (0x04)
            register Ailt {
                const ADDRESS = 0x04;
                const SIZE_BITS = 16;

                ailt: uint = 0..16,
            },

            /// AIHTL/AIHTH - ALS high threshold (0x06)
            register Aiht {
                const ADDRESS = 0x06;
                const SIZE_BITS = 16;

                aiht: uint = 0..16,
            },

            /// PILTL/PILTH - proximity low threshold (0x08)
            register Pilt {
                const ADDRESS = 0x08;
                const SIZE_BITS = 16;

                pilt: uint = 0..16,
            },

            /// PIHTL/PIHTH - proximity high threshold (0x0A)
            register Piht {
                const ADDRESS = 0x0A;
                const SIZE_BITS = 16;

                piht: uint = 0..16,
            },

            /// PERS - interrupt persistence filters (0x0C)
            register Pers {
                const ADDRESS = 0x0C;
                const SIZE_BITS = 8;

                /// ALS interrupt persistence
                apers: uint = 0..4,
                /// Proximity interrupt persistence
                ppers: uint = 4..8,
            },

            /// CONFIG - configuration (0x0D)
            register Configuration {
                const ADDRESS = 0x0D;
                const SIZE_BITS = 8;

                /// Wait time counts in 32 ms steps
                wlong: bool = 1,
            },

            /// PPCOUNT - proximity pulse count (0x0E)
            register Ppcount {
                const ADDRESS = 0x0E;
                const SIZE_BITS = 8;

                ppcount: uint = 0..8,
            },

            /// CONTROL - gain and LED drive (0x0F)
            register Control {
                const ADDRESS = 0x0F;
                const SIZE_BITS = 8;

                /// ALS gain
                again: uint = 0..2,
                /// LED drive strength, also written by the diode select
                pdrive: uint = 6..8,
            },

            /// REV - revision (0x11)
            register Rev {
                type Access = RO;
                const ADDRESS = 0x11;
                const SIZE_BITS = 8;

                rev: uint = 0..8,
            },

            /// ID - device ID (0x12)
            register Id {
                type Access = RO;
                const ADDRESS = 0x12;
                const SIZE_BITS = 8;

                id: uint = 0..8,
            },

            /// STATUS - device status (0x13)
            register Status {
                type Access = RO;
                const ADDRESS = 0x13;
                const SIZE_BITS = 8;

                status: uint = 0..8,
            },

            /// CDATAL/CDATAH - clear channel data (0x14)
            register Cdata {
                type Access = RO;
                const ADDRESS = 0x14;
                const SIZE_BITS = 16;

                cdata: uint = 0..16,
            },

            /// IRDATAL/IRDATAH - IR channel data (0x16)
            register Irdata {
                type Access = RO;
                const ADDRESS = 0x16;
                const SIZE_BITS = 16;

                irdata: uint = 0..16,
            },

            /// PDATAL/PDATAH - proximity data (0x18)
            register Pdata {
                type Access = RO;
                const ADDRESS = 0x18;
                const SIZE_BITS = 16;

                pdata: uint = 0..16,
            },
        }
    );
}
pub use device_generated::*;

/// Device interface implementation
#[derive(Debug)]
pub struct DeviceInterface<I2c> {
    /// The I2C interface
    pub i2c: I2c,
    /// 7-bit bus address of the device
    pub address: u8,
}

impl<I2cTrait: I2c> RegisterInterface for DeviceInterface<I2cTrait> {
    type AddressType = u8;
    type Error = Error<I2cTrait::Error>;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.address, &[address], data)
            .map_err(|e| failed(address, e))
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Max register size is 16 bits (2 bytes) + 1 address byte = 3 bytes
        let mut buf = [0u8; 3];
        buf[0] = address;
        let len = data.len();
        buf[1..1 + len].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf[..1 + len])
            .map_err(|e| failed(address, e))
    }
}

#[cfg_attr(not(feature = "defmt-03"), allow(unused_variables))]
fn failed<E>(address: u8, e: E) -> Error<E> {
    #[cfg(feature = "defmt-03")]
    defmt::debug!("apds9900: transfer on register {=u8:#04x} failed", address);
    Error::I2c(e)
}

impl<I2C, E> Apds9900<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Generated register block over a borrow of the bus
    pub(crate) fn device(&mut self) -> Device<DeviceInterface<&mut I2C>> {
        Device::new(self.interface())
    }

    fn interface(&mut self) -> DeviceInterface<&mut I2C> {
        DeviceInterface {
            i2c: &mut self.i2c,
            address: self.address,
        }
    }

    /// Store the outcome of a transaction in the last-error slot.
    ///
    /// Success clears the slot: it always reflects the most recent transfer,
    /// except while [`configure`](Self::configure) holds on to a failure.
    pub(crate) fn record<T>(&mut self, result: Result<T, Error<E>>) -> Option<T> {
        match result {
            Ok(value) => {
                if !self.hold_errors {
                    self.last_error = None;
                }
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                None
            }
        }
    }
}

/// Raw register access
impl<I2C, E> Apds9900<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Address a register without payload. Typically only used for the
    /// command byte.
    ///
    /// Returns `true` when the device acknowledged the transfer.
    pub fn write_command(&mut self, reg: u8) -> bool {
        let result = self.interface().write_register(reg, 0, &[]);
        self.record(result).is_some()
    }

    /// Write one byte to `reg`.
    pub fn write_register(&mut self, reg: u8, value: u8) -> bool {
        let result = self.interface().write_register(reg, 8, &[value]);
        self.record(result).is_some()
    }

    /// Write a 16-bit value to `reg` and `reg + 1`, low byte first.
    pub fn write_register16(&mut self, reg: u8, value: u16) -> bool {
        let result = self
            .interface()
            .write_register(reg, 16, &value.to_le_bytes());
        self.record(result).is_some()
    }

    /// Read one byte from `reg`, or `0` if the transfer failed.
    pub fn read_register(&mut self, reg: u8) -> u8 {
        let mut buffer = [0u8; 1];
        let result = self.interface().read_register(reg, 8, &mut buffer);
        self.record(result).map_or(0, |()| buffer[0])
    }

    /// Read a little-endian 16-bit value starting at `reg`, or `0` if the
    /// transfer failed.
    pub fn read_register16(&mut self, reg: u8) -> u16 {
        let mut buffer = [0u8; 2];
        let result = self.interface().read_register(reg, 16, &mut buffer);
        self.record(result).map_or(0, |()| u16::from_le_bytes(buffer))
    }
}
