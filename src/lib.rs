//! Driver for the E+E TEE501 digital temperature sensor.
//!
//! The sensor sits on an I2C bus (7-bit base address 0x48, shiftable with the
//! A1-A3 pins) and is driven through 16-bit command words. Responses carry a
//! trailing CRC-8 which is verified before any value is decoded.
//!
//! The driver is generic over [`embedded_hal::i2c::I2c`] and
//! [`embedded_hal::delay::DelayNs`], so it runs against the Linux i2c-dev
//! interface, any MCU HAL, or a transaction mock in tests.
//!
//! ```no_run
//! use linux_embedded_hal::{Delay, I2cdev};
//! use tee501::{DEFAULT_ADDRESS, Tee501};
//!
//! let i2c = I2cdev::new("/dev/i2c-1")?;
//! let mut sensor = Tee501::new(i2c, Delay {}, DEFAULT_ADDRESS);
//! let temperature = sensor.single_shot_temperature()?;
//! println!("{:.2} °C", temperature.celsius());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod crc;
mod error;
mod model;
pub mod report;
mod sensor;

pub use error::Error;
pub use model::Temperature;
pub use sensor::{DEFAULT_ADDRESS, SINGLE_SHOT_DELAY_MS, Tee501};
