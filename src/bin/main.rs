//! One-shot TEE501 temperature readout.
//!
//! Performs a single measurement cycle on the fixed bus and prints a
//! two-column report to stdout. Any bus failure is reported on stderr with a
//! non-zero exit status. `RUST_LOG=debug` shows the transaction steps.

use anyhow::{Context, Result, anyhow};
use linux_embedded_hal::{Delay, I2cdev};
use log::debug;

use tee501::{DEFAULT_ADDRESS, Tee501, report};

// The sensor hangs off the primary user I2C bus (SDA on GPIO2, SCL on GPIO3
// for Raspberry Pi headers).
const I2C_BUS: &str = "/dev/i2c-1";

fn main() -> Result<()> {
    env_logger::init();

    let i2c = I2cdev::new(I2C_BUS)
        .with_context(|| format!("cannot open {I2C_BUS}, is the I2C interface enabled?"))?;
    debug!("opened {I2C_BUS}, sensor address 0x{DEFAULT_ADDRESS:02X}");

    let mut sensor = Tee501::new(i2c, Delay {}, DEFAULT_ADDRESS);
    let temperature = sensor
        .single_shot_temperature()
        .map_err(|e| anyhow!("measurement failed: {e}"))?;

    println!("{}", report::temperature_row(temperature));
    Ok(())
}
