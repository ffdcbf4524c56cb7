//! TEE501 driver.
//!
//! Every operation is a blocking bus transaction against the sensor's 7-bit
//! address. Measurement responses are three bytes (two data bytes plus a
//! CRC-8) and are verified before decoding.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

use crate::command::{Command, REG_MEASUREMENT_RESOLUTION, REG_PERIODIC_MEASUREMENT_TIME};
use crate::crc::crc8;
use crate::error::Error;
use crate::model::Temperature;

/// Base 7-bit address with A1-A3 left unconnected.
pub const DEFAULT_ADDRESS: u8 = 0x48;

/// Settling delay between triggering a single-shot conversion and reading
/// the result. Covers the worst-case conversion time at 14-bit resolution.
pub const SINGLE_SHOT_DELAY_MS: u32 = 50;

/// Granularity of the periodic measurement interval register.
const PERIODIC_INTERVAL_STEP_MS: u32 = 50;

/// Largest interval the 16-bit register can hold (65535 * 50 ms).
const MAX_PERIODIC_INTERVAL_MS: u32 = 3_276_750;

pub struct Tee501<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> Tee501<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Trigger a single-shot conversion and read the result.
    ///
    /// Issues the no-clock-stretching command as its own write transaction,
    /// blocks for [`SINGLE_SHOT_DELAY_MS`] while the sensor converts, then
    /// reads the three-byte response in a second transaction.
    pub fn single_shot_temperature(&mut self) -> Result<Temperature, Error<I2C::Error>> {
        self.command(Command::ReadSingleShotNoClockStretch)?;
        self.delay.delay_ms(SINGLE_SHOT_DELAY_MS);

        let mut response = [0u8; 3];
        self.i2c.read(self.address, &mut response)?;
        let temperature = checked_temperature(&response)?;
        debug!("single shot: {:.2} °C", temperature.celsius());
        Ok(temperature)
    }

    /// Single-shot conversion with clock stretching.
    ///
    /// One combined write/read transaction; the sensor holds SCL until the
    /// conversion finishes, so no settling delay is needed. Not every bus
    /// master tolerates the stretch.
    pub fn single_shot_temperature_clock_stretching(
        &mut self,
    ) -> Result<Temperature, Error<I2C::Error>> {
        let mut response = [0u8; 3];
        self.i2c.write_read(
            self.address,
            &Command::ReadSingleShot.to_be_bytes(),
            &mut response,
        )?;
        checked_temperature(&response)
    }

    /// Latest buffered value while periodic measurement is running.
    pub fn periodic_temperature(&mut self) -> Result<Temperature, Error<I2C::Error>> {
        let mut response = [0u8; 3];
        self.i2c.write_read(
            self.address,
            &Command::ReadPeriodicMeasurement.to_be_bytes(),
            &mut response,
        )?;
        checked_temperature(&response)
    }

    pub fn start_periodic_measurement(&mut self) -> Result<(), Error<I2C::Error>> {
        self.command(Command::StartPeriodicMeasurement)
    }

    pub fn end_periodic_measurement(&mut self) -> Result<(), Error<I2C::Error>> {
        self.command(Command::EndPeriodicMeasurement)
    }

    /// Set the time between conversions in periodic mode.
    ///
    /// Rounded down to the register's 50 ms granularity. Intervals beyond
    /// [`MAX_PERIODIC_INTERVAL_MS`] do not fit the register and are rejected
    /// before any bus traffic.
    pub fn set_periodic_interval_ms(&mut self, interval_ms: u32) -> Result<(), Error<I2C::Error>> {
        if interval_ms > MAX_PERIODIC_INTERVAL_MS {
            return Err(Error::InvalidPeriodicInterval);
        }

        let steps = (interval_ms / PERIODIC_INTERVAL_STEP_MS) as u16;
        let [lo, hi] = steps.to_le_bytes();
        let crc = crc8(&[REG_PERIODIC_MEASUREMENT_TIME, lo, hi]);
        let cmd = Command::ReadWriteSensorSettings.to_be_bytes();
        let frame = [cmd[0], cmd[1], REG_PERIODIC_MEASUREMENT_TIME, lo, hi, crc];
        self.i2c.write(self.address, &frame)?;
        Ok(())
    }

    /// Time between conversions in periodic mode, in milliseconds.
    pub fn periodic_interval_ms(&mut self) -> Result<u32, Error<I2C::Error>> {
        let mut response = [0u8; 2];
        self.read_setting(REG_PERIODIC_MEASUREMENT_TIME, &mut response)?;
        Ok(u16::from_le_bytes(response) as u32 * PERIODIC_INTERVAL_STEP_MS)
    }

    /// Set the conversion resolution, 8..=14 bits.
    pub fn set_measurement_resolution(&mut self, bits: u8) -> Result<(), Error<I2C::Error>> {
        if !(8..=14).contains(&bits) {
            return Err(Error::InvalidResolution);
        }

        let value = bits - 8;
        let crc = crc8(&[REG_MEASUREMENT_RESOLUTION, value]);
        let cmd = Command::ReadWriteSensorSettings.to_be_bytes();
        let frame = [cmd[0], cmd[1], REG_MEASUREMENT_RESOLUTION, value, crc];
        self.i2c.write(self.address, &frame)?;
        Ok(())
    }

    /// Current conversion resolution in bits.
    pub fn measurement_resolution(&mut self) -> Result<u8, Error<I2C::Error>> {
        let mut response = [0u8; 1];
        self.read_setting(REG_MEASUREMENT_RESOLUTION, &mut response)?;
        Ok((response[0] & 0x07) + 8)
    }

    /// Whether a new periodic measurement is waiting to be read.
    pub fn measurement_ready(&mut self) -> Result<bool, Error<I2C::Error>> {
        let mut response = [0u8; 3];
        self.i2c.write_read(
            self.address,
            &Command::ReadRegister2.to_be_bytes(),
            &mut response,
        )?;
        verify_checksum(&response)?;
        Ok(response[0] & 0x80 != 0)
    }

    /// The sensor's 8-byte identification number.
    pub fn identification(&mut self) -> Result<[u8; 8], Error<I2C::Error>> {
        let mut response = [0u8; 9];
        self.i2c.write_read(
            self.address,
            &Command::ReadIdentification.to_be_bytes(),
            &mut response,
        )?;
        verify_checksum(&response)?;

        let mut id = [0u8; 8];
        id.copy_from_slice(&response[..8]);
        Ok(id)
    }

    pub fn soft_reset(&mut self) -> Result<(), Error<I2C::Error>> {
        debug!("soft reset");
        self.command(Command::SoftReset)
    }

    pub fn clear_status_register(&mut self) -> Result<(), Error<I2C::Error>> {
        self.command(Command::ClearRegister1)
    }

    /// Hand the bus and delay back, consuming the driver.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, command: Command) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address, &command.to_be_bytes())?;
        Ok(())
    }

    fn read_setting(&mut self, register: u8, response: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        let cmd = Command::ReadWriteSensorSettings.to_be_bytes();
        let request = [cmd[0], cmd[1], register];
        self.i2c.write_read(self.address, &request, response)?;
        Ok(())
    }
}

/// Check the trailing CRC byte against the data bytes before it.
fn verify_checksum<E>(response: &[u8]) -> Result<(), Error<E>> {
    let (data, crc) = response.split_at(response.len() - 1);
    let expected = crc8(data);
    if crc[0] != expected {
        return Err(Error::Checksum {
            expected,
            received: crc[0],
        });
    }
    Ok(())
}

fn checked_temperature<E>(response: &[u8; 3]) -> Result<Temperature, Error<E>> {
    verify_checksum(response)?;
    Ok(Temperature::from_raw(response[0], response[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    fn sensor(transactions: &[I2cTransaction]) -> Tee501<I2cMock, NoopDelay> {
        Tee501::new(I2cMock::new(transactions), NoopDelay::new(), DEFAULT_ADDRESS)
    }

    #[test]
    fn single_shot_reads_temperature() {
        let mut dev = sensor(&[
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xE0, 0x16]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x10, 0x68, 0xED]),
        ]);

        let temperature = dev.single_shot_temperature().unwrap();
        assert!((temperature.celsius() - 42.0).abs() < 1e-6);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn nack_on_trigger_performs_no_read() {
        // The mock would fail `done()` if a read were attempted after the
        // rejected write.
        let mut dev = sensor(&[I2cTransaction::write(DEFAULT_ADDRESS, vec![0xE0, 0x16])
            .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))]);

        let result = dev.single_shot_temperature();
        assert!(matches!(result, Err(Error::I2c(_))));

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn corrupted_response_is_rejected() {
        let mut dev = sensor(&[
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xE0, 0x16]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x10, 0x68, 0x00]),
        ]);

        let result = dev.single_shot_temperature();
        assert_eq!(
            result,
            Err(Error::Checksum {
                expected: 0xED,
                received: 0x00
            })
        );

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn bus_is_released_after_failed_read() {
        let mut dev = sensor(&[
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0xE0, 0x16]),
            I2cTransaction::read(DEFAULT_ADDRESS, vec![0x00, 0x00, 0x00])
                .with_error(ErrorKind::Other),
        ]);

        assert!(dev.single_shot_temperature().is_err());

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn clock_stretching_uses_combined_transaction() {
        let mut dev = sensor(&[I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x2C, 0x1B],
            vec![0xF8, 0x30, 0x6B],
        )]);

        let temperature = dev.single_shot_temperature_clock_stretching().unwrap();
        assert!((temperature.celsius() + 20.0).abs() < 1e-6);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn periodic_temperature_reads_buffered_value() {
        let mut dev = sensor(&[I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0xE0, 0x00],
            vec![0x10, 0x68, 0xED],
        )]);

        let temperature = dev.periodic_temperature().unwrap();
        assert!((temperature.celsius() - 42.0).abs() < 1e-6);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn periodic_interval_round_trip_frames() {
        let mut dev = sensor(&[
            // 5000 ms -> 100 steps, little-endian, CRC over register + payload
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x72, 0xA7, 0x10, 0x64, 0x00, 0x39]),
            I2cTransaction::write_read(
                DEFAULT_ADDRESS,
                vec![0x72, 0xA7, 0x10],
                vec![0x64, 0x00],
            ),
        ]);

        dev.set_periodic_interval_ms(5000).unwrap();
        assert_eq!(dev.periodic_interval_ms().unwrap(), 5000);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn oversized_interval_is_rejected_without_bus_traffic() {
        let mut dev = sensor(&[]);

        assert_eq!(
            dev.set_periodic_interval_ms(3_276_800),
            Err(Error::InvalidPeriodicInterval)
        );

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn resolution_round_trip_frames() {
        let mut dev = sensor(&[
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x72, 0xA7, 0x0F, 0x06, 0xBE]),
            I2cTransaction::write_read(DEFAULT_ADDRESS, vec![0x72, 0xA7, 0x0F], vec![0x06]),
        ]);

        dev.set_measurement_resolution(14).unwrap();
        assert_eq!(dev.measurement_resolution().unwrap(), 14);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn out_of_range_resolution_is_rejected() {
        let mut dev = sensor(&[]);

        assert_eq!(
            dev.set_measurement_resolution(7),
            Err(Error::InvalidResolution)
        );
        assert_eq!(
            dev.set_measurement_resolution(15),
            Err(Error::InvalidResolution)
        );

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn measurement_ready_flag() {
        let mut dev = sensor(&[
            I2cTransaction::write_read(
                DEFAULT_ADDRESS,
                vec![0xF3, 0x52],
                vec![0x80, 0x00, 0xA2],
            ),
            I2cTransaction::write_read(
                DEFAULT_ADDRESS,
                vec![0xF3, 0x52],
                vec![0x00, 0x00, 0x81],
            ),
        ]);

        assert!(dev.measurement_ready().unwrap());
        assert!(!dev.measurement_ready().unwrap());

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn identification_verifies_checksum() {
        let id = [0x45, 0x2B, 0x45, 0x20, 0x54, 0x45, 0x45, 0x01];
        let mut response = id.to_vec();
        response.push(0x4C);

        let mut dev = sensor(&[I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x70, 0x29],
            response,
        )]);

        assert_eq!(dev.identification().unwrap(), id);

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn corrupted_identification_is_rejected() {
        let mut dev = sensor(&[I2cTransaction::write_read(
            DEFAULT_ADDRESS,
            vec![0x70, 0x29],
            vec![0x45, 0x2B, 0x45, 0x20, 0x54, 0x45, 0x45, 0x01, 0xFF],
        )]);

        assert!(matches!(
            dev.identification(),
            Err(Error::Checksum { .. })
        ));

        let (mut i2c, _) = dev.release();
        i2c.done();
    }

    #[test]
    fn plain_commands_write_their_word() {
        let mut dev = sensor(&[
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x20, 0x1E]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x30, 0x93]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x30, 0xA2]),
            I2cTransaction::write(DEFAULT_ADDRESS, vec![0x30, 0x41]),
        ]);

        dev.start_periodic_measurement().unwrap();
        dev.end_periodic_measurement().unwrap();
        dev.soft_reset().unwrap();
        dev.clear_status_register().unwrap();

        let (mut i2c, _) = dev.release();
        i2c.done();
    }
}
