//! Bench check for a wired-up TEE501.
//!
//! Run on the target board with the sensor attached. Exercises the
//! identification, settings and measurement paths and prints a pass/fail
//! summary. Exits non-zero if any check fails.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::{Delay, I2cdev};

use tee501::{DEFAULT_ADDRESS, Tee501, report};

const I2C_BUS: &str = "/dev/i2c-1";

// Test result tracking
struct TestResults {
    passed: u32,
    failed: u32,
    total: u32,
}

impl TestResults {
    fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            total: 0,
        }
    }

    fn assert(&mut self, condition: bool, test_name: &str) {
        self.total += 1;
        if condition {
            self.passed += 1;
            println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            println!("  ✗ {} FAILED", test_name);
        }
    }

    fn assert_eq<T: PartialEq + std::fmt::Debug>(&mut self, left: T, right: T, test_name: &str) {
        self.total += 1;
        if left == right {
            self.passed += 1;
            println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            println!("  ✗ {} FAILED: {:?} != {:?}", test_name, left, right);
        }
    }

    fn assert_in_range(&mut self, value: f32, low: f32, high: f32, test_name: &str) {
        self.total += 1;
        if value >= low && value <= high {
            self.passed += 1;
            println!("  ✓ {}", test_name);
        } else {
            self.failed += 1;
            println!(
                "  ✗ {} FAILED: {:.2} not in {:.2}..{:.2}",
                test_name, value, low, high
            );
        }
    }

    fn print_summary(&self) {
        println!("\n==========================================");
        println!("Test Summary:");
        println!("  Total:  {}", self.total);
        println!("  Passed: {}", self.passed);
        println!("  Failed: {}", self.failed);
        if self.failed == 0 {
            println!("\n✓ ALL TESTS PASSED!");
        } else {
            println!("\n✗ SOME TESTS FAILED");
        }
        println!("==========================================");
    }
}

fn test_identification<I2C: I2c, D: DelayNs>(
    results: &mut TestResults,
    sensor: &mut Tee501<I2C, D>,
) {
    println!("\n[TEST] Identification");

    match sensor.identification() {
        Ok(id) => {
            println!("    ID: {:02X?}", id);
            results.assert(true, "identification read");
            results.assert(id.iter().any(|&b| b != 0), "identification is non-zero");
        }
        Err(e) => {
            println!("    Failed to read identification: {}", e);
            results.assert(false, "identification read");
        }
    }
}

fn test_settings<I2C: I2c, D: DelayNs>(results: &mut TestResults, sensor: &mut Tee501<I2C, D>) {
    println!("\n[TEST] Settings");

    let original = match sensor.measurement_resolution() {
        Ok(bits) => {
            println!("    Current resolution: {} bit", bits);
            results.assert((8..=14).contains(&bits), "resolution in valid range");
            bits
        }
        Err(e) => {
            println!("    Failed to read resolution: {}", e);
            results.assert(false, "resolution read");
            return;
        }
    };

    // Round-trip through a different value, then restore
    let probe = if original == 14 { 12 } else { 14 };
    if sensor.set_measurement_resolution(probe).is_ok() {
        match sensor.measurement_resolution() {
            Ok(bits) => results.assert_eq(bits, probe, "resolution round-trip"),
            Err(_) => results.assert(false, "resolution round-trip"),
        }
        results.assert(
            sensor.set_measurement_resolution(original).is_ok(),
            "resolution restored",
        );
    } else {
        results.assert(false, "resolution write");
    }

    match sensor.periodic_interval_ms() {
        Ok(interval) => {
            println!("    Periodic interval: {} ms", interval);
            results.assert(true, "periodic interval read");
        }
        Err(e) => {
            println!("    Failed to read periodic interval: {}", e);
            results.assert(false, "periodic interval read");
        }
    }
}

fn test_single_shot<I2C: I2c, D: DelayNs>(results: &mut TestResults, sensor: &mut Tee501<I2C, D>) {
    println!("\n[TEST] Single-shot measurement");

    match sensor.single_shot_temperature() {
        Ok(temperature) => {
            println!("    {}", report::temperature_row(temperature));
            results.assert(true, "single-shot read");
            results.assert_in_range(
                temperature.celsius(),
                -40.0,
                60.0,
                "temperature in rated range",
            );
        }
        Err(e) => {
            println!("    Measurement failed: {}", e);
            results.assert(false, "single-shot read");
        }
    }
}

fn test_periodic<I2C: I2c, D: DelayNs>(results: &mut TestResults, sensor: &mut Tee501<I2C, D>) {
    println!("\n[TEST] Periodic measurement");

    if sensor.set_periodic_interval_ms(1_000).is_err() {
        results.assert(false, "periodic interval write");
        return;
    }
    results.assert(true, "periodic interval write");

    if sensor.start_periodic_measurement().is_err() {
        results.assert(false, "periodic start");
        return;
    }

    // Give the sensor one full interval to produce a buffered value
    thread::sleep(Duration::from_millis(1_500));

    match sensor.measurement_ready() {
        Ok(ready) => results.assert(ready, "measurement ready after one interval"),
        Err(e) => {
            println!("    Failed to read status: {}", e);
            results.assert(false, "measurement ready after one interval");
        }
    }

    match sensor.periodic_temperature() {
        Ok(temperature) => {
            println!("    {}", report::temperature_row(temperature));
            results.assert_in_range(
                temperature.celsius(),
                -40.0,
                60.0,
                "periodic temperature in rated range",
            );
        }
        Err(e) => {
            println!("    Periodic read failed: {}", e);
            results.assert(false, "periodic read");
        }
    }

    results.assert(sensor.end_periodic_measurement().is_ok(), "periodic end");
}

fn main() -> ExitCode {
    env_logger::init();

    println!("=== TEE501 Hardware Test ===");

    let i2c = match I2cdev::new(I2C_BUS) {
        Ok(i2c) => i2c,
        Err(e) => {
            eprintln!("cannot open {}: {}", I2C_BUS, e);
            return ExitCode::FAILURE;
        }
    };

    let mut sensor = Tee501::new(i2c, Delay {}, DEFAULT_ADDRESS);
    let mut results = TestResults::new();

    test_identification(&mut results, &mut sensor);
    test_settings(&mut results, &mut sensor);
    test_single_shot(&mut results, &mut sensor);
    test_periodic(&mut results, &mut sensor);

    results.print_summary();

    if results.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
