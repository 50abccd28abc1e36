//! Basic ambient light and proximity reading example
//!
//! This example demonstrates how to:
//! - Bring up the APDS-9900 on a Linux I2C bus
//! - Apply a measurement setup with `Config`
//! - Poll the status register and read all three channels
//! - Tell a failed read apart from a real zero

use apds9900::{AlsGain, Apds9900, Config, LedDrive};
use embedded_hal::delay::DelayNs;

// This example uses linux-embedded-hal for demonstration
// Replace with your platform's I2C implementation
use linux_embedded_hal::{Delay, I2cdev};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize I2C interface
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    let mut sensor = Apds9900::new(i2c);

    println!("Initializing APDS-9900 sensor...");
    if !sensor.begin() {
        return Err("no APDS-9900 answered on 0x39".into());
    }

    let id = sensor.device_id();
    match sensor.part() {
        Some(part) => println!("Device: {:?} (ID 0x{:02X}, rev 0x{:02X})", part, id, sensor.revision()),
        None => println!("Unknown device ID 0x{:02X}, continuing anyway", id),
    }

    let config = Config {
        integration_time_ms: 100,
        als_gain: AlsGain::Gain8x,
        led_drive: LedDrive::Ma100,
        proximity_pulse_count: 8,
        ..Config::default()
    };
    if !sensor.configure(&config) {
        match sensor.last_error() {
            Some(error) => return Err(format!("configuration failed: {:?}", error).into()),
            None => return Err("configuration rejected".into()),
        }
    }

    println!(
        "Integration: {} ms, proximity: {} ms, wait: {} ms",
        sensor.integration_time(),
        sensor.proximity_time(),
        sensor.wait_time()
    );
    println!("Press Ctrl+C to exit\n");

    loop {
        delay.delay_ms(200);

        let status = sensor.status_info();
        if let Some(error) = sensor.last_error() {
            println!("Status read failed: {:?}", error);
            continue;
        }
        if !status.als_valid || !status.prox_valid {
            println!("Data not ready, waiting...");
            continue;
        }

        // Each read overwrites the error slot, so check after every one
        let clear = sensor.als_cdata();
        if let Some(error) = sensor.last_error() {
            println!("Clear channel read failed: {:?}", error);
            continue;
        }
        let ir = sensor.als_irdata();
        if let Some(error) = sensor.last_error() {
            println!("IR channel read failed: {:?}", error);
            continue;
        }
        let prox = sensor.prox_data();
        if let Some(error) = sensor.last_error() {
            println!("Proximity read failed: {:?}", error);
            continue;
        }

        println!("Clear: {:6} IR: {:6} Proximity: {:5}", clear, ir, prox);
    }
}
