//! Proximity threshold example
//!
//! This example demonstrates how to:
//! - Program proximity interrupt thresholds and persistence
//! - Select a long wait time between cycles
//! - Watch the interrupt flag in the status register

use apds9900::Apds9900;
use embedded_hal::delay::DelayNs;

use linux_embedded_hal::{Delay, I2cdev};

/// Turn the outcome of the last transaction into a demo error
fn check(sensor: &mut Apds9900<I2cdev>, step: &str) -> Result<(), Box<dyn std::error::Error>> {
    match sensor.last_error() {
        Some(error) => Err(format!("{} failed: {:?}", step, error).into()),
        None => Ok(()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    let mut sensor = Apds9900::new(i2c);
    if !sensor.begin() {
        return Err("no APDS-9900 answered on 0x39".into());
    }

    sensor.set_proximity_time(apds9900::DEFAULT_PROXIMITY_TIME_MS);
    check(&mut sensor, "proximity time")?;
    sensor.set_proximity_pulse_count(8);
    check(&mut sensor, "pulse count")?;
    // Above 696 ms the wait timer switches to 32 ms steps
    sensor.set_wait_time(1000);
    check(&mut sensor, "wait time")?;
    sensor.enable_wait(true);
    check(&mut sensor, "wait enable")?;
    sensor.enable_proximity(true);
    check(&mut sensor, "proximity enable")?;

    if !sensor.set_prox_thresholds(100, 600) {
        return Err("low threshold must be below high threshold".into());
    }
    check(&mut sensor, "thresholds")?;
    if !sensor.set_prox_interrupt_persistence(2) {
        return Err("persistence out of range".into());
    }
    check(&mut sensor, "persistence")?;
    sensor.wake_up();
    check(&mut sensor, "power on")?;

    println!("Wait time: {} ms", sensor.wait_time());
    println!("Proximity thresholds: 100..600, persistence 2");
    println!("Press Ctrl+C to exit\n");

    loop {
        delay.delay_ms(250);

        let status = sensor.status_info();
        if let Some(error) = sensor.last_error() {
            println!("Status read failed: {:?}", error);
            continue;
        }
        if status.prox_interrupt {
            let prox = sensor.prox_data();
            match sensor.last_error() {
                Some(error) => println!("Proximity read failed: {:?}", error),
                None => println!("Object outside window, proximity = {}", prox),
            }
        }
    }
}
