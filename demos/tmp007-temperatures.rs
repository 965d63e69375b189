use std::env;

use anyhow::{bail, Context};
use linux_embedded_hal::Delay;

use ir_thermometers::linux::open_bus;
use ir_thermometers::tmp007::Averaging;
use ir_thermometers::{Config, Tmp007};

fn parse_address(arg: &str) -> anyhow::Result<u8> {
    let address = match arg.strip_prefix("0x") {
        Some(hex_digits) => u8::from_str_radix(hex_digits, 16)?,
        None => arg.parse()?,
    };
    Ok(address)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut config = Config::new();
    match args.len() {
        1 => (),
        2 | 3 => {
            config = config.with_bus(args[1].parse().context("the bus must be a number")?);
            if let Some(address) = args.get(2) {
                config = config.with_address(parse_address(address)?);
            }
        }
        _ => bail!("Usage: tmp007-temperatures [I2C bus] [sensor address]"),
    }
    let bus = open_bus(&config)?;
    let mut sensor = Tmp007::new(bus, Delay, config)?;
    sensor.set_averaging(Averaging::Four)?;
    for _ in 0..5 {
        // Four samples take a little over a second
        sensor.wait_for_conversion_ready_within(20)?;
        let die = sensor.die_temperature()?;
        let object = sensor.object_temperature()?;
        let voltage = sensor.sensor_voltage()?;
        println!(
            "Die: {:6.2} °C  Object: {:6.2} °C  Sensor: {:8.2} µV",
            die, object, voltage
        );
    }
    sensor.halt()?;
    Ok(())
}
