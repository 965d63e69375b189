use std::env;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context};
use linux_embedded_hal::Delay;

use ir_thermometers::linux::open_bus;
use ir_thermometers::{Config, Mlx90614};

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
        _ => bail!("Usage: mlx90614-temperatures [I2C bus] [thermometer address]"),
    }
    let bus = open_bus(&config)?;
    let mut thermometer = Mlx90614::new(bus, Delay, config)?;
    println!("Device ID: {:016X}", thermometer.read_id()?);
    println!("Emissivity: {:.3}", thermometer.read_emissivity()?);
    let settling_time = thermometer.read_config()?.settling_time_ms()?;
    println!("Filter settling time: {:.1} ms", settling_time);
    let delay = Duration::from_millis(settling_time as u64);
    for _ in 0..5 {
        let ambient = thermometer.ambient_temperature()?;
        let object = thermometer.object_temperature()?;
        println!("Ambient: {:6.2} °C  Object: {:6.2} °C", ambient, object);
        sleep(delay);
    }
    thermometer.halt()?;
    Ok(())
}
