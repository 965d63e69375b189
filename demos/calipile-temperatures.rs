use std::env;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context};

use ir_thermometers::linux::open_bus;
use ir_thermometers::{Calipile, Config};

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
        _ => bail!("Usage: calipile-temperatures [I2C bus] [sensor address]"),
    }
    let bus = open_bus(&config)?;
    let mut sensor = Calipile::new(bus, config)?;
    if let Some(warning) = sensor.take_warning() {
        eprintln!("Warning: {}", warning);
    }
    let calibration = sensor.calibration();
    println!(
        "PTAT25: {}  M: {:.2}  U0: {}  UOut1: {}  TObj1: {} °C  k: {:e}",
        calibration.ptat25(),
        calibration.m(),
        calibration.u0(),
        calibration.uout1(),
        calibration.tobj1(),
        calibration.k()
    );
    for _ in 0..5 {
        let ambient = sensor.ambient_temperature_celsius()?;
        let object = sensor.object_temperature_celsius()?;
        println!(
            "Ambient: {:6.2} °C  Object: {:6.2} °C  Presence: {:3}  Motion: {:3}",
            ambient,
            object,
            sensor.presence()?,
            sensor.motion()?
        );
        sleep(Duration::from_millis(500));
    }
    sensor.halt()?;
    Ok(())
}
