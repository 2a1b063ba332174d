#![deny(unsafe_code)]
#![deny(warnings)]
//! DHT11/DHT21/DHT22 single-wire sensor
//!
//! The host pulls the line low to request a frame, the sensor answers with
//! an 80 us low / 80 us high preamble followed by 40 bits. Each bit starts
//! with ~50 us low; the length of the following high pulse encodes the bit
//! (~27 us = 0, ~70 us = 1). Frames are 2 bytes humidity, 2 bytes
//! temperature and a checksum byte.

use defmt::{debug, Format};
use embassy_stm32::gpio::{Flex, Level, Pull, Speed};
use embassy_time::{block_for, Duration, Instant};
use hal_abstractions::{SensorDriver, SensorModel, TemperatureHumidity};

use crate::runtime::pins;

/// Sensor needs at least this long between frames
const MIN_INTERVAL: Duration = Duration::from_secs(2);

/// High pulses longer than this are a `1` bit
const ONE_THRESHOLD_US: u64 = 40;

/// DHT read errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum DhtError {
    /// Pin is not wired to a DHT sensor on this board
    UnknownPin(u8),
    /// Sensor on this pin was already created
    PinInUse,
    /// Sensor did not answer or a bit timed out
    Timeout,
    /// Frame checksum mismatch
    Checksum,
}

/// Hands out the one DHT sensor wired to this board
pub struct DhtDriver {
    pin: Option<Flex<'static>>,
}

impl DhtDriver {
    pub fn new(pin: Flex<'static>) -> Self {
        Self { pin: Some(pin) }
    }
}

impl SensorDriver for DhtDriver {
    type Sensor = Dht;
    type Error = DhtError;

    fn create(&mut self, pin: u8, model: SensorModel) -> Result<Dht, DhtError> {
        if pin != pins::DHT {
            return Err(DhtError::UnknownPin(pin));
        }
        let flex = self.pin.take().ok_or(DhtError::PinInUse)?;
        Ok(Dht::new(flex, model))
    }
}

/// A DHT sensor on a bidirectional pin
///
/// Temperature and humidity come from the same frame; a second read within
/// [`MIN_INTERVAL`] is answered from the previous frame.
pub struct Dht {
    pin: Flex<'static>,
    model: SensorModel,
    last: Option<(Instant, Result<(f32, f32), DhtError>)>,
}

impl Dht {
    fn new(mut pin: Flex<'static>, model: SensorModel) -> Self {
        // Idle high, released to the pull-up
        pin.set_as_input(Pull::Up);
        Self {
            pin,
            model,
            last: None,
        }
    }

    fn sample(&mut self) -> Result<(f32, f32), DhtError> {
        if let Some((at, result)) = self.last {
            if at.elapsed() < MIN_INTERVAL {
                return result;
            }
        }

        let result = self.read_frame().and_then(|frame| decode(self.model, &frame));
        if let Err(e) = result {
            debug!("{} read failed: {:?}", self.model, e);
        }
        self.last = Some((Instant::now(), result));
        result
    }

    fn read_frame(&mut self) -> Result<[u8; 5], DhtError> {
        let start_low = match self.model {
            SensorModel::Dht11 => Duration::from_millis(20),
            SensorModel::Dht21 | SensorModel::Dht22 => Duration::from_millis(3),
        };

        self.pin.set_as_output(Speed::Low);
        self.pin.set_level(Level::Low);
        block_for(start_low);
        self.pin.set_level(Level::High);
        block_for(Duration::from_micros(25));
        self.pin.set_as_input(Pull::Up);

        // Response preamble: 80 us low, 80 us high
        self.wait_while(Level::High, 85)?;
        self.wait_while(Level::Low, 85)?;
        self.wait_while(Level::High, 85)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_while(Level::Low, 56)?;
            let high_us = self.wait_while(Level::High, 75)?;
            if high_us > ONE_THRESHOLD_US {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(frame)
    }

    /// Microseconds the line stayed at `level`, up to `max_us`
    fn wait_while(&self, level: Level, max_us: u64) -> Result<u64, DhtError> {
        let start = Instant::now();
        while self.pin.get_level() == level {
            let waited = start.elapsed().as_micros();
            if waited > max_us {
                return Err(DhtError::Timeout);
            }
        }
        Ok(start.elapsed().as_micros())
    }
}

impl TemperatureHumidity for Dht {
    type Error = DhtError;

    fn read_temperature(&mut self) -> Result<f32, DhtError> {
        self.sample().map(|(t, _)| t)
    }

    fn read_humidity(&mut self) -> Result<f32, DhtError> {
        self.sample().map(|(_, h)| h)
    }
}

/// Decode a frame into (temperature C, humidity %)
fn decode(model: SensorModel, frame: &[u8; 5]) -> Result<(f32, f32), DhtError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(DhtError::Checksum);
    }

    match model {
        SensorModel::Dht11 => {
            let humidity = frame[0] as f32 + frame[1] as f32 / 10.0;
            let magnitude = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
            let temperature = if frame[3] & 0x80 != 0 {
                -magnitude
            } else {
                magnitude
            };
            Ok((temperature, humidity))
        }
        SensorModel::Dht21 | SensorModel::Dht22 => {
            let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
            let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
            let temperature = if frame[2] & 0x80 != 0 {
                -magnitude
            } else {
                magnitude
            };
            Ok((temperature, humidity))
        }
    }
}
