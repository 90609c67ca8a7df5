use std::{
    sync::{
        atomic::{AtomicU32, AtomicU8, Ordering},
        Arc,
    },
    time,
};

use windsampler_core::{
    wind::{Clock, Instant},
    AdcDriver, Channel, PulseCounter,
};

/// Voltages on the eight converter inputs, as the converter would see them
#[derive(Default)]
pub struct AnalogInputs([AtomicU8; Channel::COUNT as usize]);

impl AnalogInputs {
    pub fn set(&self, channel: Channel, value: u8) {
        self.0[usize::from(channel.id())].store(value, Ordering::Relaxed);
    }

    pub fn get(&self, channel: Channel) -> u8 {
        self.0[usize::from(channel.id())].load(Ordering::Relaxed)
    }
}

/// Converter that finishes every conversion instantly
pub struct SimulatedAdc {
    inputs: Arc<AnalogInputs>,
    selected: Channel,
    conversion: Option<u8>,
}

impl SimulatedAdc {
    pub fn new(inputs: Arc<AnalogInputs>) -> Self {
        Self {
            inputs,
            selected: Channel::FIRST,
            conversion: None,
        }
    }
}

impl AdcDriver for SimulatedAdc {
    fn init(&mut self) {
        log::debug!("Simulated converter powered up");
    }

    fn trigger(&mut self) {
        self.conversion = Some(self.inputs.get(self.selected));
    }

    fn ready(&self) -> bool {
        self.conversion.is_some()
    }

    fn read(&mut self) -> u8 {
        self.conversion.take().unwrap_or_default()
    }

    fn select_channel(&mut self, channel: Channel) {
        self.selected = channel;
    }
}

/// Pulse count shared with the thread that plays the anemometer
#[derive(Clone, Default)]
pub struct SharedPulseCounter(Arc<AtomicU32>);

impl SharedPulseCounter {
    pub fn count_pulse(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

impl PulseCounter for SharedPulseCounter {
    fn reset(&mut self) {
        self.0.store(0, Ordering::Relaxed);
    }

    fn count(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Milliseconds since the station started
pub struct StdClock {
    start: time::Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            start: time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.start.elapsed().as_millis() as u32)
    }
}
