//! Host stand-ins for the hardware behind the traits

use core::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use critical_section::{CriticalSection, Mutex};

use crate::adc::{AdcDriver, Channel};
use crate::filter::Filter;
use crate::task::SamplingTask;
use crate::wind::{Clock, Instant, PulseCounter};

pub fn channel(id: u8) -> Channel {
    Channel::new(id).unwrap()
}

/// Converter whose conversions finish as soon as they are triggered, unless stalled.
///
/// A conversion latches the input of the channel selected at trigger time.
#[derive(Default)]
pub struct MockAdc {
    pub inputs: [u8; 8],
    pub stalled: bool,
    pub selected: Option<Channel>,
    pub switches: Vec<Channel>,
    pub inits: usize,
    pub triggers: usize,
    conversion: Option<u8>,
}

impl MockAdc {
    pub fn with_inputs(inputs: [u8; 8]) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }
}

impl AdcDriver for MockAdc {
    fn init(&mut self) {
        self.inits += 1;
    }

    fn trigger(&mut self) {
        self.triggers += 1;
        let input = self.selected.map_or(0, Channel::id);
        self.conversion = Some(self.inputs[usize::from(input)]);
    }

    fn ready(&self) -> bool {
        !self.stalled && self.conversion.is_some()
    }

    fn read(&mut self) -> u8 {
        self.conversion.take().unwrap_or(0)
    }

    fn select_channel(&mut self, channel: Channel) {
        self.selected = Some(channel);
        self.switches.push(channel);
    }
}

/// Filter that keeps everything it is given
#[derive(Default)]
pub struct Recorder {
    pub samples: Vec<u8>,
}

impl Filter for Recorder {
    fn process_sample(&mut self, sample: u8) {
        self.samples.push(sample);
    }

    fn reset(&mut self) {
        self.samples.clear();
    }
}

/// Task that only counts its `arm` and `service` calls
pub struct CountingTask {
    channel: Channel,
    arms: Mutex<Cell<usize>>,
    services: Mutex<Cell<usize>>,
}

impl CountingTask {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            arms: Mutex::new(Cell::new(0)),
            services: Mutex::new(Cell::new(0)),
        }
    }

    pub fn arms(&self) -> usize {
        critical_section::with(|cs| self.arms.borrow(cs).get())
    }

    pub fn services(&self) -> usize {
        critical_section::with(|cs| self.services.borrow(cs).get())
    }
}

impl SamplingTask for CountingTask {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn arm(&self, cs: CriticalSection<'_>) {
        let arms = self.arms.borrow(cs);
        arms.set(arms.get() + 1);
    }

    fn service(&self, cs: CriticalSection<'_>, _sample: u8) {
        let services = self.services.borrow(cs);
        services.set(services.get() + 1);
    }
}

/// Shared handle on a pulse count, so tests can add pulses while the sensor owns the counter
#[derive(Default, Clone)]
pub struct FakeCounter {
    pulses: Rc<Cell<u32>>,
    resets: Rc<Cell<usize>>,
}

impl FakeCounter {
    pub fn add(&self, pulses: u32) {
        self.pulses.set(self.pulses.get() + pulses);
    }

    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl PulseCounter for FakeCounter {
    fn reset(&mut self) {
        self.pulses.set(0);
        self.resets.set(self.resets.get() + 1);
    }

    fn count(&self) -> u32 {
        self.pulses.get()
    }
}

/// Millisecond clock that only moves when told to
#[derive(Default, Clone)]
pub struct FakeClock {
    millis: Rc<Cell<u32>>,
}

impl FakeClock {
    pub fn starting_at(millis: u32) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    pub fn advance(&self, millis: u32) {
        self.millis.set(self.millis.get().wrapping_add(millis));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.millis.get())
    }
}
