use std::{
    sync::{
        atomic::{AtomicU32, AtomicU8, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rand::Rng;
use windsampler_core::{wind::MPH_WINDOW, Channel};

use crate::hardware::{AnalogInputs, SharedPulseCounter};

/// Highest wind speed the simulation wanders up to
const MAX_MPH: f32 = 60.0;

/// Wind that wanders around at random, in hundredths of a mph and a compass sector
pub struct Weather {
    centi_mph: AtomicU32,
    sector: AtomicU8,
}

impl Weather {
    pub fn new(mph: f32, sector: u8) -> Self {
        Self {
            centi_mph: AtomicU32::new((mph * 100.0) as u32),
            sector: AtomicU8::new(sector % 16),
        }
    }

    pub fn mph(&self) -> f32 {
        self.centi_mph.load(Ordering::Relaxed) as f32 / 100.0
    }

    pub fn sector(&self) -> u8 {
        self.sector.load(Ordering::Relaxed)
    }

    /// Take one random step in speed and direction
    pub fn wander(&self, rng: &mut impl Rng) {
        let mph = (self.mph() + rng.gen_range(-1.5..=1.5)).clamp(0.0, MAX_MPH);
        self.centi_mph.store((mph * 100.0) as u32, Ordering::Relaxed);

        let turn: i8 = rng.gen_range(-1..=1);
        let sector = (self.sector() as i8 + turn).rem_euclid(16) as u8;
        self.sector.store(sector, Ordering::Relaxed);
    }

    /// Time between two reed switch closings at the current speed
    pub fn pulse_interval(&self) -> Option<Duration> {
        let mph = self.mph();
        (mph > 0.0).then(|| Duration::from_millis(MPH_WINDOW.ticks() as u64).div_f32(mph))
    }
}

/// Raw vane reading in the middle of `sector`, plus a little noise
pub fn vane_reading(sector: u8, noise: i8) -> u8 {
    ((sector % 16) as i16 * 16 + i16::from(noise)).rem_euclid(256) as u8
}

/// Let the weather wander and drive the vane input with it
pub fn spawn_weather(weather: Arc<Weather>, inputs: Arc<AnalogInputs>, vane: Channel) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        loop {
            weather.wander(&mut rng);
            inputs.set(vane, vane_reading(weather.sector(), rng.gen_range(-3..=3)));
            log::trace!(
                "Weather is now {:.2} mph from sector {}",
                weather.mph(),
                weather.sector()
            );
            thread::sleep(Duration::from_millis(500));
        }
    });
}

/// Close the reed switch at the rate the current wind speed dictates
pub fn spawn_anemometer(weather: Arc<Weather>, pulses: SharedPulseCounter) {
    thread::spawn(move || loop {
        match weather.pulse_interval() {
            Some(interval) => {
                thread::sleep(interval);
                pulses.count_pulse();
            }
            None => thread::sleep(Duration::from_millis(100)),
        }
    });
}
