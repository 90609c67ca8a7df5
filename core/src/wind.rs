//! Wind speed and direction from a Davis 6410 style sensor.
//!
//! Speed comes from a reed switch closing once per cup revolution, counted by an external
//! [`PulseCounter`] over a fixed window. Direction comes from a potentiometer in the vane, read
//! through an [`AdcTask`] on the shared converter once the speed window has closed.
//!
//! ```text
//! Idle ──start_sample──▶ CountingSpeed ──window elapsed──▶ ReadingDirection
//!  ▲                        ▲                                    │ vane sample
//!  │                  SampleRequested ◀──Rearm::Again──┐         ▼
//!  └───────────────Rearm::Stop───────────────── AssemblingResult
//! ```

use fugit::{MillisDurationU32, TimerInstantU32};

use crate::adc::AdcDriver;
use crate::filter::{Filter, LatestSample, SampleOutput};
use crate::scheduler::Scheduler;
use crate::task::AdcTask;

pub type Instant = TimerInstantU32<1000>;
pub type Duration = MillisDurationU32;

/// The sensor gives one pulse per window of this length per mile per hour
pub const MPH_WINDOW: Duration = Duration::from_ticks(2250);

/// Default speed window. At the sensor's 1 mph minimum this is exactly one revolution.
pub const DEFAULT_SAMPLE_WINDOW: Duration = MPH_WINDOW;

/// Lower bound of compass sectors 1 to 15, then the wrap back to north
const SECTOR_THRESHOLDS: [u8; 16] = [
    8, 24, 40, 56, 72, 88, 104, 120, 136, 152, 168, 184, 200, 216, 232, 248,
];

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Edge counter on the anemometer input, incremented from its own interrupt
pub trait PulseCounter {
    fn reset(&mut self);

    /// Pulses since the last reset
    fn count(&self) -> u32;
}

/// Millisecond wall clock
pub trait Clock {
    fn now(&self) -> Instant;
}

/// One assembled measurement
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindSample {
    pub mph: f32,
    /// Compass sector, 0 is north, 4 is east
    pub direction: u8,
}

/// What to do after a sample was handed to the [`WindSampleHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rearm {
    Stop,
    /// Keep the handler and start the next sample on the next service call
    Again,
}

/// Receives finished samples, synchronously from [`WindSensor::service`]
pub trait WindSampleHandler {
    fn on_sample(&mut self, sample: WindSample) -> Rearm;
}

impl<F> WindSampleHandler for F
where
    F: FnMut(WindSample) -> Rearm,
{
    fn on_sample(&mut self, sample: WindSample) -> Rearm {
        self(sample)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindState {
    Idle,
    SampleRequested,
    CountingSpeed,
    ReadingDirection,
    AssemblingResult,
}

/// The interface a wind sensor offers to whatever forwards its readings
pub trait WindMeter {
    type Handler;

    /// Start a new sample. `handler` is called once the sample is complete.
    ///
    /// Returns false, and drops `handler`, if a sample is already in progress.
    fn start_sample(&mut self, handler: Self::Handler) -> bool;

    /// Drop the sample in progress without calling its handler
    fn abort_sample(&mut self);

    /// Speed of the last completed sample
    fn wind_mph(&self) -> f32;

    /// Compass sector of the last completed sample, 0 is north, 4 is east
    fn wind_direction(&self) -> u8;
}

/// Speed for `pulses` counted over `window`
pub fn pulses_to_mph(pulses: u32, window: Duration) -> f32 {
    pulses as f32 * MPH_WINDOW.ticks() as f32 / window.ticks().max(1) as f32
}

/// Compass sector (0..16) of a raw vane reading
pub fn direction_sector(raw: u8) -> u8 {
    let passed = SECTOR_THRESHOLDS
        .iter()
        .take_while(|&&threshold| raw >= threshold)
        .count();

    (passed % COMPASS_POINTS.len()) as u8
}

/// Abbreviated name of a compass sector, "N" to "NNW"
pub fn compass_point(sector: u8) -> &'static str {
    COMPASS_POINTS[usize::from(sector) % COMPASS_POINTS.len()]
}

/// State machine sequencing one speed window and one vane reading into a [`WindSample`].
///
/// Nothing here waits: [`service`](Self::service) has to be called regularly, and how often
/// determines how precisely the speed window ends.
pub struct WindSensor<'a, A, P, K, H, V = LatestSample> {
    scheduler: &'a Scheduler<'a, A>,
    vane: &'a AdcTask<V>,
    counter: P,
    clock: K,
    window: Duration,

    state: WindState,
    window_start: Instant,
    pulses: u32,
    raw_direction: u8,
    mph: f32,
    direction: u8,
    handler: Option<H>,
}

impl<'a, A, P, K, H, V> WindSensor<'a, A, P, K, H, V>
where
    A: AdcDriver,
    P: PulseCounter,
    K: Clock,
    H: WindSampleHandler,
    V: Filter + SampleOutput + 'a,
{
    /// A zero `window` is treated as one millisecond.
    pub fn new(
        scheduler: &'a Scheduler<'a, A>,
        vane: &'a AdcTask<V>,
        counter: P,
        clock: K,
        window: Duration,
    ) -> Self {
        let window_start = clock.now();

        Self {
            scheduler,
            vane,
            counter,
            clock,
            window: window.max(Duration::from_ticks(1)),
            state: WindState::Idle,
            window_start,
            pulses: 0,
            raw_direction: 0,
            mph: 0.0,
            direction: 0,
            handler: None,
        }
    }

    pub fn state(&self) -> WindState {
        self.state
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Pulses counted in the last closed window
    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    /// Raw vane reading behind the last direction
    pub fn raw_direction(&self) -> u8 {
        self.raw_direction
    }

    /// Advance the state machine. Call this from the main loop as often as possible.
    pub fn service(&mut self) {
        match self.state {
            WindState::Idle => {}
            WindState::SampleRequested => self.open_window(),
            WindState::CountingSpeed => {
                if self.elapsed() >= self.window {
                    self.pulses = self.counter.count();
                    trace!("speed window closed with {} pulses", self.pulses);

                    self.vane.start(self.scheduler);
                    self.state = WindState::ReadingDirection;
                }
            }
            WindState::ReadingDirection => match self.vane.filter(|f| f.output()) {
                Some(raw) => {
                    self.raw_direction = raw;
                    self.vane.stop(self.scheduler);
                    self.state = WindState::AssemblingResult;
                }
                None if !self.scheduler.is_active(self.vane) => {
                    warn!("vane task lost the converter, restarting it");
                    self.vane.start(self.scheduler);
                }
                None => {}
            },
            WindState::AssemblingResult => self.assemble(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.clock
            .now()
            .checked_duration_since(self.window_start)
            .unwrap_or(Duration::from_ticks(0))
    }

    fn open_window(&mut self) {
        self.counter.reset();
        self.pulses = 0;
        self.window_start = self.clock.now();
        self.state = WindState::CountingSpeed;
    }

    fn assemble(&mut self) {
        self.mph = pulses_to_mph(self.pulses, self.window);
        self.direction = direction_sector(self.raw_direction);
        self.state = WindState::Idle;

        let sample = WindSample {
            mph: self.mph,
            direction: self.direction,
        };
        debug!(
            "wind sample: {} mph from {}",
            sample.mph,
            compass_point(sample.direction)
        );

        if let Some(mut handler) = self.handler.take() {
            if handler.on_sample(sample) == Rearm::Again {
                self.handler = Some(handler);
                self.state = WindState::SampleRequested;
            }
        }
    }
}

impl<'a, A, P, K, H, V> WindMeter for WindSensor<'a, A, P, K, H, V>
where
    A: AdcDriver,
    P: PulseCounter,
    K: Clock,
    H: WindSampleHandler,
    V: Filter + SampleOutput + 'a,
{
    type Handler = H;

    fn start_sample(&mut self, handler: H) -> bool {
        if self.state != WindState::Idle {
            debug!("wind sample already in progress");
            return false;
        }

        self.handler = Some(handler);
        self.open_window();
        true
    }

    fn abort_sample(&mut self) {
        if self.state == WindState::Idle {
            return;
        }

        self.vane.stop(self.scheduler);
        self.handler = None;
        self.state = WindState::Idle;
        info!("wind sample aborted");
    }

    fn wind_mph(&self) -> f32 {
        self.mph
    }

    fn wind_direction(&self) -> u8 {
        self.direction
    }
}
