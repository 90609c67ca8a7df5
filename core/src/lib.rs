#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod config;
pub mod error;
pub mod filter;
pub mod scheduler;
pub mod task;
pub mod wind;

#[cfg(test)]
mod mock;

pub use adc::{AdcDriver, Channel, SAMPLE_RATE, TICK_RATE};
pub use config::Config;
pub use error::InvalidChannel;
pub use filter::{Filter, LatestSample, MovingAverage, SampleOutput};
pub use scheduler::Scheduler;
pub use task::{AdcTask, SamplingTask, SETTLE_SAMPLES};
pub use wind::{
    compass_point, Clock, PulseCounter, Rearm, WindMeter, WindSample, WindSampleHandler,
    WindSensor, WindState,
};
