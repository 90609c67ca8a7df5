#![cfg_attr(not(test), no_std)]

pub mod adc_sampler;
pub mod clock;
pub mod pulse;
