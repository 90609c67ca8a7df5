use std::{
    error::Error,
    num::{NonZeroUsize, ParseIntError},
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use windsampler_core::{
    compass_point, config::Config, AdcTask, LatestSample, Rearm, Scheduler, WindMeter,
    WindSample, WindSensor, WindState, TICK_RATE,
};

use crate::{
    hardware::{AnalogInputs, SharedPulseCounter, SimulatedAdc, StdClock},
    weather::Weather,
};

mod hardware;
mod weather;

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let config = Config::load(None).unwrap_or_else(|e| {
        log::warn!("No station config loaded ({e}), using the defaults");
        Config::default()
    });
    log::debug!("{config:?}");

    let sample_limit = parse_sample_limit(std::env::var("SAMPLES").ok())?;

    let inputs = Arc::new(AnalogInputs::default());
    let pulses = SharedPulseCounter::default();
    let weather = Arc::new(Weather::new(8.0, 0));

    let scheduler: &'static _ = Box::leak(Box::new(Scheduler::new(SimulatedAdc::new(
        inputs.clone(),
    ))));
    let vane: &'static _ = Box::leak(Box::new(AdcTask::with_settle_samples(
        config.vane_channel,
        LatestSample::new(),
        config.settle_samples,
    )));

    weather::spawn_weather(weather.clone(), inputs, config.vane_channel);
    weather::spawn_anemometer(weather.clone(), pulses.clone());

    // Plays the timer interrupt
    let tick_period = Duration::from_secs(1) / TICK_RATE.to_Hz();
    thread::spawn(move || loop {
        scheduler.tick();
        thread::sleep(tick_period);
    });

    let (sample_sender, sample_receiver) = mpsc::channel();
    let mut taken = 0;
    let handler = move |sample: WindSample| {
        taken += 1;
        // The receiver only goes away once main returns
        let _ = sample_sender.send(sample);

        match sample_limit {
            Some(limit) if taken >= limit.get() => Rearm::Stop,
            _ => Rearm::Again,
        }
    };

    let mut sensor = WindSensor::new(
        scheduler,
        vane,
        pulses,
        StdClock::new(),
        config.sample_window(),
    );
    if !sensor.start_sample(handler) {
        return Err("wind sensor busy before the first sample".into());
    }

    log::info!(
        "Sampling wind every {} ms, vane on channel {}",
        sensor.window().ticks(),
        config.vane_channel.id()
    );

    loop {
        sensor.service();

        while let Ok(sample) = sample_receiver.try_recv() {
            log::info!(
                "Wind {:.1} mph from {} (simulated {:.1} mph from {})",
                sample.mph,
                compass_point(sample.direction),
                weather.mph(),
                compass_point(weather.sector()),
            );
        }

        if sensor.state() == WindState::Idle {
            log::info!("Done after {} samples", sample_limit.map_or(0, NonZeroUsize::get));
            return Ok(());
        }

        thread::sleep(Duration::from_millis(1));
    }
}

/// Stop after this many samples, or keep going forever when unset. Zero is rejected.
fn parse_sample_limit(limit: Option<String>) -> Result<Option<NonZeroUsize>, ParseIntError> {
    limit.map(|limit| limit.trim().parse()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_limit() {
        assert_eq!(parse_sample_limit(None), Ok(None));
        assert_eq!(parse_sample_limit(Some("3".into())), Ok(NonZeroUsize::new(3)));
        assert!(parse_sample_limit(Some("0".into())).is_err());
        assert!(parse_sample_limit(Some("many".into())).is_err());
    }
}
