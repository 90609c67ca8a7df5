#![no_main]
#![no_std]

use defmt_rtt as _;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use panic_probe as _;
use rtic::app;
use rtic_monotonics::systick::Systick;
use static_cell::StaticCell;
use stm32f7xx_hal::{
    gpio::{Edge, ExtiPin, Input, Pin},
    prelude::*,
};

use windsampler_core::{
    compass_point, AdcTask, Channel as AdcChannel, Config, LatestSample, Rearm, Scheduler,
    WindMeter, WindSample, WindSensor,
};
use windsampler_firmware::{
    adc_sampler::{clear_tick_interrupt, AdcSampler},
    clock::SystickClock,
    pulse::{count_pulse, EdgeCounter},
};

type Handler = fn(WindSample) -> Rearm;
type Sensor = WindSensor<'static, AdcSampler, EdgeCounter, SystickClock, Handler>;

/// Finished samples on their way from `idle` to the `report` task
static WIND_SAMPLES: Channel<CriticalSectionRawMutex, WindSample, 4> = Channel::new();

defmt::timestamp!("{=u64:ms}", {
    use rtic_monotonics::Monotonic;
    Systick::now().ticks()
});

/// Sample handler: forward and keep sampling
fn queue_sample(sample: WindSample) -> Rearm {
    if WIND_SAMPLES.try_send(sample).is_err() {
        defmt::warn!("Report queue full, dropping wind sample");
    }
    Rearm::Again
}

#[app(device = stm32f7xx_hal::pac, dispatchers = [CAN1_RX0])]
mod app {
    use super::*;

    static SCHEDULER: StaticCell<Scheduler<'static, AdcSampler>> = StaticCell::new();
    static VANE: StaticCell<AdcTask<LatestSample>> = StaticCell::new();

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        scheduler: &'static Scheduler<'static, AdcSampler>,
        anemometer: Pin<'G', 0, Input>,
        sensor: Sensor,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let mut p = cx.device;

        defmt::println!("Wind sampler starting");

        let config = Config::default();

        let mut rcc = p.RCC.constrain();
        // Setup clocks
        let clocks = rcc.cfgr.sysclk(216.MHz()).hclk(216.MHz()).freeze();
        defmt::debug!(
            "sysclk {} Hz, pclk2 {} Hz, TIM2 {} Hz",
            clocks.sysclk().to_Hz(),
            clocks.pclk2().to_Hz(),
            clocks.timclk1().to_Hz()
        );

        // Setup systick as the millisecond clock
        let systick_token = rtic_monotonics::create_systick_token!();
        Systick::start(cx.core.SYST, clocks.sysclk().to_Hz(), systick_token);

        // Setup GPIO
        let gpioa = p.GPIOA.split();
        let gpiog = p.GPIOG.split();

        // Vane potentiometer on ADC1 IN0, the only input wired up as analog
        defmt::assert_eq!(config.vane_channel, AdcChannel::FIRST, "Vane must be on PA0");
        let _vane_in = gpioa.pa0.into_analog();

        // Anemometer reed switch pulls PG0 low once per revolution
        let mut anemometer = gpiog.pg0.into_pull_up_input();
        anemometer.make_interrupt_source(&mut p.SYSCFG, &mut rcc.apb2);
        anemometer.trigger_on_edge(&mut p.EXTI, Edge::Falling);
        anemometer.enable_interrupt(&mut p.EXTI);

        let adc = AdcSampler::new(
            p.ADC1,
            p.TIM2,
            clocks.timclk1(),
            &mut rcc.apb1,
            &mut rcc.apb2,
        );
        let scheduler: &'static _ = SCHEDULER.init(Scheduler::new(adc));
        let vane: &'static _ = VANE.init(AdcTask::with_settle_samples(
            config.vane_channel,
            LatestSample::new(),
            config.settle_samples,
        ));

        let mut sensor: Sensor = WindSensor::new(
            scheduler,
            vane,
            EdgeCounter,
            SystickClock,
            config.sample_window(),
        );
        if !sensor.start_sample(queue_sample as Handler) {
            defmt::panic!("Wind sensor busy before the first sample");
        }

        report::spawn().unwrap_or_else(|_| defmt::panic!("Failed to start report"));

        (
            Shared {},
            Local {
                scheduler,
                anemometer,
                sensor,
            },
        )
    }

    /// Drive the wind sensor between interrupts
    #[idle(local = [sensor])]
    fn idle(cx: idle::Context) -> ! {
        loop {
            cx.local.sensor.service();
            // The next tick wakes us up again
            cortex_m::asm::wfi();
        }
    }

    /// Log every finished wind sample
    #[task(priority = 1)]
    async fn report(_cx: report::Context) {
        loop {
            let sample = WIND_SAMPLES.receive().await;
            defmt::info!(
                "Wind {=f32} mph from {=str}",
                sample.mph,
                compass_point(sample.direction)
            );
        }
    }

    #[task(binds = TIM2, local = [scheduler], priority = 2)]
    fn on_tim2_update(cx: on_tim2_update::Context) {
        clear_tick_interrupt();
        cx.local.scheduler.tick();
    }

    #[task(binds = EXTI0, local = [anemometer], priority = 2)]
    fn on_cup_pulse(cx: on_cup_pulse::Context) {
        cx.local.anemometer.clear_interrupt_pending_bit();
        count_pulse();
    }
}

