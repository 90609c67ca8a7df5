use fugit::HertzU32;
use stm32f7xx_hal::{
    pac,
    rcc::{self, Enable, Reset},
};
use windsampler_core::{AdcDriver, Channel, TICK_RATE};

/// Counter clock of TIM2 after prescaling
const TIM2_COUNTER_CLOCK: HertzU32 = HertzU32::MHz(1);

/// ADC1 running single 8 bit conversions, paced by TIM2 update interrupts at [`TICK_RATE`].
///
/// The timer only raises the interrupt. Conversions are started in software from the tick
/// handler so a channel switch always lands between two conversions.
pub struct AdcSampler {
    adc1: pac::ADC1,
    tim2: pac::TIM2,
    tim2_clk: HertzU32,
}

impl AdcSampler {
    /// Take the peripherals and enable their clocks. Nothing is configured until
    /// [`AdcDriver::init`].
    pub fn new(
        adc1: pac::ADC1,
        tim2: pac::TIM2,
        tim2_clk: HertzU32,
        apb1: &mut rcc::APB1,
        apb2: &mut rcc::APB2,
    ) -> Self {
        <pac::ADC1 as Enable>::enable(apb2);
        <pac::ADC1 as Reset>::reset(apb2);
        <pac::TIM2 as Enable>::enable(apb1);
        <pac::TIM2 as Reset>::reset(apb1);

        Self {
            adc1,
            tim2,
            tim2_clk,
        }
    }

    /// Configure ADC1 for single software triggered conversions
    /// at 8 bit resolution, left aligned, so the result is the top byte of DR
    fn init_adc1(&mut self) {
        let adc1 = &self.adc1;
        // Power down ADC1
        adc1.cr2.modify(|_, w| w.adon().clear_bit());

        // ADCCLK = PCLK2 / 4
        let adc_common = unsafe { &*pac::ADC_COMMON::ptr() };
        adc_common.ccr.modify(|_, w| w.adcpre().div4());

        // One conversion per trigger, no scanning
        adc1.cr1.modify(|_, w| {
            w.scan()
                .clear_bit()
                .discen()
                .clear_bit()
                // 8 bit resolution
                .res()
                .bits(0b10)
                .eocie()
                .disabled()
        });
        adc1.cr2.modify(|_, w| {
            w.cont()
                .single()
                .align()
                .left()
                // Only software starts conversions
                .exten()
                .disabled()
                .dma()
                .disabled()
        });

        // Regular sequence of length one
        adc1.sqr1.modify(|_, w| w.l().bits(0));

        // Longest sample time (480 cycles) on channels 0 to 7
        adc1.smpr2.write(|w| unsafe { w.bits(0x00FF_FFFF) });

        // Power up ADC1
        adc1.cr2.modify(|_, w| w.adon().enabled());
    }

    /// Setup TIM2 to raise an update interrupt at the tick rate
    fn init_tim2(&mut self) {
        let tim2 = &self.tim2;
        tim2.cr1.modify(|_, w| w.cen().disabled());

        let prescaler = self.tim2_clk.to_Hz() / TIM2_COUNTER_CLOCK.to_Hz() - 1;
        let reload = TIM2_COUNTER_CLOCK.to_Hz() / TICK_RATE.to_Hz() - 1;
        tim2.psc.write(|w| w.psc().bits(prescaler as u16));
        tim2.arr.write(|w| w.arr().bits(reload));

        // Load the prescaler now and drop the update flag that causes
        tim2.egr.write(|w| w.ug().set_bit());
        tim2.sr.modify(|_, w| w.uif().clear_bit());

        tim2.dier.modify(|_, w| w.uie().enabled());
        tim2.cr1.modify(|_, w| w.cen().enabled());
    }
}

impl AdcDriver for AdcSampler {
    fn init(&mut self) {
        self.init_adc1();
        self.init_tim2();
        defmt::debug!(
            "ADC1 ticking at {} Hz from a {} Hz timer clock",
            TICK_RATE.to_Hz(),
            self.tim2_clk.to_Hz()
        );
    }

    fn trigger(&mut self) {
        self.adc1.cr2.modify(|_, w| w.swstart().set_bit());
    }

    fn ready(&self) -> bool {
        self.adc1.sr.read().eoc().bit_is_set()
    }

    fn read(&mut self) -> u8 {
        // Reading DR clears EOC
        (self.adc1.dr.read().data().bits() >> 8) as u8
    }

    fn select_channel(&mut self, channel: Channel) {
        self.adc1.sqr3.modify(|_, w| unsafe { w.sq1().bits(channel.id()) });
    }
}

/// Acknowledge the TIM2 update interrupt
pub fn clear_tick_interrupt() {
    let tim2 = unsafe { &*pac::TIM2::ptr() };
    tim2.sr.modify(|_, w| w.uif().clear_bit());
}
