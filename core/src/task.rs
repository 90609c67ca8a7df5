use core::cell::{Cell, RefCell};

use critical_section::{CriticalSection, Mutex};
use fugit::HertzU32;

use crate::adc::{AdcDriver, Channel, SAMPLE_RATE};
use crate::filter::Filter;
use crate::scheduler::Scheduler;

/// Samples thrown away after a task is started, to let the converter settle on the new channel
pub const SETTLE_SAMPLES: u8 = 4;

/// A consumer of the shared converter.
///
/// The scheduler holds a borrowed `&dyn SamplingTask` for whichever task is active and calls
/// `service` from the tick interrupt, so implementations share their state through the given
/// critical section instead of `&mut self`.
pub trait SamplingTask: Sync {
    /// The input this task wants to sample
    fn channel(&self) -> Channel;

    /// Called by the scheduler when the task becomes the active one
    fn arm(&self, cs: CriticalSection<'_>);

    /// Receives every raw sample while the task is active
    fn service(&self, cs: CriticalSection<'_>, sample: u8);
}

/// Sampling task that feeds its settled samples into a [`Filter`]
pub struct AdcTask<F> {
    channel: Channel,
    settle_samples: u8,
    ignore: Mutex<Cell<u8>>,
    filter: Mutex<RefCell<F>>,
}

impl<F: Filter> AdcTask<F> {
    pub const fn new(channel: Channel, filter: F) -> Self {
        Self::with_settle_samples(channel, filter, SETTLE_SAMPLES)
    }

    pub const fn with_settle_samples(channel: Channel, filter: F, settle_samples: u8) -> Self {
        Self {
            channel,
            settle_samples,
            ignore: Mutex::new(Cell::new(0)),
            filter: Mutex::new(RefCell::new(filter)),
        }
    }

    /// Samples per second this task receives while active
    pub const fn sample_rate(&self) -> HertzU32 {
        SAMPLE_RATE
    }

    /// Make this the active task, displacing whichever task held the converter
    pub fn start<'a, A: AdcDriver>(&'a self, scheduler: &Scheduler<'a, A>)
    where
        F: 'a,
    {
        scheduler.start(self);
    }

    /// Release the converter, if this task still holds it.
    ///
    /// Returns whether the task was active.
    pub fn stop<A: AdcDriver>(&self, scheduler: &Scheduler<'_, A>) -> bool {
        scheduler.stop(self)
    }

    /// Run `f` on the filter with the tick interrupt masked
    pub fn filter<R>(&self, f: impl FnOnce(&mut F) -> R) -> R {
        critical_section::with(|cs| f(&mut self.filter.borrow_ref_mut(cs)))
    }

    /// Samples still to be discarded before the filter sees any
    pub fn settling(&self) -> u8 {
        critical_section::with(|cs| self.ignore.borrow(cs).get())
    }
}

impl<F: Filter> SamplingTask for AdcTask<F> {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn arm(&self, cs: CriticalSection<'_>) {
        self.ignore.borrow(cs).set(self.settle_samples);
        self.filter.borrow_ref_mut(cs).reset();
    }

    fn service(&self, cs: CriticalSection<'_>, sample: u8) {
        let ignore = self.ignore.borrow(cs);
        match ignore.get() {
            0 => self.filter.borrow_ref_mut(cs).process_sample(sample),
            n => ignore.set(n - 1),
        }
    }
}
