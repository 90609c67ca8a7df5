use core::cell::RefCell;

use critical_section::Mutex;

use crate::adc::{AdcDriver, Channel};
use crate::task::SamplingTask;

/// Shares one converter between sampling tasks.
///
/// The converter runs continuously: every timer tick reads the finished conversion, switches the
/// input if a new channel was requested and starts the next conversion. The sample is then handed
/// to the active task, if any. At most one task is active at a time.
///
/// A channel switch only affects the conversion started in the same tick, so the first sample a
/// freshly started task receives may still come from the previous channel. [`AdcTask`] discards
/// its first few samples for that reason.
///
/// [`AdcTask`]: crate::task::AdcTask
pub struct Scheduler<'a, A> {
    inner: Mutex<RefCell<State<'a, A>>>,
}

struct State<'a, A> {
    adc: A,
    /// What the converter is configured for, `None` until the first switch
    current: Option<Channel>,
    /// What the next conversion should use
    requested: Channel,
    active: Option<&'a dyn SamplingTask>,
    initialised: bool,
}

impl<'a, A: AdcDriver> Scheduler<'a, A> {
    /// Wrap the converter. The hardware is left untouched until the first task starts.
    pub const fn new(adc: A) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(State {
                adc,
                current: None,
                requested: Channel::FIRST,
                active: None,
                initialised: false,
            })),
        }
    }

    /// Service the converter. Call this from the tick interrupt.
    ///
    /// Returns the sample that was read, or `None` when the conversion had not finished yet.
    pub fn tick(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let (sample, active) = {
                let mut state = self.inner.borrow_ref_mut(cs);

                if !state.initialised || !state.adc.ready() {
                    return None;
                }

                let sample = state.adc.read();

                if state.current != Some(state.requested) {
                    let requested = state.requested;
                    state.adc.select_channel(requested);
                    state.current = Some(requested);
                }

                state.adc.trigger();

                (sample, state.active)
            };

            // The state borrow is released so the task may stop itself from `service`
            if let Some(task) = active {
                task.service(cs, sample);
            }

            Some(sample)
        })
    }

    /// Make `task` the active task.
    ///
    /// The first call also initialises the converter and the tick timer.
    pub fn start(&self, task: &'a dyn SamplingTask) {
        critical_section::with(|cs| {
            let mut state = self.inner.borrow_ref_mut(cs);

            if !state.initialised {
                // The trigger below starts the first conversion
                state.adc.init();
                state.initialised = true;
                info!("sampler initialised");
            }

            state.requested = task.channel();
            task.arm(cs);

            match state.active.replace(task) {
                Some(previous) if !same_task(previous, task) => {
                    debug!(
                        "channel {} task displaced by channel {} task",
                        previous.channel().id(),
                        task.channel().id()
                    );
                }
                _ => trace!("channel {} task started", task.channel().id()),
            }

            state.adc.trigger();
        })
    }

    /// Clear the active task, but only if it is `task`.
    ///
    /// A task that was already displaced can not evict the task that replaced it. Returns whether
    /// `task` was active.
    pub fn stop(&self, task: &dyn SamplingTask) -> bool {
        critical_section::with(|cs| {
            let mut state = self.inner.borrow_ref_mut(cs);

            match state.active {
                Some(active) if same_task(active, task) => {
                    state.active = None;
                    trace!("channel {} task stopped", task.channel().id());
                    true
                }
                _ => false,
            }
        })
    }

    /// Whether `task` currently receives the samples
    pub fn is_active(&self, task: &dyn SamplingTask) -> bool {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref(cs)
                .active
                .is_some_and(|active| same_task(active, task))
        })
    }

    /// Whether any task currently receives the samples
    pub fn is_busy(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).active.is_some())
    }

    /// The channel the converter is configured for
    pub fn current_channel(&self) -> Option<Channel> {
        critical_section::with(|cs| self.inner.borrow_ref(cs).current)
    }

    /// The channel the next switch will move to
    pub fn requested_channel(&self) -> Channel {
        critical_section::with(|cs| self.inner.borrow_ref(cs).requested)
    }

    pub fn is_initialised(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).initialised)
    }

    /// Run `f` on the converter with the tick interrupt masked
    pub fn access<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs).adc))
    }
}

/// Identity of the task object, ignoring the vtable
fn same_task(a: &dyn SamplingTask, b: &dyn SamplingTask) -> bool {
    core::ptr::addr_eq(a, b)
}
