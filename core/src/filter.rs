use heapless::HistoryBuffer;

/// Post-processing applied to the settled samples of a sampling task.
///
/// `process_sample` runs in interrupt context, so implementations must not allocate, block or
/// loop over anything larger than their own fixed-size state.
pub trait Filter: Send {
    fn process_sample(&mut self, sample: u8);

    /// Forget everything seen so far
    fn reset(&mut self) {}
}

/// Filters whose result can be read back by the owner of the task
pub trait SampleOutput {
    /// The current result, `None` until enough samples were processed
    fn output(&self) -> Option<u8>;
}

/// No post-processing. Samples are dropped after the settle count.
impl Filter for () {
    fn process_sample(&mut self, _sample: u8) {}
}

/// Keeps the most recent sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LatestSample {
    value: Option<u8>,
}

impl LatestSample {
    pub const fn new() -> Self {
        Self { value: None }
    }
}

impl Filter for LatestSample {
    fn process_sample(&mut self, sample: u8) {
        self.value = Some(sample);
    }

    fn reset(&mut self) {
        self.value = None;
    }
}

impl SampleOutput for LatestSample {
    fn output(&self) -> Option<u8> {
        self.value
    }
}

/// Mean over the last `N` samples
pub struct MovingAverage<const N: usize> {
    window: HistoryBuffer<u8, N>,
    sum: u32,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            window: HistoryBuffer::new(),
            sum: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.window.len() == self.window.capacity()
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Filter for MovingAverage<N> {
    fn process_sample(&mut self, sample: u8) {
        if self.is_full() {
            // Oldest entry is the one about to be overwritten
            let oldest = self.window.oldest_ordered().next().copied().unwrap_or(0);
            self.sum -= u32::from(oldest);
        }
        self.window.write(sample);
        self.sum += u32::from(sample);
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0;
    }
}

impl<const N: usize> SampleOutput for MovingAverage<N> {
    fn output(&self) -> Option<u8> {
        if !self.is_full() || N == 0 {
            return None;
        }

        let n = N as u32;
        Some(((self.sum + n / 2) / n) as u8)
    }
}
