use core::sync::atomic::{AtomicU32, Ordering};

use windsampler_core::PulseCounter;

static CUP_PULSES: AtomicU32 = AtomicU32::new(0);

/// Count one closing of the anemometer reed switch. Call this from the edge interrupt.
pub fn count_pulse() {
    CUP_PULSES.fetch_add(1, Ordering::Relaxed);
}

/// Read side of the pulse count kept by [`count_pulse`]
pub struct EdgeCounter;

impl PulseCounter for EdgeCounter {
    fn reset(&mut self) {
        CUP_PULSES.store(0, Ordering::Relaxed);
    }

    fn count(&self) -> u32 {
        CUP_PULSES.load(Ordering::Relaxed)
    }
}
