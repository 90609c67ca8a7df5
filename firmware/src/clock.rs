use rtic_monotonics::{systick::Systick, Monotonic};
use windsampler_core::wind::{Clock, Instant};

/// Milliseconds since boot from the SysTick monotonic, wrapping at 32 bits
pub struct SystickClock;

impl Clock for SystickClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(Systick::now().ticks() as u32)
    }
}
