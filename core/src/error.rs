use core::fmt;

/// A channel id outside of the eight converter inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel(pub u8);

impl fmt::Display for InvalidChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADC channel {} is out of range (0..=7)", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidChannel {}
