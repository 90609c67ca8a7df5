use fugit::HertzU32;

use crate::error::InvalidChannel;

/// Rate of the timer interrupt that drives the converter.
///
/// Every tick completes at most one conversion, so this is also the highest rate at which any
/// single sampling task can receive samples.
pub const TICK_RATE: HertzU32 = HertzU32::from_raw(5_000);

/// Samples per second delivered to the active task
pub const SAMPLE_RATE: HertzU32 = TICK_RATE;

/// One of the eight analog inputs that can be routed into the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    pub const COUNT: u8 = 8;
    pub const FIRST: Self = Self(0);

    pub const fn new(id: u8) -> Option<Self> {
        if id < Self::COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn id(self) -> u8 {
        self.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id).ok_or(InvalidChannel(id))
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

/// Register level access to the shared converter and its tick timer.
///
/// None of these may block: they are called from the tick interrupt. All state is plain register
/// state that the scheduler polls, so nothing here can fail.
pub trait AdcDriver: Send {
    /// Configure the tick timer and the converter. Called once, before the first `trigger`.
    fn init(&mut self);

    /// Start one conversion on the currently selected channel.
    ///
    /// Must not be called while a conversion is still running.
    fn trigger(&mut self);

    /// Whether the last triggered conversion has finished
    fn ready(&self) -> bool;

    /// The 8 bit result of the last finished conversion. Only valid while `ready` is true.
    fn read(&mut self) -> u8;

    /// Route `channel` into the converter for the next `trigger`.
    ///
    /// Reference and alignment are fixed so the result is always the top 8 bits.
    fn select_channel(&mut self, channel: Channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_range() {
        assert_eq!(Channel::new(0).map(Channel::id), Some(0));
        assert_eq!(Channel::new(7).map(Channel::id), Some(7));
        assert_eq!(Channel::new(8), None);
        assert_eq!(Channel::try_from(9), Err(InvalidChannel(9)));
        assert_eq!(u8::from(Channel::try_from(3).unwrap()), 3);
    }

    #[test]
    fn sample_rate_follows_tick_rate() {
        assert_eq!(SAMPLE_RATE.to_Hz(), 5_000);
        assert_eq!(SAMPLE_RATE, TICK_RATE);
    }
}
