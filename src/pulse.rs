//! Per-channel pulse timing and the derived validity rule.
//!
//! Validity is never stored, it is a pure function of the channel settings and the clock
//! frequency and is recomputed whenever it is asked for.

use modular_bitfield::prelude::*;

use crate::{
    NCHAN,
    error::{Error, Result},
};

/// `(delay + period * cycles) / clock_freq` must stay below this for a channel to be used.
pub const VALIDITY_LIMIT: f64 = 4e9;

/// Timing of a single output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseChannel {
    /// `:PULSe<n>:DELay` - delay from trigger to the first pulse in seconds.
    pub delay: f32,
    /// `:PULSe<n>:WIDth` - pulse width in seconds.
    pub width: f32,
    /// `:PULSe<n>:PERiod` - time between pulse starts in seconds.
    pub period: f32,
    /// `:PULSe<n>:CYCles` - number of pulses.
    pub cycles: u32,
    /// `:PULSe<n>:INVert` - `false` is active-high, `true` is active-low.
    pub invert: bool,
}

impl PulseChannel {
    /// Power-on settings for the given channel. Only channel 0 (output A) fires.
    pub const fn default_for(index: usize) -> Self {
        PulseChannel {
            delay: 0.0,
            width: 0.01,
            period: 0.02,
            cycles: if index == 0 { 1 } else { 0 },
            invert: false,
        }
    }

    /// Length of the whole sequence, `delay + period * cycles`, in seconds.
    pub fn sequence_duration(&self) -> f64 {
        self.delay as f64 + self.period as f64 * self.cycles as f64
    }

    /// Whether this channel can be programmed with the given reference frequency.
    ///
    /// A channel with no cycles is inert and always valid.
    pub fn is_valid(&self, clock_freq: f64) -> bool {
        if self.cycles == 0 {
            return true;
        }
        // NaN and infinities fail the comparison and so count as invalid.
        self.sequence_duration() / clock_freq < VALIDITY_LIMIT
    }

    /// Width longer than the period drives the output for the whole sequence.
    pub fn is_continuous(&self) -> bool {
        self.width > self.period
    }

    fn apply(&mut self, setting: PulseSetting) -> Result<()> {
        match setting {
            PulseSetting::Delay(seconds) => self.delay = non_negative(seconds)?,
            PulseSetting::Width(seconds) => self.width = non_negative(seconds)?,
            PulseSetting::Period(seconds) => self.period = non_negative(seconds)?,
            PulseSetting::Cycles(cycles) => self.cycles = cycles,
            PulseSetting::Invert(invert) => self.invert = invert,
        }
        Ok(())
    }
}

fn non_negative(seconds: f32) -> Result<f32> {
    if seconds.is_finite() && seconds >= 0.0 {
        // No negative zero.
        Ok(if seconds == 0.0 { 0.0 } else { seconds })
    } else {
        Err(Error::InvalidArgument)
    }
}

/// A single writable field of a [`PulseChannel`] together with its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseSetting {
    Delay(f32),
    Width(f32),
    Period(f32),
    Cycles(u32),
    Invert(bool),
}

/// Outputs A - D which can be handed to the timer hardware.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMask {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub d: bool,
    #[skip]
    __: B4,
}

impl OutputMask {
    /// Whether the output with the given channel index is set.
    pub fn contains(&self, index: usize) -> bool {
        match index {
            0 => self.a(),
            1 => self.b(),
            2 => self.c(),
            3 => self.d(),
            _ => false,
        }
    }

    fn set_output(&mut self, index: usize, enabled: bool) {
        match index {
            0 => self.set_a(enabled),
            1 => self.set_b(enabled),
            2 => self.set_c(enabled),
            3 => self.set_d(enabled),
            _ => {}
        }
    }
}

/// The four pulse channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseChannelSet {
    channels: [PulseChannel; NCHAN],
}

impl Default for PulseChannelSet {
    fn default() -> Self {
        Self {
            channels: core::array::from_fn(PulseChannel::default_for),
        }
    }
}

impl PulseChannelSet {
    pub fn new(channels: [PulseChannel; NCHAN]) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[PulseChannel; NCHAN] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Result<&PulseChannel> {
        self.channels.get(index).ok_or(Error::OutOfRange)
    }

    /// Update one field of one channel.
    ///
    /// Durations must be finite and non-negative. On error nothing is changed.
    pub fn set_field(&mut self, index: usize, setting: PulseSetting) -> Result<()> {
        let channel = self.channels.get_mut(index).ok_or(Error::OutOfRange)?;
        channel.apply(setting)
    }

    pub fn is_valid(&self, index: usize, clock_freq: f64) -> Result<bool> {
        Ok(self.channel(index)?.is_valid(clock_freq))
    }

    pub fn is_continuous(&self, index: usize) -> Result<bool> {
        Ok(self.channel(index)?.is_continuous())
    }

    pub fn sequence_duration(&self, index: usize) -> Result<f64> {
        Ok(self.channel(index)?.sequence_duration())
    }

    /// Mask of the channels that pass the validity check.
    pub fn valid_outputs(&self, clock_freq: f64) -> OutputMask {
        let mut mask = OutputMask::new();
        for (index, channel) in self.channels.iter().enumerate() {
            mask.set_output(index, channel.is_valid(clock_freq));
        }
        mask
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_only_a_fires() {
        let mut set = PulseChannelSet::default();
        set.set_field(2, PulseSetting::Cycles(7)).unwrap();
        set.reset_to_defaults();

        for index in 0..NCHAN {
            assert!(set.is_valid(index, 1e6).unwrap());
            let channel = set.channel(index).unwrap();
            assert_eq!(channel.cycles > 0, index == 0);
            assert_eq!(channel.delay, 0.0);
            assert_eq!(channel.width, 0.01);
            assert_eq!(channel.period, 0.02);
            assert!(!channel.invert);
        }
    }

    #[test]
    fn channel_index_out_of_range() {
        let mut set = PulseChannelSet::default();
        assert_eq!(set.set_field(NCHAN, PulseSetting::Delay(1.0)), Err(Error::OutOfRange));
        assert_eq!(set.is_valid(NCHAN, 1e6), Err(Error::OutOfRange));
        assert_eq!(set.is_continuous(7), Err(Error::OutOfRange));
    }

    #[test]
    fn negative_and_non_finite_durations_are_rejected() {
        let mut set = PulseChannelSet::default();
        for setting in [
            PulseSetting::Delay(-1.0),
            PulseSetting::Width(-0.001),
            PulseSetting::Period(f32::NAN),
            PulseSetting::Period(f32::INFINITY),
        ] {
            assert_eq!(set.set_field(1, setting), Err(Error::InvalidArgument));
        }
        // Nothing was applied.
        assert_eq!(*set.channel(1).unwrap(), PulseChannel::default_for(1));
    }

    #[test]
    fn validity_boundary() {
        let mut set = PulseChannelSet::default();
        set.set_field(0, PulseSetting::Period(2.0)).unwrap();

        // 2.0 * 2e9 / 1.0 == 4e9 is already too long.
        set.set_field(0, PulseSetting::Cycles(2_000_000_000)).unwrap();
        assert!(!set.is_valid(0, 1.0).unwrap());

        // Just below the limit.
        set.set_field(0, PulseSetting::Period(1.0)).unwrap();
        set.set_field(0, PulseSetting::Cycles(3_999_999_999)).unwrap();
        assert!(set.is_valid(0, 1.0).unwrap());

        // The delay counts towards the limit too.
        set.set_field(0, PulseSetting::Delay(1.0)).unwrap();
        assert!(!set.is_valid(0, 1.0).unwrap());

        // A faster reference brings it back into range.
        assert!(set.is_valid(0, 2.0).unwrap());
    }

    #[test]
    fn large_products_do_not_overflow() {
        let mut set = PulseChannelSet::default();
        set.set_field(3, PulseSetting::Period(f32::MAX)).unwrap();
        set.set_field(3, PulseSetting::Cycles(u32::MAX)).unwrap();
        assert!(!set.is_valid(3, 16e6).unwrap());
    }

    #[test]
    fn zero_cycles_is_always_valid() {
        let mut set = PulseChannelSet::default();
        set.set_field(1, PulseSetting::Delay(1e30)).unwrap();
        set.set_field(1, PulseSetting::Period(1e30)).unwrap();
        set.set_field(1, PulseSetting::Cycles(0)).unwrap();
        assert!(set.is_valid(1, 1.0).unwrap());
    }

    #[test]
    fn zero_period_is_valid() {
        let mut set = PulseChannelSet::default();
        set.set_field(0, PulseSetting::Period(0.0)).unwrap();
        set.set_field(0, PulseSetting::Cycles(1000)).unwrap();
        assert!(set.is_valid(0, 1e6).unwrap());
        assert_eq!(set.sequence_duration(0).unwrap(), 0.0);
    }

    #[test]
    fn continuous_ignores_polarity() {
        let mut set = PulseChannelSet::default();
        assert!(!set.is_continuous(0).unwrap());

        set.set_field(0, PulseSetting::Width(0.05)).unwrap();
        assert!(set.is_continuous(0).unwrap());

        set.set_field(0, PulseSetting::Invert(true)).unwrap();
        assert!(set.is_continuous(0).unwrap());

        // Equal width and period is still pulsed.
        set.set_field(0, PulseSetting::Width(0.02)).unwrap();
        assert!(!set.is_continuous(0).unwrap());
    }

    #[test]
    fn valid_output_mask() {
        let mut set = PulseChannelSet::default();
        set.set_field(2, PulseSetting::Period(10.0)).unwrap();
        set.set_field(2, PulseSetting::Cycles(1_000_000_000)).unwrap();

        let mask = set.valid_outputs(1.0);
        assert!(mask.a());
        assert!(mask.b());
        assert!(!mask.c());
        assert!(mask.d());
        assert!(!mask.contains(2));
        assert!(!mask.contains(NCHAN));
    }
}
