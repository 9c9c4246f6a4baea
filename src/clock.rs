//! Instrument wide clock and trigger settings.

use fugit::HertzU32;

use crate::{
    error::{Error, Result},
    types::{ClockSource, TriggerEdge},
};

/// Frequency of the on-board timing reference.
pub const INTERNAL_CLOCK: HertzU32 = HertzU32::MHz(16);

/// Highest external clock frequency the timer input can follow, in Hz.
pub const MAX_CLOCK_FREQ_EXT_HZ: f64 = 5e6;

/// Clock source, external clock frequency and trigger policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockAndTriggerConfig {
    /// `:CLOCK:SRC` - INTernal or EXTernal.
    clock_src: ClockSource,
    /// `:CLOCK:FREQ:EXTernal` - ideal external frequency in Hz, max 5e6.
    clock_freq_ext: f32,
    /// `:TRIG:EDGE` - RISing or FALLing.
    trig_edge: TriggerEdge,
    /// `:TRIG:REARM` - rearm after the pulse sequence and on reboot.
    trig_rearm: bool,
}

impl Default for ClockAndTriggerConfig {
    fn default() -> Self {
        Self {
            clock_src: ClockSource::Internal,
            clock_freq_ext: 1e6,
            trig_edge: TriggerEdge::Rising,
            trig_rearm: true,
        }
    }
}

impl ClockAndTriggerConfig {
    pub fn clock_source(&self) -> ClockSource {
        self.clock_src
    }

    pub fn set_clock_source(&mut self, source: ClockSource) {
        self.clock_src = source;
    }

    /// Nominal external clock frequency in Hz. Only used when the source is external.
    pub fn clock_freq_ext(&self) -> f32 {
        self.clock_freq_ext
    }

    /// Set the nominal external clock frequency in Hz.
    ///
    /// Must be in `(0, 5e6]`. Values outside are rejected, not clamped. The range is checked
    /// before the value is narrowed to the stored `f32`.
    pub fn set_clock_freq_ext(&mut self, hz: f64) -> Result<()> {
        if !(hz.is_finite() && hz > 0.0 && hz <= MAX_CLOCK_FREQ_EXT_HZ) {
            return Err(Error::InvalidArgument);
        }
        let narrowed = hz as f32;
        if narrowed <= 0.0 {
            return Err(Error::InvalidArgument);
        }
        self.clock_freq_ext = narrowed;
        Ok(())
    }

    pub fn trigger_edge(&self) -> TriggerEdge {
        self.trig_edge
    }

    pub fn set_trigger_edge(&mut self, edge: TriggerEdge) {
        self.trig_edge = edge;
    }

    pub fn trigger_rearm(&self) -> bool {
        self.trig_rearm
    }

    pub fn set_trigger_rearm(&mut self, rearm: bool) {
        self.trig_rearm = rearm;
    }

    /// Frequency of the reference actually in use, in Hz.
    pub fn clock_freq_effective(&self) -> f64 {
        match self.clock_src {
            ClockSource::Internal => INTERNAL_CLOCK.to_Hz() as f64,
            ClockSource::External => self.clock_freq_ext as f64,
        }
    }
}
