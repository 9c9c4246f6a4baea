//! This module contains the enumerated setting types and their EEPROM byte values.
//!
//! Each type also knows its SCPI mnemonic, used by [`crate::scpi`] for matching arguments
//! and for formatting query responses.

use strum_macros::EnumIter;

/// Timing reference for all outputs. `:CLOCK:SRC`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[repr(u8)]
pub enum ClockSource {
    /// On-board oscillator, see [`INTERNAL_CLOCK`](crate::clock::INTERNAL_CLOCK).
    #[default]
    Internal = 0x00,
    /// Clock input, nominal frequency set with `:CLOCK:FREQ:EXTernal`.
    External = 0x01,
}

/// Trigger input edge that starts a pulse sequence. `:TRIG:EDGE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[repr(u8)]
pub enum TriggerEdge {
    #[default]
    Rising = 0x00,
    Falling = 0x01,
}

/// LAN mode. `:LAN:MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[repr(u8)]
pub enum LanMode {
    Off = 0x00,
    #[default]
    Dhcp = 0x01,
    Static = 0x02,
}

/// Common behaviour of the enumerated settings.
pub trait Mnemonic: Sized + Copy + PartialEq + 'static {
    /// All values paired with their SCPI mnemonic, e.g. `INTernal`.
    const MNEMONICS: &'static [(Self, &'static str)];

    /// SCPI mnemonic of this value.
    fn mnemonic(self) -> &'static str {
        Self::MNEMONICS
            .iter()
            .find(|(value, _)| *value == self)
            .map(|(_, mnemonic)| *mnemonic)
            .unwrap_or("")
    }
}

impl Mnemonic for ClockSource {
    const MNEMONICS: &'static [(Self, &'static str)] =
        &[(Self::Internal, "INTernal"), (Self::External, "EXTernal")];
}

impl Mnemonic for TriggerEdge {
    const MNEMONICS: &'static [(Self, &'static str)] =
        &[(Self::Rising, "RISing"), (Self::Falling, "FALLing")];
}

impl Mnemonic for LanMode {
    const MNEMONICS: &'static [(Self, &'static str)] = &[
        (Self::Off, "OFF"),
        (Self::Dhcp, "DHCP"),
        (Self::Static, "STATic"),
    ];
}

impl From<ClockSource> for u8 {
    fn from(value: ClockSource) -> Self {
        value as u8
    }
}

impl From<TriggerEdge> for u8 {
    fn from(value: TriggerEdge) -> Self {
        value as u8
    }
}

impl From<LanMode> for u8 {
    fn from(value: LanMode) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for ClockSource {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            v if v == ClockSource::Internal as u8 => Ok(ClockSource::Internal),
            v if v == ClockSource::External as u8 => Ok(ClockSource::External),
            _ => Err(()),
        }
    }
}

impl TryFrom<u8> for TriggerEdge {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            v if v == TriggerEdge::Rising as u8 => Ok(TriggerEdge::Rising),
            v if v == TriggerEdge::Falling as u8 => Ok(TriggerEdge::Falling),
            _ => Err(()),
        }
    }
}

impl TryFrom<u8> for LanMode {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            v if v == LanMode::Off as u8 => Ok(LanMode::Off),
            v if v == LanMode::Dhcp as u8 => Ok(LanMode::Dhcp),
            v if v == LanMode::Static as u8 => Ok(LanMode::Static),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn byte_conversions() {
        // Converting to the EEPROM byte and back must give the same value.
        for source in ClockSource::iter() {
            assert_eq!(ClockSource::try_from(u8::from(source)), Ok(source));
        }
        for edge in TriggerEdge::iter() {
            assert_eq!(TriggerEdge::try_from(u8::from(edge)), Ok(edge));
        }
        for mode in LanMode::iter() {
            assert_eq!(LanMode::try_from(u8::from(mode)), Ok(mode));
        }
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert!(ClockSource::try_from(0x02).is_err());
        assert!(TriggerEdge::try_from(0xFF).is_err());
        assert!(LanMode::try_from(0x03).is_err());
    }

    #[test]
    fn every_value_has_a_mnemonic() {
        for source in ClockSource::iter() {
            assert!(!source.mnemonic().is_empty());
        }
        for edge in TriggerEdge::iter() {
            assert!(!edge.mnemonic().is_empty());
        }
        for mode in LanMode::iter() {
            assert!(!mode.mnemonic().is_empty());
        }
        assert_eq!(LanMode::Static.mnemonic(), "STATic");
    }
}
