//! This crate provides the persistent configuration model for a four channel pulse generator
//! controlled over SCPI.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag.
//!
//! The model is made of:
//! * [`clock::ClockAndTriggerConfig`] - clock source, external clock frequency and trigger policy.
//! * [`pulse::PulseChannelSet`] - delay, width, period, cycles and polarity for outputs A - D.
//! * [`lan::NetworkConfig`] - LAN mode and addressing, applied on the next reboot only.
//! * [`store::ConfigurationStore`] - owns all of the above and persists it to EEPROM.
//!
//! Notes on the SCPI settings:
//! * Exponents in floating-point values are not supported.
//! * Bool values must be `0` or `1`.
//! * `<n>` in pulse settings is `{1, 2, 3, 4}` for outputs `{A, B, C, D}`.
//! * Abbreviations are supported, e.g. `WIDth` matches both `WID` and `WIDTH`.
//! * If `WIDTH > PERIOD` the output is continuous for `DELAY + CYCLES * PERIOD`.
//! * `(DELAY + PERIOD * CYCLES) / FREQ` must be below `4e9`, otherwise the channel is not used.
//! * LAN settings do not take effect until reboot!
//!
//! EEPROM layout, never reordered:
//!
//! | Region                   | Offset | Length |
//! |--------------------------|--------|--------|
//! | Commit marker            | 0      | 4      |
//! | SCPI core settings       | 4      | 76     |
//! | SCPI LAN settings        | 80     | 20     |
//! | Instrument ID            | 100    | 40     |
//! | Reply counter: total     | 140    | 40     |
//! | Reply counter: read-only | 180    | 40     |
//! | Reply counter: bad cmd   | 220    | 40     |
//! | Reply counter: bad arg   | 260    | 40     |
//! | Reboot counter           | 320    | 40     |

#![cfg_attr(feature = "no_std", no_std)]

pub mod address_map;
pub mod clock;
mod codec;
pub mod diagnostics;
pub mod error;
pub mod lan;
pub mod pulse;
pub mod scpi;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
mod mock_eeprom;

/// Number of pulse output channels.
pub const NCHAN: usize = 4;

pub use address_map::Region;
pub use error::{Error, Result, StorageError};
pub use storage::Eeprom;
pub use store::ConfigurationStore;
