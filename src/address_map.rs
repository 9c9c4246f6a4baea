//! This module is used to define the EEPROM regions of the pulse generator.
//!
//! Offsets are fixed forever once shipped. Moving a region corrupts the settings saved by
//! earlier firmware, so new regions may only be appended after [`Region::DiagReplyReboot`].

use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

/// Named EEPROM regions, in address order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, EnumCountMacro)]
#[repr(u8)]
pub enum Region {
    /// Commit marker, written last by every save.
    CommitMarker,
    /// Clock, trigger and pulse settings.
    ScpiCore,
    /// LAN settings.
    ScpiLan,
    /// `*IDN?` response, NUL terminated.
    InstrumentId,
    /// Count of all replies.
    DiagReplyTotal,
    /// Count of replies to writes of read-only settings.
    DiagReplyReadonly,
    /// Count of replies to unknown commands.
    DiagReplyInvalidCmd,
    /// Count of replies to bad arguments.
    DiagReplyInvalidArg,
    /// Count of reboots.
    DiagReplyReboot,
}

/// Byte range of a region.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegionSpan {
    pub offset: u16,
    pub len: u16,
}

impl RegionSpan {
    const fn new(offset: u16, len: u16) -> Self {
        Self { offset, len }
    }

    pub const fn end(&self) -> u16 {
        self.offset + self.len
    }
}

/// Offset and length of every region, indexed by [`Region`].
///
/// `260 + 40 .. 320` is unused.
pub const ADDRESS_MAP: [RegionSpan; Region::COUNT] = [
    RegionSpan::new(0, 4),
    RegionSpan::new(4, 76),
    RegionSpan::new(80, 20),
    RegionSpan::new(100, 40),
    RegionSpan::new(140, 40),
    RegionSpan::new(180, 40),
    RegionSpan::new(220, 40),
    RegionSpan::new(260, 40),
    RegionSpan::new(320, 40),
];

/// Smallest EEPROM that can hold every region.
pub const STORAGE_SIZE: usize = ADDRESS_MAP[Region::COUNT - 1].end() as usize;

/// Longest region, used to size scratch buffers.
pub(crate) const MAX_REGION_LEN: usize = 76;

const fn regions_are_ordered(map: &[RegionSpan]) -> bool {
    let mut i = 1;
    while i < map.len() {
        if map[i - 1].end() > map[i].offset || map[i].len == 0 {
            return false;
        }
        i += 1;
    }
    true
}

const fn longest_region(map: &[RegionSpan]) -> usize {
    let mut i = 0;
    let mut longest = 0;
    while i < map.len() {
        if map[i].len as usize > longest {
            longest = map[i].len as usize;
        }
        i += 1;
    }
    longest
}

const _: () = assert!(regions_are_ordered(&ADDRESS_MAP), "EEPROM regions overlap");
const _: () = assert!(longest_region(&ADDRESS_MAP) == MAX_REGION_LEN);

impl Region {
    pub const fn span(self) -> RegionSpan {
        ADDRESS_MAP[self as usize]
    }

    pub const fn offset(self) -> u16 {
        self.span().offset
    }

    #[allow(clippy::len_without_is_empty)]
    pub const fn len(self) -> usize {
        self.span().len as usize
    }
}
