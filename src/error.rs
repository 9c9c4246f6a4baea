//! Our error types for the pulse generator configuration.

use thiserror::Error;

use crate::address_map::Region;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while validating or looking up a setting.
///
/// None of these are fatal, the worst case is a region reverting to its defaults.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Out of range")]
    OutOfRange,
    #[error("Setting is read-only")]
    ReadOnly,
    #[error("Setting not found")]
    NotFound,
    #[error("Stored region {0:?} is corrupt")]
    StorageCorrupt(Region),
}

/// Error surfaced by [`ConfigurationStore::save`](crate::store::ConfigurationStore::save).
///
/// The in-memory configuration is left untouched when this is returned.
#[derive(Error, Debug)]
pub enum StorageError<I: embedded_io::Error> {
    #[error("EEPROM I/O error")]
    Io(I),
}

impl<I: embedded_io::Error> StorageError<I> {
    /// Kind of the underlying collaborator failure.
    pub fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            StorageError::Io(err) => err.kind(),
        }
    }
}
