//! We use this mocking module in unit tests to emulate the EEPROM.

use thiserror::Error;

use crate::{address_map::Region, storage::Eeprom};

/// Size of the emulated EEPROM, same as the ATmega328P.
pub const MOCK_EEPROM_SIZE: usize = 1024;

/// Our mock type used to emulate an EEPROM.
pub struct MockEeprom {
    /// Emulated memory, erased state is `0xFF`.
    memory: [u8; MOCK_EEPROM_SIZE],
    /// Number of write calls that succeed before every further write fails.
    write_budget: Option<usize>,
    /// Number of successful write calls.
    writes: usize,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MockEepromError {
    /// Access past the end of the memory.
    #[error("Access past the end of the EEPROM")]
    OutOfBounds,
    /// Generic simulated error for testing
    #[error("Simulated EEPROM error")]
    SimulatedError,
}

impl embedded_io::Error for MockEepromError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockEepromError::OutOfBounds => embedded_io::ErrorKind::InvalidInput,
            MockEepromError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockEeprom {
    type Error = MockEepromError;
}

impl Eeprom for MockEeprom {
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        if self.should_error_on_read {
            return Err(MockEepromError::SimulatedError);
        }
        let start = offset as usize;
        let bytes = self
            .memory
            .get(start..start + buf.len())
            .ok_or(MockEepromError::OutOfBounds)?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error> {
        if self.write_budget.is_some_and(|budget| self.writes >= budget) {
            return Err(MockEepromError::SimulatedError);
        }
        let start = offset as usize;
        let bytes = self
            .memory
            .get_mut(start..start + data.len())
            .ok_or(MockEepromError::OutOfBounds)?;
        bytes.copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

impl MockEeprom {
    /// Create a new, erased, MockEeprom.
    pub fn new() -> Self {
        Self {
            memory: [0xFF; MOCK_EEPROM_SIZE],
            write_budget: None,
            writes: 0,
            should_error_on_read: false,
        }
    }

    /// Bytes currently stored in a region.
    pub fn region(&self, region: Region) -> &[u8] {
        let start = region.offset() as usize;
        &self.memory[start..start + region.len()]
    }

    /// Flip every bit of a region.
    pub fn corrupt_region(&mut self, region: Region) {
        let start = region.offset() as usize;
        for byte in &mut self.memory[start..start + region.len()] {
            *byte = !*byte;
        }
    }

    /// Allow only `budget` more write calls, emulating power loss part way through a save.
    pub fn fail_after_writes(&mut self, budget: usize) {
        self.write_budget = Some(self.writes + budget);
    }

    /// Configure whether every write should fail with an error.
    pub fn set_write_error(&mut self, should_error: bool) {
        self.write_budget = should_error.then_some(self.writes);
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Number of successful write calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mock_eeprom_is_erased() {
        let mut mock = MockEeprom::new();
        let mut buf = [0u8; 8];
        mock.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 8]);
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn test_write_then_read() {
        let mut mock = MockEeprom::new();
        mock.write(100, b"PG4").unwrap();

        let mut buf = [0u8; 3];
        mock.read(100, &mut buf).unwrap();
        assert_eq!(&buf, b"PG4");
        assert_eq!(mock.write_count(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut mock = MockEeprom::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            mock.read(MOCK_EEPROM_SIZE as u16 - 2, &mut buf),
            Err(MockEepromError::OutOfBounds)
        );
        assert_eq!(
            mock.write(MOCK_EEPROM_SIZE as u16, &[0]),
            Err(MockEepromError::OutOfBounds)
        );
    }

    #[test]
    fn test_write_budget() {
        let mut mock = MockEeprom::new();
        mock.fail_after_writes(2);
        assert!(mock.write(0, &[1]).is_ok());
        assert!(mock.write(1, &[2]).is_ok());
        assert_eq!(mock.write(2, &[3]), Err(MockEepromError::SimulatedError));
        assert_eq!(mock.region(Region::CommitMarker), &[1, 2, 0xFF, 0xFF]);
    }

    #[test]
    fn test_error_kinds_and_messages() {
        use embedded_io::Error as _;

        assert_eq!(MockEepromError::OutOfBounds.kind(), embedded_io::ErrorKind::InvalidInput);
        assert_eq!(MockEepromError::SimulatedError.kind(), embedded_io::ErrorKind::Other);
        assert_eq!(MockEepromError::SimulatedError.to_string(), "Simulated EEPROM error");
    }

    #[test]
    fn test_error_flags() {
        let mut mock = MockEeprom::new();
        mock.set_write_error(true);
        assert!(mock.write(0, &[0]).is_err());
        mock.set_write_error(false);
        assert!(mock.write(0, &[0]).is_ok());

        mock.set_read_error(true);
        let mut buf = [0u8; 1];
        assert_eq!(mock.read(0, &mut buf), Err(MockEepromError::SimulatedError));
    }
}
