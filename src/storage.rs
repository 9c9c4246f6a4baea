//! The byte-addressed non-volatile storage the configuration is persisted to.

/// You can persist a [`ConfigurationStore`](crate::store::ConfigurationStore) to anything which
/// implements this trait, typically the microcontroller's EEPROM.
///
/// Errors use the [`embedded_io`] error kinds so existing driver errors can be reused.
pub trait Eeprom: embedded_io::ErrorType {
    /// Fill `buf` with the bytes starting at `offset`.
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `offset`.
    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Eeprom + ?Sized> Eeprom for &mut T {
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, offset, buf)
    }

    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, offset, data)
    }
}
