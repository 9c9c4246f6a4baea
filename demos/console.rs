use std::{
    env,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
};

use inquire::Text;
use pulsegen_config::{ConfigurationStore, Eeprom, NCHAN, address_map::STORAGE_SIZE};

// Backing file used when none is given on the command line.
const DEFAULT_EEPROM_FILE: &str = "pulsegen-eeprom.bin";

/// A file standing in for the microcontroller's EEPROM.
pub struct FileEeprom(File);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::UnexpectedEof => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for FileEeprom {
    type Error = IoError;
}

impl Eeprom for FileEeprom {
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.0
            .seek(SeekFrom::Start(offset.into()))
            .and_then(|_| self.0.read_exact(buf))
            .map_err(IoError)
    }

    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error> {
        self.0
            .seek(SeekFrom::Start(offset.into()))
            .and_then(|_| self.0.write_all(data))
            .and_then(|_| self.0.flush())
            .map_err(IoError)
    }
}

impl FileEeprom {
    /// Open the backing file, creating an erased one if it does not exist.
    fn open(path: &str) -> std::io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if file.metadata()?.len() < STORAGE_SIZE as u64 {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&[0xFF; STORAGE_SIZE])?;
        }
        Ok(Self(file))
    }
}

fn print_programs(store: &ConfigurationStore) {
    println!("{:#?}", store.timing());
    for index in 0..NCHAN {
        match store.channel_program(index) {
            Ok(program) => println!("Output {}: {:?}", index + 1, program),
            Err(err) => println!("Output {}: {err}", index + 1),
        }
    }
}

fn main() {
    // Set RUST_LOG=debug to see region writes
    env_logger::init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_EEPROM_FILE.to_string());
    println!("Using EEPROM file: {}", path);

    let mut eeprom = FileEeprom::open(&path).expect("Failed to open EEPROM file");

    // Load the configuration, counting this run as a reboot
    let mut store = ConfigurationStore::boot(&mut eeprom);
    println!("Instrument: {}", store.instrument_id());
    println!("Reboots: {}", store.diagnostics().reboot_count);
    print_programs(&store);

    println!("\nEnter SCPI commands, *SAV to commit, SHOW to list outputs, empty line to quit.");
    loop {
        let line = match Text::new(">").prompt() {
            Ok(line) => line,
            Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        if line.eq_ignore_ascii_case("*SAV") {
            match store.save(&mut eeprom) {
                Ok(()) => println!("Saved"),
                Err(err) => println!("Save failed: {err} ({:?})", err.kind()),
            }
            continue;
        }
        if line.eq_ignore_ascii_case("SHOW") {
            print_programs(&store);
            continue;
        }

        match store.dispatch(line) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(err) => println!("Error: {err}"),
        }
        if store.pending_differs_from_active() {
            println!("LAN settings take effect after *SAV and a reboot");
        }
    }
}
