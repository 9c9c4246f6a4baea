//! The complete, persistable instrument configuration.
//!
//! A [`ConfigurationStore`] is created once at startup with [`ConfigurationStore::boot`] (or
//! [`ConfigurationStore::load`]), mutated as commands arrive and only written back to the
//! EEPROM when the user commits with [`ConfigurationStore::save`]. Setting a field never
//! touches the EEPROM, which bounds write wear and lets several fields change together.

use embedded_io::Error as _;
use heapless::String;
use log::{debug, info, warn};
use strum::IntoEnumIterator;

use crate::{
    address_map::{MAX_REGION_LEN, Region},
    clock::ClockAndTriggerConfig,
    codec::{self, COMMIT_MARKER, ID_MAX_LEN},
    diagnostics::{Diagnostics, Reply},
    error::{Error, Result, StorageError},
    lan::NetworkConfig,
    pulse::{OutputMask, PulseChannelSet, PulseSetting},
    scpi::{self, PulseField, Setting, Value},
    storage::Eeprom,
    types::{ClockSource, TriggerEdge},
};

/// `*IDN?` response until one is programmed.
pub const DEFAULT_INSTRUMENT_ID: &str = "PULSEGEN,PG-4,0,1.0";

/// Instrument wide values handed to the timer hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentTiming {
    pub clock_src: ClockSource,
    /// Reference frequency in use, in Hz.
    pub clock_freq: f64,
    pub trig_edge: TriggerEdge,
    pub trig_rearm: bool,
}

/// Per-channel values handed to the timer hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelProgram {
    pub delay: f32,
    pub width: f32,
    pub period: f32,
    pub cycles: u32,
    pub invert: bool,
    /// Invalid channels must not be programmed at all.
    pub valid: bool,
    /// Output held active for `delay + period * cycles`.
    pub continuous: bool,
}

/// Owner of all configuration state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationStore {
    clock: ClockAndTriggerConfig,
    pulses: PulseChannelSet,
    /// LAN settings to use from the next boot.
    lan: NetworkConfig,
    /// LAN settings read at boot, i.e. what the network stack is running with.
    lan_active: NetworkConfig,
    instrument_id: String<ID_MAX_LEN>,
    diagnostics: Diagnostics,
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        let mut store = Self {
            clock: ClockAndTriggerConfig::default(),
            pulses: PulseChannelSet::default(),
            lan: NetworkConfig::default(),
            lan_active: NetworkConfig::default(),
            instrument_id: String::new(),
            diagnostics: Diagnostics::default(),
        };
        store.reset_region(Region::InstrumentId);
        store
    }
}

impl ConfigurationStore {
    /// Load the configuration from the EEPROM.
    ///
    /// Without a valid commit marker every region gets its defaults. Otherwise each region is
    /// decoded on its own and a corrupt region falls back to its defaults without affecting
    /// the others.
    pub fn load<E: Eeprom>(eeprom: &mut E) -> Self {
        let mut store = Self::default();

        let mut marker = [0u8; 4];
        match eeprom.read(Region::CommitMarker.offset(), &mut marker) {
            Ok(()) if marker == COMMIT_MARKER => {}
            Ok(()) => {
                info!("No committed configuration found, using defaults");
                return store;
            }
            Err(err) => {
                warn!("Reading commit marker failed ({:?}), using defaults", err.kind());
                return store;
            }
        }

        for region in Region::iter().filter(|r| *r != Region::CommitMarker) {
            if let Err(err) = store.load_region(eeprom, region) {
                warn!("{err}, using defaults");
                store.reset_region(region);
            }
        }
        store.lan_active = store.lan;
        store
    }

    /// Load the configuration and count the reboot.
    ///
    /// The reboot counter is written back straight away, nothing else is. Until the first
    /// [`save`](Self::save) commits the EEPROM, [`load`](Self::load) ignores that counter,
    /// so every boot of an uncommitted EEPROM reports a `reboot_count` of 1.
    pub fn boot<E: Eeprom>(eeprom: &mut E) -> Self {
        let mut store = Self::load(eeprom);
        store.diagnostics.record_reboot();
        if let Err(err) = store.save_region(eeprom, Region::DiagReplyReboot) {
            warn!("Saving reboot count failed ({:?})", err.kind());
        }
        store
    }

    fn load_region<E: Eeprom>(&mut self, eeprom: &mut E, region: Region) -> Result<()> {
        let mut buf = [0u8; MAX_REGION_LEN];
        let buf = &mut buf[..region.len()];
        eeprom
            .read(region.offset(), buf)
            .map_err(|_| Error::StorageCorrupt(region))?;

        match region {
            Region::CommitMarker => {}
            Region::ScpiCore => {
                let (clock, pulses) = codec::decode_core(buf)?;
                self.clock = clock;
                self.pulses = pulses;
            }
            Region::ScpiLan => self.lan = codec::decode_lan(buf)?,
            Region::InstrumentId => self.instrument_id = codec::decode_instrument_id(buf)?,
            Region::DiagReplyTotal
            | Region::DiagReplyReadonly
            | Region::DiagReplyInvalidCmd
            | Region::DiagReplyInvalidArg
            | Region::DiagReplyReboot => {
                let value = codec::decode_counter(region, buf)?;
                if let Some(counter) = self.counter_mut(region) {
                    *counter = value;
                }
            }
        }
        Ok(())
    }

    /// Write the whole configuration to the EEPROM.
    ///
    /// The commit marker is cleared first and written last, so a save interrupted by power
    /// loss reads back as "nothing committed". On error the in-memory configuration is kept
    /// as it is.
    pub fn save<E: Eeprom>(&self, eeprom: &mut E) -> Result<(), StorageError<E::Error>> {
        eeprom
            .write(Region::CommitMarker.offset(), &[0u8; 4])
            .map_err(StorageError::Io)?;
        for region in Region::iter().filter(|r| *r != Region::CommitMarker) {
            self.save_region(eeprom, region)?;
        }
        eeprom
            .write(Region::CommitMarker.offset(), &COMMIT_MARKER)
            .map_err(StorageError::Io)?;
        info!("Configuration committed");
        Ok(())
    }

    /// Write a single region, leaving the commit marker alone.
    pub fn save_region<E: Eeprom>(
        &self,
        eeprom: &mut E,
        region: Region,
    ) -> Result<(), StorageError<E::Error>> {
        let mut buf = [0u8; MAX_REGION_LEN];
        let buf = &mut buf[..region.len()];
        match region {
            Region::CommitMarker => buf.copy_from_slice(&COMMIT_MARKER),
            Region::ScpiCore => codec::encode_core(&self.clock, &self.pulses, buf),
            Region::ScpiLan => codec::encode_lan(&self.lan, buf),
            Region::InstrumentId => codec::encode_instrument_id(&self.instrument_id, buf),
            Region::DiagReplyTotal
            | Region::DiagReplyReadonly
            | Region::DiagReplyInvalidCmd
            | Region::DiagReplyInvalidArg
            | Region::DiagReplyReboot => {
                codec::encode_counter(self.counter(region).unwrap_or_default(), buf)
            }
        }
        debug!("Writing {:?} at {}", region, region.offset());
        eeprom.write(region.offset(), buf).map_err(StorageError::Io)
    }

    /// Restore the defaults of one region. Other regions are left alone.
    pub fn reset_region(&mut self, region: Region) {
        match region {
            Region::CommitMarker => {}
            Region::ScpiCore => {
                self.clock = ClockAndTriggerConfig::default();
                self.pulses.reset_to_defaults();
            }
            Region::ScpiLan => self.lan = NetworkConfig::default(),
            Region::InstrumentId => {
                self.instrument_id.clear();
                // The default always fits.
                let _ = self.instrument_id.push_str(DEFAULT_INSTRUMENT_ID);
            }
            Region::DiagReplyTotal
            | Region::DiagReplyReadonly
            | Region::DiagReplyInvalidCmd
            | Region::DiagReplyInvalidArg
            | Region::DiagReplyReboot => {
                if let Some(counter) = self.counter_mut(region) {
                    *counter = 0;
                }
            }
        }
    }

    /// `*RST` - default clock, trigger and pulse settings.
    pub fn reset_to_defaults(&mut self) {
        self.reset_region(Region::ScpiCore);
    }

    fn counter(&self, region: Region) -> Option<u32> {
        let diag = &self.diagnostics;
        match region {
            Region::DiagReplyTotal => Some(diag.reply_total),
            Region::DiagReplyReadonly => Some(diag.reply_readonly),
            Region::DiagReplyInvalidCmd => Some(diag.reply_invalid_cmd),
            Region::DiagReplyInvalidArg => Some(diag.reply_invalid_arg),
            Region::DiagReplyReboot => Some(diag.reboot_count),
            _ => None,
        }
    }

    fn counter_mut(&mut self, region: Region) -> Option<&mut u32> {
        let diag = &mut self.diagnostics;
        match region {
            Region::DiagReplyTotal => Some(&mut diag.reply_total),
            Region::DiagReplyReadonly => Some(&mut diag.reply_readonly),
            Region::DiagReplyInvalidCmd => Some(&mut diag.reply_invalid_cmd),
            Region::DiagReplyInvalidArg => Some(&mut diag.reply_invalid_arg),
            Region::DiagReplyReboot => Some(&mut diag.reboot_count),
            _ => None,
        }
    }

    pub fn clock(&self) -> &ClockAndTriggerConfig {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut ClockAndTriggerConfig {
        &mut self.clock
    }

    pub fn pulses(&self) -> &PulseChannelSet {
        &self.pulses
    }

    pub fn pulses_mut(&mut self) -> &mut PulseChannelSet {
        &mut self.pulses
    }

    /// Pending LAN settings.
    pub fn lan(&self) -> &NetworkConfig {
        &self.lan
    }

    pub fn lan_mut(&mut self) -> &mut NetworkConfig {
        &mut self.lan
    }

    /// LAN settings the network stack was started with.
    pub fn lan_active(&self) -> &NetworkConfig {
        &self.lan_active
    }

    /// Whether a reboot is needed for the LAN settings to take effect.
    pub fn pending_differs_from_active(&self) -> bool {
        self.lan.differs_from(&self.lan_active)
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Program the `*IDN?` response. Printable ASCII, at most 39 characters.
    pub fn set_instrument_id(&mut self, id: &str) -> Result<()> {
        if !codec::valid_instrument_id(id) {
            return Err(Error::InvalidArgument);
        }
        self.instrument_id = String::try_from(id).map_err(|_| Error::InvalidArgument)?;
        Ok(())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Clock and trigger settings for the timer hardware.
    pub fn timing(&self) -> InstrumentTiming {
        InstrumentTiming {
            clock_src: self.clock.clock_source(),
            clock_freq: self.clock.clock_freq_effective(),
            trig_edge: self.clock.trigger_edge(),
            trig_rearm: self.clock.trigger_rearm(),
        }
    }

    /// Settings of one channel for the timer hardware, derived fresh on every call.
    pub fn channel_program(&self, index: usize) -> Result<ChannelProgram> {
        let channel = self.pulses.channel(index)?;
        Ok(ChannelProgram {
            delay: channel.delay,
            width: channel.width,
            period: channel.period,
            cycles: channel.cycles,
            invert: channel.invert,
            valid: channel.is_valid(self.clock.clock_freq_effective()),
            continuous: channel.is_continuous(),
        })
    }

    /// Outputs which may be programmed with the current clock.
    pub fn enabled_outputs(&self) -> OutputMask {
        self.pulses.valid_outputs(self.clock.clock_freq_effective())
    }

    /// Query a setting by its SCPI path, e.g. `:PULSe2:WIDth`.
    pub fn get_field(&self, path: &str) -> Result<Value> {
        let value = match Setting::resolve(path)? {
            Setting::ClockSource => Value::ClockSource(self.clock.clock_source()),
            Setting::ClockFreqExt => Value::Real(self.clock.clock_freq_ext()),
            Setting::ClockFreq => Value::Frequency(self.clock.clock_freq_effective()),
            Setting::TriggerEdge => Value::TriggerEdge(self.clock.trigger_edge()),
            Setting::TriggerRearm => Value::Bool(self.clock.trigger_rearm()),
            Setting::Pulse(index, field) => {
                let channel = self.pulses.channel(index)?;
                match field {
                    PulseField::Delay => Value::Real(channel.delay),
                    PulseField::Width => Value::Real(channel.width),
                    PulseField::Period => Value::Real(channel.period),
                    PulseField::Cycles => Value::Integer(channel.cycles),
                    PulseField::Invert => Value::Bool(channel.invert),
                    PulseField::Valid => {
                        Value::Bool(channel.is_valid(self.clock.clock_freq_effective()))
                    }
                    PulseField::Continuous => Value::Bool(channel.is_continuous()),
                }
            }
            Setting::LanMode => Value::LanMode(self.lan.mode()),
            Setting::LanMac => Value::Mac(self.lan.mac()),
            Setting::LanIpStatic => Value::Ipv4(self.lan.ip_static()),
            Setting::LanGatewayStatic => Value::Ipv4(self.lan.gateway_static()),
            Setting::LanSubnetStatic => Value::Ipv4(self.lan.subnet_static()),
            Setting::InstrumentId => Value::Text(self.instrument_id.clone()),
            Setting::ReplyTotal => Value::Integer(self.diagnostics.reply_total),
            Setting::ReplyReadonly => Value::Integer(self.diagnostics.reply_readonly),
            Setting::ReplyInvalidCmd => Value::Integer(self.diagnostics.reply_invalid_cmd),
            Setting::ReplyInvalidArg => Value::Integer(self.diagnostics.reply_invalid_arg),
            Setting::RebootCount => Value::Integer(self.diagnostics.reboot_count),
        };
        Ok(value)
    }

    /// Change a setting by its SCPI path. Nothing is changed if an error is returned.
    pub fn set_field(&mut self, path: &str, raw: &str) -> Result<()> {
        let setting = Setting::resolve(path)?;
        if setting.is_read_only() {
            return Err(Error::ReadOnly);
        }
        match setting {
            Setting::ClockSource => self.clock.set_clock_source(scpi::parse_mnemonic(raw)?),
            Setting::ClockFreqExt => self.clock.set_clock_freq_ext(scpi::parse_real(raw)?)?,
            Setting::TriggerEdge => self.clock.set_trigger_edge(scpi::parse_mnemonic(raw)?),
            Setting::TriggerRearm => self.clock.set_trigger_rearm(scpi::parse_bool(raw)?),
            Setting::Pulse(index, field) => {
                let setting = match field {
                    PulseField::Delay => PulseSetting::Delay(parse_seconds(raw)?),
                    PulseField::Width => PulseSetting::Width(parse_seconds(raw)?),
                    PulseField::Period => PulseSetting::Period(parse_seconds(raw)?),
                    PulseField::Cycles => PulseSetting::Cycles(scpi::parse_integer(raw)?),
                    PulseField::Invert => PulseSetting::Invert(scpi::parse_bool(raw)?),
                    PulseField::Valid | PulseField::Continuous => return Err(Error::ReadOnly),
                };
                self.pulses.set_field(index, setting)?;
            }
            Setting::LanMode => self.lan.set_mode(scpi::parse_mnemonic(raw)?),
            Setting::LanMac => self.lan.set_mac(scpi::parse_mac(raw)?),
            Setting::LanIpStatic => self.lan.set_ip_static(scpi::parse_ipv4(raw)?),
            Setting::LanGatewayStatic => self.lan.set_gateway_static(scpi::parse_ipv4(raw)?),
            Setting::LanSubnetStatic => self.lan.set_subnet_static(scpi::parse_ipv4(raw)?),
            Setting::ClockFreq
            | Setting::InstrumentId
            | Setting::ReplyTotal
            | Setting::ReplyReadonly
            | Setting::ReplyInvalidCmd
            | Setting::ReplyInvalidArg
            | Setting::RebootCount => return Err(Error::ReadOnly),
        }
        Ok(())
    }

    /// Handle one command line such as `:PULSe2:WID 0.5` or `:PULSe2:VAL?`.
    ///
    /// `*RST` restores the default clock and pulse settings. Queries return their value.
    /// Every reply is counted in the diagnostics.
    pub fn dispatch(&mut self, line: &str) -> Result<Option<Value>> {
        let result = self.execute(line);
        self.diagnostics.record(Reply::from_result(&result));
        result
    }

    fn execute(&mut self, line: &str) -> Result<Option<Value>> {
        let line = line.trim();
        let (header, argument) = match line.split_once(char::is_whitespace) {
            Some((header, argument)) => (header, argument.trim()),
            None => (line, ""),
        };

        if let Some(path) = header.strip_suffix('?') {
            if !argument.is_empty() {
                return Err(Error::InvalidArgument);
            }
            return self.get_field(path).map(Some);
        }
        if header.eq_ignore_ascii_case("*RST") {
            if !argument.is_empty() {
                return Err(Error::InvalidArgument);
            }
            self.reset_to_defaults();
            return Ok(None);
        }
        // Resolve before looking at the argument so unknown paths report NotFound.
        let setting = Setting::resolve(header)?;
        if setting.is_read_only() {
            return Err(Error::ReadOnly);
        }
        if argument.is_empty() {
            return Err(Error::InvalidArgument);
        }
        self.set_field(header, argument).map(|()| None)
    }
}

/// A duration argument, checked for sign before narrowing to `f32`.
fn parse_seconds(raw: &str) -> Result<f32> {
    let seconds = scpi::parse_real(raw)?;
    if seconds < 0.0 {
        return Err(Error::InvalidArgument);
    }
    Ok(seconds as f32)
}
