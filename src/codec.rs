//! Byte layout of each EEPROM region.
//!
//! All values are little-endian. Settings regions end with a CRC-8 over the rest of the
//! region, counters keep theirs right after the value. Decoding checks the CRC and the
//! range of every field, anything unexpected is reported as
//! [`Error::StorageCorrupt`](crate::error::Error::StorageCorrupt).
//!
//! `ScpiCore`, 76 bytes:
//! ```text
//!  0  clock_src        u8
//!  1  clock_freq_ext   f32
//!  5  trig_edge        u8
//!  6  trig_rearm       u8
//!  7  pulse_delay      [f32; 4]
//! 23  pulse_width      [f32; 4]
//! 39  pulse_period     [f32; 4]
//! 55  pulse_cycles     [u32; 4]
//! 71  pulse_invert     [u8; 4]
//! 75  crc8
//! ```
//!
//! `ScpiLan`, 20 bytes: mode, mac[6], ip[4], gateway[4], subnet[4], crc8.

use crc::{CRC_8_SAE_J1850, Crc};
use heapless::String;

use crate::{
    NCHAN,
    address_map::Region,
    clock::ClockAndTriggerConfig,
    error::{Error, Result},
    lan::NetworkConfig,
    pulse::{PulseChannel, PulseChannelSet},
    types::{ClockSource, LanMode, TriggerEdge},
};

/// Length of the instrument ID region, including the NUL terminator.
pub const ID_LEN: usize = 40;

/// Longest instrument ID that fits in its region.
pub const ID_MAX_LEN: usize = ID_LEN - 1;

/// Value of the commit marker for the current layout.
pub const COMMIT_MARKER: [u8; 4] = [b'P', b'G', b'C', 1];

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SAE_J1850);

/// Sequential writer over a region buffer.
struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn put_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    fn put_f32(&mut self, value: f32) {
        self.put(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    /// Append the CRC of everything written so far.
    fn put_crc(&mut self) {
        let crc = CRC8.checksum(&self.buf[..self.pos]);
        self.put_u8(crc);
    }
}

/// Sequential reader over a region buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    region: Region,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], region: Region) -> Self {
        Self {
            buf,
            pos: 0,
            region,
        }
    }

    fn corrupt(&self) -> Error {
        Error::StorageCorrupt(self.region)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or(Error::StorageCorrupt(self.region))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(self.corrupt()),
        }
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// A duration in seconds, finite and non-negative.
    fn seconds(&mut self) -> Result<f32> {
        let value = self.f32()?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(self.corrupt())
        }
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Check the CRC of everything read so far.
    fn check_crc(&mut self) -> Result<()> {
        let expected = CRC8.checksum(&self.buf[..self.pos]);
        if self.u8()? == expected {
            Ok(())
        } else {
            Err(self.corrupt())
        }
    }

    fn enumerated<T: TryFrom<u8>>(&mut self) -> Result<T> {
        let raw = self.u8()?;
        T::try_from(raw).map_err(|_| self.corrupt())
    }
}

pub fn encode_core(clock: &ClockAndTriggerConfig, pulses: &PulseChannelSet, buf: &mut [u8]) {
    let mut w = Writer::new(buf);
    let channels = pulses.channels();

    w.put_u8(clock.clock_source().into());
    w.put_f32(clock.clock_freq_ext());
    w.put_u8(clock.trigger_edge().into());
    w.put_u8(clock.trigger_rearm() as u8);
    for channel in channels {
        w.put_f32(channel.delay);
    }
    for channel in channels {
        w.put_f32(channel.width);
    }
    for channel in channels {
        w.put_f32(channel.period);
    }
    for channel in channels {
        w.put_u32(channel.cycles);
    }
    for channel in channels {
        w.put_u8(channel.invert as u8);
    }
    w.put_crc();
}

pub fn decode_core(buf: &[u8]) -> Result<(ClockAndTriggerConfig, PulseChannelSet)> {
    let mut r = Reader::new(buf, Region::ScpiCore);

    let mut clock = ClockAndTriggerConfig::default();
    clock.set_clock_source(r.enumerated::<ClockSource>()?);
    let freq = r.f32()?;
    clock.set_clock_freq_ext(freq.into()).map_err(|_| r.corrupt())?;
    clock.set_trigger_edge(r.enumerated::<TriggerEdge>()?);
    clock.set_trigger_rearm(r.bool()?);

    let mut channels: [PulseChannel; NCHAN] = core::array::from_fn(PulseChannel::default_for);
    for channel in channels.iter_mut() {
        channel.delay = r.seconds()?;
    }
    for channel in channels.iter_mut() {
        channel.width = r.seconds()?;
    }
    for channel in channels.iter_mut() {
        channel.period = r.seconds()?;
    }
    for channel in channels.iter_mut() {
        channel.cycles = r.u32()?;
    }
    for channel in channels.iter_mut() {
        channel.invert = r.bool()?;
    }
    r.check_crc()?;

    Ok((clock, PulseChannelSet::new(channels)))
}

pub fn encode_lan(lan: &NetworkConfig, buf: &mut [u8]) {
    let mut w = Writer::new(buf);
    w.put_u8(lan.mode().into());
    w.put(&lan.mac());
    w.put(&lan.ip_static());
    w.put(&lan.gateway_static());
    w.put(&lan.subnet_static());
    w.put_crc();
}

pub fn decode_lan(buf: &[u8]) -> Result<NetworkConfig> {
    let mut r = Reader::new(buf, Region::ScpiLan);
    let mode = r.enumerated::<LanMode>()?;
    let mac = r.take::<6>()?;
    let ip = r.take::<4>()?;
    let gateway = r.take::<4>()?;
    let subnet = r.take::<4>()?;
    r.check_crc()?;
    Ok(NetworkConfig::new(mode, mac, ip, gateway, subnet))
}

/// Printable ASCII only, so the ID can go straight into a reply.
pub fn valid_instrument_id(id: &str) -> bool {
    id.len() <= ID_MAX_LEN && id.bytes().all(|b| (0x20..0x7F).contains(&b))
}

pub fn encode_instrument_id(id: &str, buf: &mut [u8]) {
    buf.fill(0);
    let len = id.len().min(ID_MAX_LEN);
    buf[..len].copy_from_slice(&id.as_bytes()[..len]);
}

pub fn decode_instrument_id(buf: &[u8]) -> Result<String<ID_MAX_LEN>> {
    let corrupt = Error::StorageCorrupt(Region::InstrumentId);
    let end = buf.iter().position(|&b| b == 0).ok_or(corrupt)?;
    let id = core::str::from_utf8(&buf[..end]).map_err(|_| corrupt)?;
    if !valid_instrument_id(id) {
        return Err(corrupt);
    }
    String::try_from(id).map_err(|_| corrupt)
}

pub fn encode_counter(value: u32, buf: &mut [u8]) {
    buf.fill(0);
    let mut w = Writer::new(buf);
    w.put_u32(value);
    w.put_crc();
}

pub fn decode_counter(region: Region, buf: &[u8]) -> Result<u32> {
    let mut r = Reader::new(buf, region);
    let value = r.u32()?;
    r.check_crc()?;
    Ok(value)
}
