//! SCPI naming of the settings.
//!
//! Resolves paths such as `:PULSe2:WIDth` to a [`Setting`], parses argument strings and
//! formats query responses. Every path token is a mnemonic whose leading uppercase letters
//! form the short form, e.g. `WIDth` accepts `WID` and `WIDTH` in any case but not `WIDT`.

use core::fmt;

use heapless::{String, Vec};

use crate::{
    NCHAN,
    codec::ID_MAX_LEN,
    error::{Error, Result},
    types::{ClockSource, LanMode, Mnemonic, TriggerEdge},
};

/// Channel dependent part of a `:PULSe<n>` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseField {
    Delay,
    Width,
    Period,
    Cycles,
    Invert,
    /// Query only.
    Valid,
    /// Query only.
    Continuous,
}

/// Every setting reachable through a SCPI path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    ClockSource,
    ClockFreqExt,
    /// Effective reference frequency, query only.
    ClockFreq,
    TriggerEdge,
    TriggerRearm,
    /// Pulse setting of the channel with the given index (0 - 3).
    Pulse(usize, PulseField),
    LanMode,
    LanMac,
    LanIpStatic,
    LanGatewayStatic,
    LanSubnetStatic,
    InstrumentId,
    ReplyTotal,
    ReplyReadonly,
    ReplyInvalidCmd,
    ReplyInvalidArg,
    RebootCount,
}

#[derive(Clone, Copy)]
enum Node {
    Fixed(Setting),
    /// Path contains a `#` suffix selecting the channel.
    Pulse(PulseField),
}

/// `#` marks a numeric suffix, 1 when omitted.
const TREE: &[(&[&str], Node)] = &[
    (&["CLOCK", "SRC"], Node::Fixed(Setting::ClockSource)),
    (&["CLOCK", "FREQ", "EXTernal"], Node::Fixed(Setting::ClockFreqExt)),
    (&["CLOCK", "FREQ"], Node::Fixed(Setting::ClockFreq)),
    (&["TRIG", "EDGE"], Node::Fixed(Setting::TriggerEdge)),
    (&["TRIG", "REARM"], Node::Fixed(Setting::TriggerRearm)),
    (&["PULSe#", "DELay"], Node::Pulse(PulseField::Delay)),
    (&["PULSe#", "WIDth"], Node::Pulse(PulseField::Width)),
    (&["PULSe#", "PERiod"], Node::Pulse(PulseField::Period)),
    (&["PULSe#", "CYCles"], Node::Pulse(PulseField::Cycles)),
    (&["PULSe#", "INVert"], Node::Pulse(PulseField::Invert)),
    (&["PULSe#", "VALid"], Node::Pulse(PulseField::Valid)),
    (&["PULSe#", "CONTinuous"], Node::Pulse(PulseField::Continuous)),
    (&["LAN", "MODE"], Node::Fixed(Setting::LanMode)),
    (&["LAN", "MAC"], Node::Fixed(Setting::LanMac)),
    (&["LAN", "IP", "STATic"], Node::Fixed(Setting::LanIpStatic)),
    (&["LAN", "GATEway", "STATic"], Node::Fixed(Setting::LanGatewayStatic)),
    (&["LAN", "SUBnet", "STATic"], Node::Fixed(Setting::LanSubnetStatic)),
    (&["*IDN"], Node::Fixed(Setting::InstrumentId)),
    (&["DIAGnostic", "REPLy", "TOTal"], Node::Fixed(Setting::ReplyTotal)),
    (&["DIAGnostic", "REPLy", "READonly"], Node::Fixed(Setting::ReplyReadonly)),
    (&["DIAGnostic", "REPLy", "INVCmd"], Node::Fixed(Setting::ReplyInvalidCmd)),
    (&["DIAGnostic", "REPLy", "INVArg"], Node::Fixed(Setting::ReplyInvalidArg)),
    (&["DIAGnostic", "REBoot"], Node::Fixed(Setting::RebootCount)),
];

const MAX_DEPTH: usize = 4;

impl Setting {
    /// Resolve a path such as `:PULSe2:WID`. The leading colon is optional.
    pub fn resolve(path: &str) -> Result<Setting> {
        let path = path.strip_prefix(':').unwrap_or(path);
        let mut tokens: Vec<&str, MAX_DEPTH> = Vec::new();
        for token in path.split(':') {
            tokens.push(token).map_err(|_| Error::NotFound)?;
        }

        'tree: for (patterns, node) in TREE {
            if patterns.len() != tokens.len() {
                continue;
            }
            let mut suffix = None;
            for (pattern, token) in patterns.iter().zip(tokens.iter()) {
                match pattern.strip_suffix('#') {
                    Some(pattern) => {
                        let head = token.trim_end_matches(|c: char| c.is_ascii_digit());
                        if !mnemonic_matches(pattern, head) {
                            continue 'tree;
                        }
                        suffix = Some(&token[head.len()..]);
                    }
                    None if mnemonic_matches(pattern, token) => {}
                    None => continue 'tree,
                }
            }
            return match *node {
                Node::Fixed(setting) => Ok(setting),
                Node::Pulse(field) => Ok(Setting::Pulse(channel_index(suffix)?, field)),
            };
        }
        Err(Error::NotFound)
    }

    /// Settings which can only be queried.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Setting::ClockFreq
                | Setting::Pulse(_, PulseField::Valid | PulseField::Continuous)
                | Setting::InstrumentId
                | Setting::ReplyTotal
                | Setting::ReplyReadonly
                | Setting::ReplyInvalidCmd
                | Setting::ReplyInvalidArg
                | Setting::RebootCount
        )
    }
}

/// Map the `<n>` suffix (1 - 4) to a channel index.
fn channel_index(suffix: Option<&str>) -> Result<usize> {
    match suffix {
        None | Some("") => Ok(0),
        Some(digits) => match digits.parse::<usize>() {
            Ok(n) if (1..=NCHAN).contains(&n) => Ok(n - 1),
            _ => Err(Error::OutOfRange),
        },
    }
}

/// Case-insensitive match of a token against the short or long form of a mnemonic.
pub fn mnemonic_matches(mnemonic: &str, token: &str) -> bool {
    token.eq_ignore_ascii_case(short_form(mnemonic)) || token.eq_ignore_ascii_case(mnemonic)
}

/// Short form of a mnemonic, used in query responses.
fn short_form(mnemonic: &str) -> &str {
    let short_len = mnemonic
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(mnemonic.len());
    &mnemonic[..short_len]
}

/// Parse a real number. Exponents, `inf` and `nan` are not supported.
///
/// The result is kept in `f64` so range checks see the value as written. `-0` reads as `0`.
pub fn parse_real(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return Err(Error::InvalidArgument),
        }
    }
    if !seen_digit {
        return Err(Error::InvalidArgument);
    }
    let value: f64 = raw.parse().map_err(|_| Error::InvalidArgument)?;
    if !value.is_finite() {
        return Err(Error::InvalidArgument);
    }
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Parse an unsigned decimal integer.
pub fn parse_integer(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidArgument);
    }
    digits.parse().map_err(|_| Error::InvalidArgument)
}

/// Booleans must be `0` or `1`.
pub fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::InvalidArgument),
    }
}

/// Parse an enumerated argument by its mnemonic, e.g. `EXT` or `external`.
pub fn parse_mnemonic<T: Mnemonic>(raw: &str) -> Result<T> {
    let raw = raw.trim();
    T::MNEMONICS
        .iter()
        .find(|(_, mnemonic)| mnemonic_matches(mnemonic, raw))
        .map(|(value, _)| *value)
        .ok_or(Error::InvalidArgument)
}

/// Parse a MAC address, e.g. `1A:2B:3C:4D:5E:6F`.
pub fn parse_mac(raw: &str) -> Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = raw.trim().split(':');
    for byte in mac.iter_mut() {
        let part = parts.next().ok_or(Error::InvalidArgument)?;
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidArgument);
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| Error::InvalidArgument)?;
    }
    if parts.next().is_some() {
        return Err(Error::InvalidArgument);
    }
    Ok(mac)
}

/// Parse a dotted IPv4 address, e.g. `192.168.0.100`.
pub fn parse_ipv4(raw: &str) -> Result<[u8; 4]> {
    let mut address = [0u8; 4];
    let mut parts = raw.trim().split('.');
    for octet in address.iter_mut() {
        let part = parts.next().ok_or(Error::InvalidArgument)?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidArgument);
        }
        *octet = part.parse().map_err(|_| Error::InvalidArgument)?;
    }
    if parts.next().is_some() {
        return Err(Error::InvalidArgument);
    }
    Ok(address)
}

/// Value of a setting, as returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(f32),
    Frequency(f64),
    Integer(u32),
    Bool(bool),
    ClockSource(ClockSource),
    TriggerEdge(TriggerEdge),
    LanMode(LanMode),
    Mac([u8; 6]),
    Ipv4([u8; 4]),
    Text(String<ID_MAX_LEN>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(value) => write!(f, "{value}"),
            Value::Frequency(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{}", *value as u8),
            Value::ClockSource(source) => f.write_str(short_form(source.mnemonic())),
            Value::TriggerEdge(edge) => f.write_str(short_form(edge.mnemonic())),
            Value::LanMode(mode) => f.write_str(short_form(mode.mnemonic())),
            Value::Mac(mac) => write!(
                f,
                "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
            ),
            Value::Ipv4(ip) => write!(f, "{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
            Value::Text(text) => f.write_str(text),
        }
    }
}
