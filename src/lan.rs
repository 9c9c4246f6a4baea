//! Staged LAN settings.
//!
//! Changes here only take effect after a reboot. The store keeps the settings read at boot
//! so that a pending change can be reported, see
//! [`ConfigurationStore::pending_differs_from_active`](crate::store::ConfigurationStore::pending_differs_from_active).

use crate::types::LanMode;

/// `:LAN:*` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// `:LAN:MODE` - OFF, DHCP, or STATic.
    mode: LanMode,
    /// `:LAN:MAC` - MAC address, e.g. `1A:2B:3C:4D:5E:6F`.
    mac: [u8; 6],
    /// `:LAN:IP:STATic` - static IP address, e.g. `192.168.0.100`.
    ip_static: [u8; 4],
    /// `:LAN:GATEway:STATic` - static gateway address.
    gateway_static: [u8; 4],
    /// `:LAN:SUBnet:STATic` - static subnet mask.
    subnet_static: [u8; 4],
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: LanMode::Dhcp,
            // Locally administered, unicast.
            mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0x01],
            ip_static: [192, 168, 0, 100],
            gateway_static: [192, 168, 0, 1],
            subnet_static: [255, 255, 255, 0],
        }
    }
}

impl NetworkConfig {
    pub fn new(
        mode: LanMode,
        mac: [u8; 6],
        ip_static: [u8; 4],
        gateway_static: [u8; 4],
        subnet_static: [u8; 4],
    ) -> Self {
        Self {
            mode,
            mac,
            ip_static,
            gateway_static,
            subnet_static,
        }
    }

    pub fn mode(&self) -> LanMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LanMode) {
        self.mode = mode;
    }

    pub fn mac(&self) -> [u8; 6] {
        self.mac
    }

    pub fn set_mac(&mut self, mac: [u8; 6]) {
        self.mac = mac;
    }

    /// Only used in [`LanMode::Static`].
    pub fn ip_static(&self) -> [u8; 4] {
        self.ip_static
    }

    pub fn set_ip_static(&mut self, ip: [u8; 4]) {
        self.ip_static = ip;
    }

    /// Only used in [`LanMode::Static`].
    pub fn gateway_static(&self) -> [u8; 4] {
        self.gateway_static
    }

    pub fn set_gateway_static(&mut self, gateway: [u8; 4]) {
        self.gateway_static = gateway;
    }

    /// Only used in [`LanMode::Static`].
    pub fn subnet_static(&self) -> [u8; 4] {
        self.subnet_static
    }

    pub fn set_subnet_static(&mut self, subnet: [u8; 4]) {
        self.subnet_static = subnet;
    }

    /// Whether applying these settings needs a reboot when `active` is what the network
    /// stack was brought up with.
    pub fn differs_from(&self, active: &NetworkConfig) -> bool {
        self != active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_accept_any_bytes() {
        let mut lan = NetworkConfig::default();
        lan.set_mode(LanMode::Static);
        lan.set_mac([0xFF; 6]);
        lan.set_ip_static([0, 0, 0, 0]);
        lan.set_gateway_static([255, 255, 255, 255]);
        lan.set_subnet_static([1, 2, 3, 4]);

        assert_eq!(lan.mode(), LanMode::Static);
        assert_eq!(lan.mac(), [0xFF; 6]);
        assert_eq!(lan.ip_static(), [0, 0, 0, 0]);
        assert_eq!(lan.gateway_static(), [255, 255, 255, 255]);
        assert_eq!(lan.subnet_static(), [1, 2, 3, 4]);
    }

    #[test]
    fn pending_change_detection() {
        let active = NetworkConfig::default();
        let mut pending = active;
        assert!(!pending.differs_from(&active));

        pending.set_ip_static([10, 0, 0, 2]);
        assert!(pending.differs_from(&active));

        pending.set_ip_static(active.ip_static());
        assert!(!pending.differs_from(&active));
    }
}
