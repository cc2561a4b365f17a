//! Advertised node address.

use std::net::UdpSocket;

use roleboot_core::AddressResolver;
use tracing::debug;

/// Probe used to pick the outbound interface. No packet is sent.
pub const DEFAULT_PROBE: &str = "8.8.8.8:80";

/// Resolves the node address from configuration or the routing table.
#[derive(Debug, Clone)]
pub struct LocalAddress {
    fixed: Option<String>,
    probe: String,
}

impl LocalAddress {
    pub fn new(fixed: Option<String>) -> Self {
        Self {
            fixed,
            probe: DEFAULT_PROBE.to_string(),
        }
    }

    /// Route towards `probe` instead of [`DEFAULT_PROBE`].
    pub fn with_probe(mut self, probe: impl Into<String>) -> Self {
        self.probe = probe.into();
        self
    }

    /// Source address the kernel would use to reach the probe.
    fn outbound(&self) -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(&self.probe)?;
        Ok(socket.local_addr()?.ip().to_string())
    }
}

impl AddressResolver for LocalAddress {
    fn resolve(&self) -> Option<String> {
        if let Some(fixed) = self.fixed.as_ref().filter(|a| !a.is_empty()) {
            return Some(fixed.clone());
        }
        match self.outbound() {
            Ok(ip) => Some(ip),
            Err(e) => {
                debug!(probe = %self.probe, error = %e, "could not guess node address");
                None
            }
        }
    }
}
