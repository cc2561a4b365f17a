//! Distribution detection.

use std::fmt;
use std::sync::Arc;

use roleboot_core::{DescriptorError, DescriptorResult, NodeDescriptor, PlatformDetector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlatformConfig;
use crate::node::DistroNode;

/// Supported Kubernetes distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    K3s,
    K0s,
}

impl Distro {
    pub const ALL: [Distro; 2] = [Distro::K3s, Distro::K0s];

    pub fn name(&self) -> &'static str {
        match self {
            Distro::K3s => "k3s",
            Distro::K0s => "k0s",
        }
    }

    /// Absolute install locations probed, in order.
    pub fn binary_candidates(&self) -> &'static [&'static str] {
        match self {
            Distro::K3s => &["/usr/bin/k3s", "/usr/local/bin/k3s"],
            Distro::K0s => &["/usr/bin/k0s", "/usr/local/bin/k0s"],
        }
    }

    /// Service unit supervising the worker.
    pub fn worker_unit(&self) -> &'static str {
        match self {
            Distro::K3s => "k3s-agent",
            Distro::K0s => "k0sworker",
        }
    }

    /// Key under the `cluster` namespace holding the worker join token.
    pub fn token_key(&self) -> &'static str {
        match self {
            Distro::K3s => "node-token",
            Distro::K0s => "worker-token",
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the distribution installed on this node.
#[derive(Debug, Clone)]
pub struct DistroDetector {
    config: Arc<PlatformConfig>,
}

impl DistroDetector {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configured distro, else the first one with an installed binary.
    pub fn detect_distro(&self) -> Option<Distro> {
        if let Some(distro) = self.config.distro {
            return Some(distro);
        }
        Distro::ALL.into_iter().find(|d| {
            d.binary_candidates()
                .iter()
                .any(|bin| self.config.path(bin).is_file())
        })
    }
}

impl PlatformDetector for DistroDetector {
    fn detect(&self) -> DescriptorResult<Box<dyn NodeDescriptor>> {
        let distro = self
            .detect_distro()
            .ok_or(DescriptorError::UnsupportedPlatform)?;
        debug!(%distro, "platform detected");
        Ok(Box::new(DistroNode::new(distro, self.config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(root: &std::path::Path, bin: &str) {
        let path = root.join(bin.trim_start_matches('/'));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn detector(root: &std::path::Path) -> DistroDetector {
        DistroDetector::new(PlatformConfig {
            root: root.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn detects_k3s_from_binary() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "/usr/local/bin/k3s");

        assert_eq!(detector(dir.path()).detect_distro(), Some(Distro::K3s));
        let node = detector(dir.path()).detect().unwrap();
        assert_eq!(node.platform(), "k3s");
    }

    #[test]
    fn detects_k0s_from_binary() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "/usr/bin/k0s");

        assert_eq!(detector(dir.path()).detect_distro(), Some(Distro::K0s));
    }

    #[test]
    fn nothing_installed_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let err = detector(dir.path()).detect().err().unwrap();
        assert!(matches!(err, DescriptorError::UnsupportedPlatform));
    }

    #[test]
    fn pinned_distro_wins() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "/usr/bin/k3s");

        let detector = DistroDetector::new(PlatformConfig {
            root: dir.path().to_path_buf(),
            distro: Some(Distro::K0s),
            ..Default::default()
        });
        assert_eq!(detector.detect_distro(), Some(Distro::K0s));
    }
}
