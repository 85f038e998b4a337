//! Network interface sampler.
//!
//! This sampler reports cumulative octet counters and link state only;
//! turning the counters into rates is the session's job, because the
//! previous counters may come from an in-memory snapshot (continuous
//! mode) or from the persisted state of an earlier run (one-shot mode).
//! The `in_bytes_per_sec` / `out_bytes_per_sec` fields of the returned
//! stats are always zero here.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::parse_net_dev;
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::InterfaceStats;

pub struct NetworkSampler<F: FileSystem> {
    fs: F,
    net_dev_path: PathBuf,
    sys_net_path: PathBuf,
    /// Restrict collection to one interface when set.
    interface: Option<String>,
    initialized: bool,
}

impl<F: FileSystem> NetworkSampler<F> {
    pub fn new(fs: F, proc_path: &str, sys_path: &str, interface: Option<String>) -> Self {
        Self {
            net_dev_path: Path::new(proc_path).join("net/dev"),
            sys_net_path: Path::new(sys_path).join("class/net"),
            fs,
            interface,
            initialized: false,
        }
    }

    /// Verifies the provider is readable and takes the baseline pass.
    pub fn initialize(&mut self) -> Result<(), CollectError> {
        self.fs.read_to_string(&self.net_dev_path)?;
        self.initialized = true;
        Ok(())
    }

    /// Reads current counters and link state for each interface.
    ///
    /// Interfaces are returned in name order so output and persisted
    /// state are stable across samples.
    pub fn sample(&mut self) -> Result<Vec<InterfaceStats>, CollectError> {
        if !self.initialized {
            return Err(CollectError::NotInitialized("network"));
        }

        let content = self.fs.read_to_string(&self.net_dev_path)?;
        let mut interfaces: Vec<InterfaceStats> = parse_net_dev(&content)?
            .into_iter()
            .filter(|c| {
                self.interface
                    .as_deref()
                    .is_none_or(|wanted| c.name == wanted)
            })
            .map(|c| InterfaceStats {
                is_connected: self.is_up(&c.name),
                link_speed_bits_per_sec: self.link_speed(&c.name),
                in_bytes_per_sec: 0.0,
                out_bytes_per_sec: 0.0,
                total_in_octets: c.rx_bytes,
                total_out_octets: c.tx_bytes,
                in_errors: Some(c.rx_errs),
                out_errors: Some(c.tx_errs),
                name: c.name,
            })
            .collect();

        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(interfaces)
    }

    /// Forgets the initialization. Idempotent.
    pub fn cleanup(&mut self) {
        self.initialized = false;
    }

    fn is_up(&self, name: &str) -> bool {
        let path = self.sys_net_path.join(name).join("operstate");
        match self.fs.read_to_string(&path) {
            Ok(state) => state.trim() == "up",
            Err(_) => false,
        }
    }

    /// Negotiated speed in bits/s. Drivers report -1 (or nothing at all)
    /// when the link is down or speed is not applicable.
    fn link_speed(&self, name: &str) -> u64 {
        let path = self.sys_net_path.join(name).join("speed");
        match self.fs.read_to_string(&path) {
            Ok(content) => match content.trim().parse::<i64>() {
                Ok(mbps) if mbps > 0 => mbps as u64 * 1_000_000,
                _ => 0,
            },
            Err(_) => 0,
        }
    }

}

/// Picks the interface to highlight in single-line output: the one
/// carrying the most cumulative traffic, with ties going to wired over
/// wireless, then name order.
pub fn primary_interface(interfaces: &[InterfaceStats]) -> Option<&InterfaceStats> {
    interfaces.iter().min_by_key(|i| {
        (
            std::cmp::Reverse(i.total_in_octets + i.total_out_octets),
            is_wireless_name(&i.name),
            &i.name,
        )
    })
}

/// Kernel predictable-name prefixes for wireless devices, plus the
/// classic wlanN.
fn is_wireless_name(name: &str) -> bool {
    name.starts_with("wl") || name.starts_with("ww")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn network_counters_and_link_state() {
        let mut sampler = NetworkSampler::new(MockFs::typical_host(), "/proc", "/sys", None);
        sampler.initialize().unwrap();
        let interfaces = sampler.sample().unwrap();

        assert_eq!(interfaces.len(), 2);
        let eth0 = &interfaces[0];
        assert_eq!(eth0.name, "eth0");
        assert!(eth0.is_connected);
        assert_eq!(eth0.link_speed_bits_per_sec, 1_000_000_000);
        assert_eq!(eth0.total_in_octets, 1_000_000);
        assert_eq!(eth0.total_out_octets, 2_000_000);
        assert_eq!(eth0.in_errors, Some(2));
        assert_eq!(eth0.in_bytes_per_sec, 0.0);

        let wlan0 = &interfaces[1];
        assert!(!wlan0.is_connected);
        assert_eq!(wlan0.link_speed_bits_per_sec, 0);
    }

    #[test]
    fn network_interface_filter() {
        let mut sampler = NetworkSampler::new(
            MockFs::typical_host(),
            "/proc",
            "/sys",
            Some("wlan0".to_string()),
        );
        sampler.initialize().unwrap();
        let interfaces = sampler.sample().unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].name, "wlan0");
    }

    #[test]
    fn network_primary_is_highest_traffic() {
        let mut sampler = NetworkSampler::new(MockFs::typical_host(), "/proc", "/sys", None);
        sampler.initialize().unwrap();
        let interfaces = sampler.sample().unwrap();
        assert_eq!(primary_interface(&interfaces).unwrap().name, "eth0");
    }

    #[test]
    fn network_primary_tie_prefers_wired() {
        let mut sampler = NetworkSampler::new(MockFs::typical_host(), "/proc", "/sys", None);
        sampler.initialize().unwrap();
        let mut interfaces = sampler.sample().unwrap();
        // Same traffic on both.
        for i in &mut interfaces {
            i.total_in_octets = 100;
            i.total_out_octets = 100;
        }
        assert_eq!(primary_interface(&interfaces).unwrap().name, "eth0");
    }

    #[test]
    fn network_sample_requires_initialize() {
        let mut sampler = NetworkSampler::new(MockFs::typical_host(), "/proc", "/sys", None);
        assert!(matches!(
            sampler.sample(),
            Err(CollectError::NotInitialized("network"))
        ));
        sampler.initialize().unwrap();
        sampler.cleanup();
        sampler.cleanup();
        assert!(sampler.sample().is_err());
    }
}
