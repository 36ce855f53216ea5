use crate::core::memory::HeapMonitor;
use crate::core::platform::{MacSource, Platform};
use crate::domain::error::{SockShellError, SockShellResult};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Exit status used when the process cannot re-execute itself
pub const RESET_EXIT_CODE: i32 = 75;

/// Default heap budget for constrained targets, in kilobytes
pub const DEFAULT_HEAP_BUDGET_KB: usize = 512 * 1024;

/// Memory constrained device with reclaim and reset primitives
pub struct ConstrainedPlatform {
    heap: HeapMonitor,
}

impl ConstrainedPlatform {
    pub fn new(heap_budget_kb: usize) -> Self {
        Self {
            heap: HeapMonitor::new(heap_budget_kb),
        }
    }

    pub fn heap(&self) -> &HeapMonitor {
        &self.heap
    }
}

impl Default for ConstrainedPlatform {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_BUDGET_KB)
    }
}

impl Platform for ConstrainedPlatform {
    fn name(&self) -> &str {
        "constrained"
    }

    fn is_constrained(&self) -> bool {
        true
    }

    fn reclaim_memory(&self) {
        let status = self.heap.reclaim();
        info!("Memory reclaim done, status {:?}", status);
    }

    fn free_memory(&self) -> Option<usize> {
        Some(self.heap.free_bytes())
    }

    fn hard_reset(&self) -> SockShellResult<()> {
        warn!("Hard reset requested");
        restart_process()
    }
}

/// Replace the running image with a fresh copy of itself
#[cfg(unix)]
fn restart_process() -> SockShellResult<()> {
    use std::os::unix::process::CommandExt;

    let exe = std::env::current_exe()
        .map_err(|e| SockShellError::Reset(format!("cannot locate executable: {}", e)))?;
    let err = std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .exec();

    Err(SockShellError::Reset(format!("exec {} failed: {}", exe.display(), err)))
}

#[cfg(not(unix))]
fn restart_process() -> SockShellResult<()> {
    std::process::exit(RESET_EXIT_CODE)
}

/// MAC address read from the kernel's network class directory
pub struct SysfsMacSource {
    root: PathBuf,
    interface: Option<String>,
}

impl SysfsMacSource {
    pub fn new(interface: Option<String>) -> Self {
        Self {
            root: PathBuf::from("/sys/class/net"),
            interface,
        }
    }

    /// Read from a different class directory, used by tests
    pub fn with_root(root: impl Into<PathBuf>, interface: Option<String>) -> Self {
        Self {
            root: root.into(),
            interface,
        }
    }

    fn pick_interface(&self) -> SockShellResult<String> {
        if let Some(interface) = &self.interface {
            return Ok(interface.clone());
        }

        let mut names: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        names.sort();

        names.into_iter().next().ok_or_else(|| SockShellError::Config {
            message: format!("no network interface under {}", self.root.display()),
        })
    }
}

impl MacSource for SysfsMacSource {
    fn mac_bytes(&self) -> SockShellResult<Vec<u8>> {
        let interface = self.pick_interface()?;
        let raw = fs::read_to_string(self.root.join(&interface).join("address"))?;
        let digits: String = raw.trim().split(':').collect();

        hex::decode(&digits)
            .map_err(|e| SockShellError::InvalidInput(format!("bad MAC {:?}: {}", raw.trim(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_class(entries: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, address) in entries {
            let iface = dir.path().join(name);
            fs::create_dir_all(&iface).unwrap();
            fs::write(iface.join("address"), format!("{}\n", address)).unwrap();
        }
        dir
    }

    #[test]
    fn test_mac_from_named_interface() {
        let dir = fake_class(&[("eth0", "aa:1b:2c:00:11:ff")]);
        let source = SysfsMacSource::with_root(dir.path(), Some("eth0".to_string()));

        assert_eq!(source.mac_bytes().unwrap(), vec![0xaa, 0x1b, 0x2c, 0x00, 0x11, 0xff]);
    }

    #[test]
    fn test_mac_skips_loopback() {
        let dir = fake_class(&[("lo", "00:00:00:00:00:00"), ("wlan0", "02:03:04:05:06:07")]);
        let source = SysfsMacSource::with_root(dir.path(), None);

        assert_eq!(source.mac_bytes().unwrap(), vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_mac_missing_interface() {
        let dir = fake_class(&[("lo", "00:00:00:00:00:00")]);
        let source = SysfsMacSource::with_root(dir.path(), None);

        assert!(source.mac_bytes().is_err());
    }

    #[test]
    fn test_mac_garbage() {
        let dir = fake_class(&[("eth0", "zz:zz")]);
        let source = SysfsMacSource::with_root(dir.path(), Some("eth0".to_string()));

        assert!(matches!(source.mac_bytes(), Err(SockShellError::InvalidInput(_))));
    }

    #[test]
    fn test_constrained_platform_memory() {
        let platform = ConstrainedPlatform::new(1024 * 1024);
        assert!(platform.is_constrained());
        assert!(platform.free_memory().is_some());

        platform.reclaim_memory();
        assert_eq!(platform.heap().stats().reclaim_passes, 1);
    }
}
