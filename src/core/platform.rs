use crate::domain::error::{SockShellError, SockShellResult};
use tracing::debug;

/// Device capabilities used by recovery and reconnection
pub trait Platform: Send + Sync {
    /// Short platform label for logs
    fn name(&self) -> &str;

    /// Whether memory reclamation and hard reset are available
    fn is_constrained(&self) -> bool;

    /// Best-effort memory reclamation
    fn reclaim_memory(&self);

    /// Free memory in bytes, if the platform can tell
    fn free_memory(&self) -> Option<usize>;

    /// Reset the device. Returns only if the reset could not be issued.
    fn hard_reset(&self) -> SockShellResult<()>;
}

/// Hardware address lookup
pub trait MacSource: Send + Sync {
    fn mac_bytes(&self) -> SockShellResult<Vec<u8>>;
}

/// Host platform without reclaim or reset primitives
#[derive(Debug, Default, Clone)]
pub struct GenericPlatform;

impl Platform for GenericPlatform {
    fn name(&self) -> &str {
        "generic"
    }

    fn is_constrained(&self) -> bool {
        false
    }

    fn reclaim_memory(&self) {
        debug!("memory reclaim skipped on generic platform");
    }

    fn free_memory(&self) -> Option<usize> {
        None
    }

    fn hard_reset(&self) -> SockShellResult<()> {
        Err(SockShellError::Reset(
            "hard reset is not available on the generic platform".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_platform() {
        let platform = GenericPlatform;
        assert!(!platform.is_constrained());
        assert_eq!(platform.free_memory(), None);
        platform.reclaim_memory();
        assert!(matches!(platform.hard_reset(), Err(SockShellError::Reset(_))));
    }
}
