//! Device unique id resolution.

use crate::core::platform::MacSource;
use crate::domain::config::{ConfigStore, KEY_HW_UID};
use tracing::{debug, warn};

/// Id used when no override and no hardware address are available
pub const UID_UNAVAILABLE: &str = "n/a";

/// Resolve the device unique id and persist it under `hwuid`.
///
/// An explicit override is used verbatim. Otherwise the MAC address bytes
/// are hex encoded without separators. Any lookup failure degrades to
/// [`UID_UNAVAILABLE`].
pub fn resolve_uid(
    explicit: Option<&str>,
    mac_source: Option<&dyn MacSource>,
    store: &dyn ConfigStore,
) -> String {
    let uid = match (explicit, mac_source) {
        (Some(uid), _) => uid.to_string(),
        (None, Some(source)) => match source.mac_bytes() {
            Ok(bytes) if !bytes.is_empty() => hex::encode(bytes),
            Ok(_) => {
                warn!("MAC address lookup returned no bytes");
                UID_UNAVAILABLE.to_string()
            }
            Err(e) => {
                warn!("MAC address lookup failed: {}", e);
                UID_UNAVAILABLE.to_string()
            }
        },
        (None, None) => UID_UNAVAILABLE.to_string(),
    };

    if let Err(e) = store.put(KEY_HW_UID, &uid) {
        warn!("Failed to persist {}: {}", KEY_HW_UID, e);
    }
    debug!("Resolved device uid {}", uid);

    uid
}
