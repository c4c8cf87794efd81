/// Device configuration

use crate::notification_pool::NotificationPool;

/// Device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device label used in log messages
    pub name: String,
    /// Worker threads running frame completion callbacks
    pub notification_threads: usize,
    /// Warn whenever a bare channel name ("color", "depth", ...) is used
    pub warn_on_legacy_names: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "Galaxy3D Device".to_string(),
            notification_threads: NotificationPool::default_threads(),
            warn_on_legacy_names: true,
        }
    }
}
