/// Device - owns the engine backend and the notification pool
///
/// Render targets are created through a device and dispatched against it.
/// The device also carries the single "global state changed" signal that
/// makes a render restart progressive accumulation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::DeviceConfig;
use crate::engine::EngineBackend;
use crate::error::Result;
use crate::notification_pool::NotificationPool;
use crate::render_target::RenderTarget;
use crate::{frame_err, frame_info};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque device identifier handed to frame completion callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Device
///
/// # Example
///
/// ```ignore
/// let device = Device::new(Arc::new(MyEngine::new()), DeviceConfig::default())?;
/// let target = device.new_render_target();
/// target.set_param("size", ParamValue::UInt32Vec2(UVec2::new(64, 48)))?;
/// target.commit()?;
/// ```
pub struct Device {
    handle: DeviceHandle,
    config: DeviceConfig,
    backend: Arc<dyn EngineBackend>,
    modified: AtomicBool,
    notifier: NotificationPool,
}

impl Device {
    /// Create a device on top of an engine backend
    ///
    /// # Errors
    ///
    /// Returns an error if the notification threads cannot be spawned.
    pub fn new(backend: Arc<dyn EngineBackend>, config: DeviceConfig) -> Result<Self> {
        let notifier = NotificationPool::new(config.notification_threads.max(1))
            .map_err(|e| frame_err!("galaxy3d::Device", "Failed to spawn notification threads: {}", e))?;

        let handle = DeviceHandle(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed));
        frame_info!("galaxy3d::Device", "'{}' created on '{}' backend (handle {})",
            config.name, backend.name(), handle.0);

        Ok(Self {
            handle,
            config,
            backend,
            modified: AtomicBool::new(false),
            notifier,
        })
    }

    /// Opaque handle identifying this device
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn EngineBackend> {
        &self.backend
    }

    /// Create an empty render target (no buffer, no task, no references)
    pub fn new_render_target(&self) -> Arc<RenderTarget> {
        Arc::new(RenderTarget::new(
            Arc::clone(&self.backend),
            self.config.warn_on_legacy_names,
        ))
    }

    /// Whether global state changed since the flag was last cleared
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    /// Record a global state change (scene edits, committed objects, ...)
    pub fn mark_modified(&self) {
        self.modified.store(true, Ordering::Release);
    }

    /// Acknowledge pending global state changes
    pub fn clear_modified(&self) {
        self.modified.store(false, Ordering::Release);
    }

    /// Pool running frame completion callbacks
    pub fn notifier(&self) -> &NotificationPool {
        &self.notifier
    }
}
