/// EngineBackend trait - factory for frame buffers and render tasks

use std::sync::Arc;
use crate::error::Result;
use crate::engine::{FrameBuffer, FrameBufferDesc, RenderTask};

/// Opaque engine-side handle of a scene object (renderer, camera, world)
///
/// Only meaningful to the backend that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// Main engine backend trait
///
/// Implemented by backend-specific engines. Every resource it hands out is
/// released by the backend when the last reference to it is dropped, so
/// callers never release anything explicitly.
pub trait EngineBackend: Send + Sync {
    /// Backend name, used in log messages
    fn name(&self) -> &str;

    /// Allocate a frame buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Resolution, color format and channel set
    ///
    /// # Returns
    ///
    /// A shared pointer to the created frame buffer
    fn create_frame_buffer(&self, desc: &FrameBufferDesc) -> Result<Arc<dyn FrameBuffer>>;

    /// Submit an asynchronous render of `world` seen through `camera`
    ///
    /// Returns immediately with a task that can be waited on or polled.
    fn render_frame(
        &self,
        frame_buffer: &dyn FrameBuffer,
        renderer: NativeHandle,
        camera: NativeHandle,
        world: NativeHandle,
    ) -> Result<Arc<dyn RenderTask>>;
}
