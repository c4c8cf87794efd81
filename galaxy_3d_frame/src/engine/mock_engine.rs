/// Mock engine for unit tests (no native engine required)
///
/// Counts every allocation, release, reset and map so tests can observe how
/// a render target drives the engine. Render tasks either finish immediately
/// or stay pending until `MockEngine::complete_all()` is called.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::engine::{
    EngineBackend, FrameBuffer, FrameBufferChannel, FrameBufferDesc, NativeHandle, RenderTask,
};
use crate::error::{Error, Result};

// ============================================================================
// Stats
// ============================================================================

/// Counters shared between the mock engine and every resource it created
#[derive(Default)]
pub struct MockEngineStats {
    pub frame_buffers_created: AtomicUsize,
    pub frame_buffers_released: AtomicUsize,
    pub tasks_submitted: AtomicUsize,
    pub tasks_released: AtomicUsize,
    pub accumulation_resets: AtomicUsize,
    pub maps: AtomicUsize,
    pub unmaps: AtomicUsize,
    pub last_desc: Mutex<Option<FrameBufferDesc>>,
    pub last_render: Mutex<Option<[NativeHandle; 3]>>,
}

impl MockEngineStats {
    pub fn created(&self) -> usize {
        self.frame_buffers_created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.frame_buffers_released.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> usize {
        self.tasks_submitted.load(Ordering::SeqCst)
    }

    pub fn tasks_released(&self) -> usize {
        self.tasks_released.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.accumulation_resets.load(Ordering::SeqCst)
    }

    pub fn maps(&self) -> usize {
        self.maps.load(Ordering::SeqCst)
    }

    pub fn unmaps(&self) -> usize {
        self.unmaps.load(Ordering::SeqCst)
    }

    pub fn last_desc(&self) -> Option<FrameBufferDesc> {
        *self.last_desc.lock().unwrap()
    }

    pub fn last_render(&self) -> Option<[NativeHandle; 3]> {
        *self.last_render.lock().unwrap()
    }
}

// ============================================================================
// Mock RenderTask
// ============================================================================

/// Completion latch shared by a task and the engine that issued it
pub struct TaskGate {
    done: Mutex<bool>,
    signal: Condvar,
}

impl TaskGate {
    fn new(done: bool) -> Self {
        Self { done: Mutex::new(done), signal: Condvar::new() }
    }

    pub fn complete(&self) {
        *self.done.lock().unwrap() = true;
        self.signal.notify_all();
    }

    fn is_done(&self) -> bool {
        *self.done.lock().unwrap()
    }

    fn wait(&self) {
        let mut done = self.done.lock().unwrap();
        while !*done {
            done = self.signal.wait(done).unwrap();
        }
    }
}

pub struct MockRenderTask {
    gate: Arc<TaskGate>,
    stats: Arc<MockEngineStats>,
}

impl RenderTask for MockRenderTask {
    fn wait(&self) {
        self.gate.wait();
    }

    fn is_ready(&self) -> bool {
        self.gate.is_done()
    }

    fn progress(&self) -> f32 {
        if self.gate.is_done() { 1.0 } else { 0.25 }
    }

    fn duration(&self) -> f32 {
        if self.gate.is_done() { 0.016 } else { 0.0 }
    }
}

impl Drop for MockRenderTask {
    fn drop(&mut self) {
        self.stats.tasks_released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock FrameBuffer
// ============================================================================

pub struct MockFrameBuffer {
    desc: FrameBufferDesc,
    // u32 words keep every plane 4-byte aligned for typed views
    planes: FxHashMap<FrameBufferChannel, Vec<u32>>,
    stats: Arc<MockEngineStats>,
}

impl MockFrameBuffer {
    fn new(desc: FrameBufferDesc, stats: Arc<MockEngineStats>) -> Self {
        let pixels = desc.width as usize * desc.height as usize;
        let mut planes = FxHashMap::default();
        for channel in [
            FrameBufferChannel::Color,
            FrameBufferChannel::Depth,
            FrameBufferChannel::Normal,
            FrameBufferChannel::Albedo,
        ] {
            if desc.channels.contains(channel.flag()) {
                let bytes = pixels * channel.pixel_type(desc.format).size_in_bytes().unwrap_or(4);
                planes.insert(channel, vec![0u32; bytes.div_ceil(4)]);
            }
        }
        Self { desc, planes, stats }
    }
}

impl FrameBuffer for MockFrameBuffer {
    fn desc(&self) -> &FrameBufferDesc {
        &self.desc
    }

    fn reset_accumulation(&self) {
        self.stats.accumulation_resets.fetch_add(1, Ordering::SeqCst);
    }

    fn variance(&self) -> f32 {
        0.5
    }

    fn map(&self, channel: FrameBufferChannel) -> Option<NonNull<u8>> {
        let plane = self.planes.get(&channel)?;
        self.stats.maps.fetch_add(1, Ordering::SeqCst);
        NonNull::new(plane.as_ptr() as *mut u8)
    }

    fn unmap(&self, _data: NonNull<u8>) {
        self.stats.unmaps.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for MockFrameBuffer {
    fn drop(&mut self) {
        self.stats.frame_buffers_released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Engine
// ============================================================================

pub struct MockEngine {
    stats: Arc<MockEngineStats>,
    manual_completion: bool,
    pending: Mutex<Vec<Arc<TaskGate>>>,
    fail_next_create: AtomicBool,
    fail_next_render: AtomicBool,
}

impl MockEngine {
    /// Engine whose render tasks finish as soon as they are submitted
    pub fn new() -> Self {
        Self {
            stats: Arc::new(MockEngineStats::default()),
            manual_completion: false,
            pending: Mutex::new(Vec::new()),
            fail_next_create: AtomicBool::new(false),
            fail_next_render: AtomicBool::new(false),
        }
    }

    /// Engine whose render tasks stay pending until `complete_all()`
    pub fn with_manual_completion() -> Self {
        Self { manual_completion: true, ..Self::new() }
    }

    pub fn stats(&self) -> Arc<MockEngineStats> {
        Arc::clone(&self.stats)
    }

    /// Finish every task submitted so far
    pub fn complete_all(&self) {
        for gate in self.pending.lock().unwrap().drain(..) {
            gate.complete();
        }
    }

    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_render(&self) {
        self.fail_next_render.store(true, Ordering::SeqCst);
    }
}

impl EngineBackend for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_frame_buffer(&self, desc: &FrameBufferDesc) -> Result<Arc<dyn FrameBuffer>> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(Error::BackendError("mock frame buffer allocation failed".to_string()));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::BackendError(format!(
                "invalid frame buffer size {}x{}", desc.width, desc.height
            )));
        }

        self.stats.frame_buffers_created.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_desc.lock().unwrap() = Some(*desc);
        Ok(Arc::new(MockFrameBuffer::new(*desc, Arc::clone(&self.stats))))
    }

    fn render_frame(
        &self,
        _frame_buffer: &dyn FrameBuffer,
        renderer: NativeHandle,
        camera: NativeHandle,
        world: NativeHandle,
    ) -> Result<Arc<dyn RenderTask>> {
        if self.fail_next_render.swap(false, Ordering::SeqCst) {
            return Err(Error::BackendError("mock render submission failed".to_string()));
        }

        self.stats.tasks_submitted.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_render.lock().unwrap() = Some([renderer, camera, world]);

        let gate = Arc::new(TaskGate::new(!self.manual_completion));
        if self.manual_completion {
            self.pending.lock().unwrap().push(Arc::clone(&gate));
        }
        Ok(Arc::new(MockRenderTask { gate, stats: Arc::clone(&self.stats) }))
    }
}

// ============================================================================
// Mock scene objects
// ============================================================================

/// Scene object with a fixed native handle
pub struct MockSceneObject {
    pub subtype: &'static str,
    pub handle: NativeHandle,
}

impl MockSceneObject {
    pub fn new(subtype: &'static str, handle: u64) -> Arc<Self> {
        Arc::new(Self { subtype, handle: NativeHandle(handle) })
    }
}

impl crate::param::SceneObject for MockSceneObject {
    fn subtype(&self) -> &str {
        self.subtype
    }

    fn native_handle(&self) -> NativeHandle {
        self.handle
    }
}

#[cfg(test)]
#[path = "mock_engine_tests.rs"]
mod tests;
