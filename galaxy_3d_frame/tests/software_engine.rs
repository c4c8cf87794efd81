//! Software engine used by the integration tests
//!
//! Renders on a background thread by filling the color plane with a value
//! derived from the world handle, and tracks accumulated frames so variance
//! and accumulation resets are observable.

#![allow(dead_code)]

use galaxy_3d_frame::galaxy3d::engine::{
    EngineBackend, FrameBuffer, FrameBufferChannel, FrameBufferChannels, FrameBufferDesc,
    FrameBufferFormat, NativeHandle, RenderTask,
};
use galaxy_3d_frame::galaxy3d::{Error, Result, SceneObject};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// FRAME BUFFER
// ============================================================================

pub struct SoftwareFrameBuffer {
    desc: FrameBufferDesc,
    color: Box<[AtomicU32]>,
    depth: Option<Box<[AtomicU32]>>,
    accumulated: AtomicU32,
    mapped: AtomicUsize,
}

fn plane(pixels: usize, words_per_pixel: usize) -> Box<[AtomicU32]> {
    (0..pixels * words_per_pixel).map(|_| AtomicU32::new(0)).collect()
}

impl SoftwareFrameBuffer {
    fn new(desc: FrameBufferDesc) -> Self {
        let pixels = desc.width as usize * desc.height as usize;
        let color_words = match desc.format {
            FrameBufferFormat::Rgba32F => 4,
            FrameBufferFormat::Rgba8 | FrameBufferFormat::Srgba => 1,
        };
        Self {
            desc,
            color: plane(pixels, color_words),
            depth: desc.channels.contains(FrameBufferChannels::DEPTH).then(|| plane(pixels, 1)),
            accumulated: AtomicU32::new(0),
            mapped: AtomicUsize::new(0),
        }
    }

    fn fill(&self, world: NativeHandle) {
        let shade = (world.0 & 0xff) as u8;
        match self.desc.format {
            FrameBufferFormat::Rgba32F => {
                let value = f32::from(shade) / 255.0;
                for (i, word) in self.color.iter().enumerate() {
                    let component = if i % 4 == 3 { 1.0 } else { value };
                    word.store(component.to_bits(), Ordering::Relaxed);
                }
            }
            _ => {
                let pixel = u32::from_ne_bytes([shade, shade, shade, 255]);
                for word in self.color.iter() {
                    word.store(pixel, Ordering::Relaxed);
                }
            }
        }
        if let Some(depth) = &self.depth {
            for word in depth.iter() {
                word.store(1.0f32.to_bits(), Ordering::Relaxed);
            }
        }
        self.accumulated.fetch_add(1, Ordering::AcqRel);
    }

    pub fn outstanding_maps(&self) -> usize {
        self.mapped.load(Ordering::Acquire)
    }
}

impl FrameBuffer for SoftwareFrameBuffer {
    fn desc(&self) -> &FrameBufferDesc {
        &self.desc
    }

    fn reset_accumulation(&self) {
        self.accumulated.store(0, Ordering::Release);
    }

    fn variance(&self) -> f32 {
        1.0 / (1.0 + self.accumulated.load(Ordering::Acquire) as f32)
    }

    fn map(&self, channel: FrameBufferChannel) -> Option<NonNull<u8>> {
        let plane = match channel {
            FrameBufferChannel::Color => &self.color,
            FrameBufferChannel::Depth => self.depth.as_ref()?,
            FrameBufferChannel::Normal | FrameBufferChannel::Albedo => return None,
        };
        self.mapped.fetch_add(1, Ordering::AcqRel);
        NonNull::new(plane.as_ptr() as *mut u8)
    }

    fn unmap(&self, _data: NonNull<u8>) {
        self.mapped.fetch_sub(1, Ordering::AcqRel);
    }
}

// ============================================================================
// RENDER TASK
// ============================================================================

struct TaskState {
    duration: Option<f32>,
}

pub struct SoftwareTask {
    state: Arc<(Mutex<TaskState>, Condvar)>,
}

impl RenderTask for SoftwareTask {
    fn wait(&self) {
        let (lock, signal) = &*self.state;
        let mut state = lock.lock().unwrap();
        while state.duration.is_none() {
            state = signal.wait(state).unwrap();
        }
    }

    fn is_ready(&self) -> bool {
        self.state.0.lock().unwrap().duration.is_some()
    }

    fn progress(&self) -> f32 {
        if self.is_ready() { 1.0 } else { 0.0 }
    }

    fn duration(&self) -> f32 {
        self.state.0.lock().unwrap().duration.unwrap_or(0.0)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// CPU engine rendering each frame after a fixed delay
pub struct SoftwareEngine {
    frame_time: Duration,
    frame_buffers: Mutex<Vec<Weak<SoftwareFrameBuffer>>>,
}

impl SoftwareEngine {
    pub fn new(frame_time: Duration) -> Self {
        Self { frame_time, frame_buffers: Mutex::new(Vec::new()) }
    }

    /// Live frame buffers created by this engine
    pub fn live_frame_buffers(&self) -> usize {
        self.frame_buffers.lock().unwrap().iter().filter(|fb| fb.strong_count() > 0).count()
    }

    fn find(&self, frame_buffer: &dyn FrameBuffer) -> Option<Arc<SoftwareFrameBuffer>> {
        let wanted = frame_buffer.desc() as *const FrameBufferDesc;
        self.frame_buffers
            .lock()
            .unwrap()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|fb| std::ptr::eq(fb.desc() as *const FrameBufferDesc, wanted))
    }
}

impl EngineBackend for SoftwareEngine {
    fn name(&self) -> &str {
        "software"
    }

    fn create_frame_buffer(&self, desc: &FrameBufferDesc) -> Result<Arc<dyn FrameBuffer>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::BackendError("empty frame buffer".to_string()));
        }
        let frame_buffer = Arc::new(SoftwareFrameBuffer::new(*desc));
        self.frame_buffers.lock().unwrap().push(Arc::downgrade(&frame_buffer));
        Ok(frame_buffer)
    }

    fn render_frame(
        &self,
        frame_buffer: &dyn FrameBuffer,
        _renderer: NativeHandle,
        _camera: NativeHandle,
        world: NativeHandle,
    ) -> Result<Arc<dyn RenderTask>> {
        let target = self
            .find(frame_buffer)
            .ok_or_else(|| Error::BackendError("foreign frame buffer".to_string()))?;

        let state = Arc::new((Mutex::new(TaskState { duration: None }), Condvar::new()));
        let worker_state = Arc::clone(&state);
        let frame_time = self.frame_time;

        thread::spawn(move || {
            let start = Instant::now();
            thread::sleep(frame_time);
            target.fill(world);

            let (lock, signal) = &*worker_state;
            lock.lock().unwrap().duration = Some(start.elapsed().as_secs_f32());
            signal.notify_all();
        });

        Ok(Arc::new(SoftwareTask { state }))
    }
}

// ============================================================================
// SCENE OBJECTS
// ============================================================================

pub struct TestObject {
    subtype: &'static str,
    handle: u64,
}

impl TestObject {
    pub fn new(subtype: &'static str, handle: u64) -> Arc<Self> {
        Arc::new(Self { subtype, handle })
    }
}

impl SceneObject for TestObject {
    fn subtype(&self) -> &str {
        self.subtype
    }

    fn native_handle(&self) -> NativeHandle {
        NativeHandle(self.handle)
    }
}
