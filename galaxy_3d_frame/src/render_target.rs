/// Render target - an output frame buffer plus the render that fills it.
///
/// Clients configure resolution, color format and auxiliary channels through
/// parameters, attach the renderer / camera / world to draw, commit, and
/// dispatch asynchronous renders. Pixels are read back per channel with
/// `map()` once a render has finished.
///
/// Lifecycle:
/// - structural parameters (size, channels) only mark the target Dirty;
///   the engine frame buffer is rebuilt lazily on the next `commit()`
/// - `render()` replaces the previous render task and optionally schedules
///   the completion callback on the device's notification pool
/// - every engine resource is released by dropping its handle

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use glam::UVec2;

use crate::data_type::DataType;
use crate::device::Device;
use crate::engine::{
    EngineBackend, FrameBuffer, FrameBufferChannel, FrameBufferChannels, FrameBufferDesc,
    FrameBufferFormat, RenderTask,
};
use crate::error::{Error, Result, logged};
use crate::object::ObjectBase;
use crate::param::{
    FrameCompletionCallback, ParamValue, PropertyFlags, PropertyValue, SceneObject, UserData,
};
use crate::{frame_debug, frame_trace, frame_warn};

const SOURCE: &str = "galaxy3d::RenderTarget";

// ===== CHANNEL NAMES =====

/// Bare channel names still accepted, with their namespaced replacement
const LEGACY_CHANNEL_NAMES: &[(&str, &str)] = &[
    ("color", "channel.color"),
    ("depth", "channel.depth"),
    ("normal", "channel.normal"),
    ("albedo", "channel.albedo"),
];

/// Namespaced replacement of a legacy channel name, if `name` is one
pub fn canonical_channel_name(name: &str) -> Option<&'static str> {
    LEGACY_CHANNEL_NAMES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, canonical)| *canonical)
}

fn resolve_name(name: &str, warn: bool) -> &str {
    match canonical_channel_name(name) {
        Some(canonical) => {
            if warn {
                frame_warn!(SOURCE, "Channel name '{}' is deprecated, use '{}' instead",
                    name, canonical);
            }
            canonical
        }
        None => name,
    }
}

// ===== STATE =====

/// Frame buffer reconstruction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Never committed, no frame buffer
    Clean,
    /// A structural parameter changed since the last rebuild
    Dirty,
    /// The frame buffer matches the committed configuration
    Built,
    /// The last rebuild failed; no frame buffer until a structural change
    Failed,
}

impl BuildState {
    /// Whether the next commit must rebuild the frame buffer
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, BuildState::Clean | BuildState::Dirty)
    }
}

/// Structural configuration, applied at the next rebuild
#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelConfig {
    size: UVec2,
    color: DataType,
    depth: bool,
    normal: bool,
    albedo: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            size: UVec2::ZERO,
            color: DataType::UFixed8RgbaSrgb,
            depth: false,
            normal: false,
            albedo: false,
        }
    }
}

impl ChannelConfig {
    fn channels(&self) -> FrameBufferChannels {
        let mut channels = FrameBufferChannels::REQUIRED;
        if self.depth {
            channels |= FrameBufferChannels::DEPTH;
        }
        if self.normal {
            channels |= FrameBufferChannels::NORMAL;
        }
        if self.albedo {
            channels |= FrameBufferChannels::ALBEDO;
        }
        channels
    }
}

/// The most recent render and everything it must outlive
struct InFlightRender {
    task: Arc<dyn RenderTask>,
    _frame_buffer: Arc<dyn FrameBuffer>,
    _scene: [Arc<dyn SceneObject>; 3],
}

struct TargetState {
    object: ObjectBase,
    config: ChannelConfig,
    build_state: BuildState,
    frame_buffer: Option<Arc<dyn FrameBuffer>>,
    reconstructions: u64,
    in_flight: Option<InFlightRender>,
    renderer: Option<Arc<dyn SceneObject>>,
    camera: Option<Arc<dyn SceneObject>>,
    world: Option<Arc<dyn SceneObject>>,
    callback: Option<FrameCompletionCallback>,
    user_data: Option<UserData>,
}

impl TargetState {
    fn mark_dirty(&mut self, name: &str) {
        if self.build_state != BuildState::Dirty {
            frame_trace!(SOURCE, "'{}' changed, frame buffer rebuild pending", name);
        }
        self.build_state = BuildState::Dirty;
    }

    fn current_task(&self) -> Option<Arc<dyn RenderTask>> {
        self.in_flight.as_ref().map(|render| Arc::clone(&render.task))
    }
}

// ===== RENDER TARGET =====

pub struct RenderTarget {
    backend: Arc<dyn EngineBackend>,
    warn_on_legacy_names: bool,
    state: Mutex<TargetState>,
}

impl RenderTarget {
    /// Internal only, created via Device::new_render_target()
    pub(crate) fn new(backend: Arc<dyn EngineBackend>, warn_on_legacy_names: bool) -> Self {
        Self {
            backend,
            warn_on_legacy_names,
            state: Mutex::new(TargetState {
                object: ObjectBase::new("RenderTarget"),
                config: ChannelConfig::default(),
                build_state: BuildState::Clean,
                frame_buffer: None,
                reconstructions: 0,
                in_flight: None,
                renderer: None,
                camera: None,
                world: None,
                callback: None,
                user_data: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TargetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== PARAMETERS =====

    /// Set a parameter
    ///
    /// Recognized names:
    ///
    /// | name | value | effect |
    /// |---|---|---|
    /// | `size` | `UInt32Vec2` | resolution, rebuild |
    /// | `channel.color` | `DataType` | color format, rebuild |
    /// | `channel.depth` | `DataType` | enables depth, rebuild |
    /// | `channel.normal` / `channel.albedo` | `DataType(Float32Vec3)` | enables plane, rebuild |
    /// | `renderer` / `camera` / `world` | matching object | replaces the share |
    /// | `frameCompletionCallback` | callback | completion callback |
    /// | `frameCompletionCallbackUserData` | `VoidPointer` | callback user data |
    ///
    /// The bare names `color`, `depth`, `normal` and `albedo` are accepted
    /// with a deprecation warning. Anything else, including a recognized name
    /// with a value of the wrong type, goes to the generic parameter store.
    ///
    /// # Errors
    ///
    /// `UnsupportedChannelType` when normal or albedo is requested with any
    /// element type other than `Float32Vec3`. The target is left unchanged.
    pub fn set_param(&self, name: &str, value: ParamValue) -> Result<()> {
        let name = resolve_name(name, self.warn_on_legacy_names);
        let mut state = self.state();

        match (name, value) {
            ("size", ParamValue::UInt32Vec2(size)) => {
                state.config.size = size;
                state.mark_dirty(name);
            }
            ("channel.color", ParamValue::DataType(format)) => {
                state.config.color = format;
                state.mark_dirty(name);
            }
            ("channel.depth", ParamValue::DataType(_)) => {
                state.config.depth = true;
                state.mark_dirty(name);
            }
            ("channel.normal", ParamValue::DataType(data_type)) => {
                Self::check_vec3_channel(name, data_type)?;
                state.config.normal = true;
                state.mark_dirty(name);
            }
            ("channel.albedo", ParamValue::DataType(data_type)) => {
                Self::check_vec3_channel(name, data_type)?;
                state.config.albedo = true;
                state.mark_dirty(name);
            }
            ("renderer", ParamValue::Renderer(object)) => state.renderer = Some(object),
            ("camera", ParamValue::Camera(object)) => state.camera = Some(object),
            ("world", ParamValue::World(object)) => state.world = Some(object),
            ("frameCompletionCallback", ParamValue::FrameCompletionCallback(callback)) => {
                state.callback = Some(callback);
            }
            ("frameCompletionCallbackUserData", ParamValue::VoidPointer(user_data)) => {
                state.user_data = Some(user_data);
            }
            (_, value) => state.object.set_param(name, value),
        }

        Ok(())
    }

    fn check_vec3_channel(name: &str, data_type: DataType) -> Result<()> {
        if data_type == DataType::Float32Vec3 {
            return Ok(());
        }
        Err(logged!(SOURCE, Error::UnsupportedChannelType {
            channel: name.to_string(),
            data_type,
        }))
    }

    /// Clear a parameter
    ///
    /// Structural parameters revert to their default and mark the target for
    /// rebuild (unless already at the default); references, callback and
    /// user data are dropped; other names are removed from the generic store.
    /// Returns whether anything was set.
    pub fn unset_param(&self, name: &str) -> bool {
        let name = resolve_name(name, self.warn_on_legacy_names);
        let mut state = self.state();
        let defaults = ChannelConfig::default();
        let previous = state.config;

        match name {
            "size" => state.config.size = defaults.size,
            "channel.color" => state.config.color = defaults.color,
            "channel.depth" => state.config.depth = defaults.depth,
            "channel.normal" => state.config.normal = defaults.normal,
            "channel.albedo" => state.config.albedo = defaults.albedo,
            "renderer" => return state.renderer.take().is_some(),
            "camera" => return state.camera.take().is_some(),
            "world" => return state.world.take().is_some(),
            "frameCompletionCallback" => return state.callback.take().is_some(),
            "frameCompletionCallbackUserData" => return state.user_data.take().is_some(),
            _ => return state.object.unset_param(name),
        }

        if state.config == previous {
            return false;
        }
        state.mark_dirty(name);
        true
    }

    /// Value stored in the generic parameter store
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        self.state().object.param(name).cloned()
    }

    // ===== COMMIT =====

    /// Apply pending parameter changes
    ///
    /// Rebuilds the engine frame buffer if a structural parameter changed
    /// (or this is the first commit), then runs the generic commit
    /// bookkeeping. The rebuild request is consumed even when the rebuild
    /// fails: the target stays `Failed` until a structural parameter changes.
    ///
    /// # Errors
    ///
    /// - `UnsupportedChannelType` if the color format has no engine encoding
    /// - the backend's error if the frame buffer cannot be created
    pub fn commit(&self) -> Result<()> {
        let mut state = self.state();

        let result = if state.build_state.needs_rebuild() {
            self.reconstruct(&mut state)
        } else {
            Ok(())
        };

        state.object.commit();
        result
    }

    fn reconstruct(&self, state: &mut TargetState) -> Result<()> {
        // Outstanding mappings and the in-flight render hold their own share
        if state.frame_buffer.take().is_some() {
            frame_trace!(SOURCE, "Released frame buffer");
        }
        state.build_state = BuildState::Failed;

        let config = state.config;
        let format = FrameBufferFormat::from_data_type(config.color).ok_or_else(|| {
            logged!(SOURCE, Error::UnsupportedChannelType {
                channel: "channel.color".to_string(),
                data_type: config.color,
            })
        })?;

        let desc = FrameBufferDesc {
            width: config.size.x,
            height: config.size.y,
            format,
            channels: config.channels(),
        };

        let frame_buffer = self.backend.create_frame_buffer(&desc)
            .map_err(|e| logged!(SOURCE, e))?;

        frame_debug!(SOURCE, "Built {}x{} {:?} frame buffer with {:?}",
            desc.width, desc.height, desc.format, desc.channels);

        state.frame_buffer = Some(frame_buffer);
        state.build_state = BuildState::Built;
        state.reconstructions += 1;
        Ok(())
    }

    // ===== RENDER =====

    /// Dispatch an asynchronous render
    ///
    /// The previous render task is released first, whether or not it
    /// finished. If the device reports modified global state, accumulation
    /// restarts. Without a completion callback this returns right after
    /// submission. With one, it waits for the render to finish and then
    /// queues the callback on the device's notification pool; the queued job
    /// keeps this target alive until the callback has returned.
    ///
    /// # Errors
    ///
    /// - `NotCommitted` if no frame buffer was ever built
    /// - `MissingSceneObject` if renderer, camera or world is not set
    /// - the backend's error if submission fails (not retried)
    pub fn render(self: &Arc<Self>, device: &Device) -> Result<()> {
        let mut state = self.state();

        if state.in_flight.take().is_some() {
            frame_trace!(SOURCE, "Released previous render task");
        }

        let frame_buffer = match &state.frame_buffer {
            Some(frame_buffer) => Arc::clone(frame_buffer),
            None => return Err(logged!(SOURCE, Error::NotCommitted)),
        };
        if state.build_state == BuildState::Dirty {
            frame_warn!(SOURCE, "Rendering with uncommitted structural changes, using the last built frame buffer");
        }

        let renderer = state.renderer.clone()
            .ok_or_else(|| logged!(SOURCE, Error::MissingSceneObject("renderer")))?;
        let camera = state.camera.clone()
            .ok_or_else(|| logged!(SOURCE, Error::MissingSceneObject("camera")))?;
        let world = state.world.clone()
            .ok_or_else(|| logged!(SOURCE, Error::MissingSceneObject("world")))?;

        if device.is_modified() {
            frame_buffer.reset_accumulation();
            frame_trace!(SOURCE, "Device state modified, accumulation reset");
        }

        let task = self.backend
            .render_frame(
                frame_buffer.as_ref(),
                renderer.native_handle(),
                camera.native_handle(),
                world.native_handle(),
            )
            .map_err(|e| logged!(SOURCE, e))?;

        state.in_flight = Some(InFlightRender {
            task: Arc::clone(&task),
            _frame_buffer: frame_buffer,
            _scene: [renderer, camera, world],
        });

        let callback = state.callback.clone();
        let user_data = state.user_data.clone();
        drop(state);

        if let Some(callback) = callback {
            task.wait();

            let target = Arc::clone(self);
            let device_handle = device.handle();
            device.notifier().spawn(move || {
                callback(user_data.as_ref(), device_handle, &target);
                drop(target);
            });
        }

        Ok(())
    }

    /// Whether the current render has finished
    ///
    /// With `PropertyFlags::WAIT`, blocks until it has. A target that never
    /// rendered is ready.
    pub fn ready(&self, flags: PropertyFlags) -> bool {
        let task = self.state().current_task();
        match task {
            Some(task) => {
                if flags.contains(PropertyFlags::WAIT) {
                    task.wait();
                }
                task.is_ready()
            }
            None => true,
        }
    }

    /// Block until the current render has finished (no-op without one)
    pub fn wait(&self) {
        let task = self.state().current_task();
        if let Some(task) = task {
            task.wait();
        }
    }

    // ===== PROPERTIES =====

    /// Query a property
    ///
    /// `duration` and `progress` read the current render task, `variance`
    /// reads the frame buffer. All three are `Float32`. With
    /// `PropertyFlags::WAIT` the current task is waited on first. Anything
    /// else, or a query with nothing to answer from, falls back to the
    /// generic object (which knows no properties).
    pub fn get_property(&self, name: &str, data_type: DataType, flags: PropertyFlags) -> Option<PropertyValue> {
        if data_type == DataType::Float32 {
            let (task, frame_buffer) = {
                let state = self.state();
                (state.current_task(), state.frame_buffer.clone())
            };

            let wait_for = |task: &Arc<dyn RenderTask>| {
                if flags.contains(PropertyFlags::WAIT) {
                    task.wait();
                }
            };

            match (name, &task, &frame_buffer) {
                ("duration", Some(task), _) => {
                    wait_for(task);
                    return Some(PropertyValue::Float32(task.duration()));
                }
                ("progress", Some(task), _) => {
                    wait_for(task);
                    return Some(PropertyValue::Float32(task.progress()));
                }
                ("variance", _, Some(frame_buffer)) => {
                    if let Some(task) = &task {
                        wait_for(task);
                    }
                    return Some(PropertyValue::Float32(frame_buffer.variance()));
                }
                _ => {}
            }
        }

        self.state().object.property(name, data_type)
    }

    // ===== MAP / UNMAP =====

    /// Map a channel for reading
    ///
    /// Accepts `channel.color`, `channel.depth`, `channel.normal`,
    /// `channel.albedo` (and their deprecated bare names). Returns `None` for
    /// any other name, for a channel the frame buffer does not carry, or
    /// before the first successful commit. Normal and albedo are always
    /// `Float32Vec3`, depth is `Float32`.
    ///
    /// While a rebuild is pending the last built buffer is served, with its
    /// own dimensions.
    pub fn map(&self, channel: &str) -> Option<MappedChannel> {
        let name = resolve_name(channel, self.warn_on_legacy_names);
        let channel = match name {
            "channel.color" => FrameBufferChannel::Color,
            "channel.depth" => FrameBufferChannel::Depth,
            "channel.normal" => FrameBufferChannel::Normal,
            "channel.albedo" => FrameBufferChannel::Albedo,
            _ => {
                frame_debug!(SOURCE, "Cannot map unknown channel '{}'", name);
                return None;
            }
        };

        let frame_buffer = {
            let state = self.state();
            let Some(frame_buffer) = state.frame_buffer.clone() else {
                frame_warn!(SOURCE, "Cannot map '{}' before the render target is committed", name);
                return None;
            };
            if state.build_state == BuildState::Dirty {
                frame_warn!(SOURCE, "Mapping '{}' with uncommitted structural changes", name);
            }
            frame_buffer
        };

        let desc = *frame_buffer.desc();
        let data = frame_buffer.map(channel)?;

        Some(MappedChannel {
            frame_buffer,
            data,
            channel,
            width: desc.width,
            height: desc.height,
            pixel_type: channel.pixel_type(desc.format),
        })
    }

    /// Return a mapped channel to the engine
    ///
    /// Dropping the `MappedChannel` has the same effect.
    pub fn unmap(&self, mapped: MappedChannel) {
        frame_trace!(SOURCE, "Unmapped {:?}", mapped.channel);
        drop(mapped);
    }

    // ===== ACCESSORS =====

    /// Configured resolution (applied at the next rebuild)
    pub fn size(&self) -> UVec2 {
        self.state().config.size
    }

    /// Configured color format (applied at the next rebuild)
    pub fn color_format(&self) -> DataType {
        self.state().config.color
    }

    pub fn build_state(&self) -> BuildState {
        self.state().build_state
    }

    /// Descriptor of the live frame buffer
    pub fn frame_buffer_desc(&self) -> Option<FrameBufferDesc> {
        self.state().frame_buffer.as_ref().map(|frame_buffer| *frame_buffer.desc())
    }

    /// Number of successful frame buffer rebuilds
    pub fn reconstruction_count(&self) -> u64 {
        self.state().reconstructions
    }

    pub fn commit_count(&self) -> u64 {
        self.state().object.commit_count()
    }

    /// Whether a render task is held (finished or not)
    pub fn has_task(&self) -> bool {
        self.state().in_flight.is_some()
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.in_flight.take().is_some() {
            frame_trace!(SOURCE, "Released render task on destruction");
        }
    }
}

// ===== MAPPED CHANNEL =====

/// Read-only view of one mapped channel
///
/// Holds a share of the frame buffer, so a rebuild while mapped cannot free
/// the pixels. Dropping it unmaps exactly once.
pub struct MappedChannel {
    frame_buffer: Arc<dyn FrameBuffer>,
    data: NonNull<u8>,
    channel: FrameBufferChannel,
    width: u32,
    height: u32,
    pixel_type: DataType,
}

impl MappedChannel {
    pub fn channel(&self) -> FrameBufferChannel {
        self.channel
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Element type of one pixel
    pub fn pixel_type(&self) -> DataType {
        self.pixel_type
    }

    /// Size of the mapped plane in bytes
    pub fn len_bytes(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.pixel_type.size_in_bytes().unwrap_or(0)
    }

    /// Engine pointer to the first pixel
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Raw pixel bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: FrameBuffer::map() guarantees `len_bytes()` readable bytes
        // until unmap, which only happens when `self` is dropped.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len_bytes()) }
    }

    /// Typed pixel view (e.g. `[u8; 4]`, `f32`, `glam::Vec3`)
    ///
    /// Returns `None` if the plane's size or alignment does not fit `T`.
    pub fn pixels<T: bytemuck::Pod>(&self) -> Option<&[T]> {
        bytemuck::try_cast_slice(self.as_bytes()).ok()
    }
}

impl Drop for MappedChannel {
    fn drop(&mut self) {
        self.frame_buffer.unmap(self.data);
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
