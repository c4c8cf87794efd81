/// Parameter and property values
///
/// `ParamValue` replaces the "type tag + raw pointer" pair of the generic
/// API: the variant carries the data and `data_type()` yields the tag the
/// caller declared.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use glam::{UVec2, Vec3};

use crate::data_type::DataType;
use crate::device::DeviceHandle;
use crate::engine::NativeHandle;
use crate::render_target::RenderTarget;

/// Opaque user data handed back to the completion callback
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Frame completion callback
///
/// Invoked once per finished render with the registered user data, the
/// device the render was dispatched on and the render target itself. It runs
/// on a notification pool thread and must not block indefinitely.
pub type FrameCompletionCallback =
    Arc<dyn Fn(Option<&UserData>, DeviceHandle, &Arc<RenderTarget>) + Send + Sync>;

/// Externally owned scene object (renderer, camera, world)
///
/// A render target only keeps a share of it and asks for its engine handle
/// when a render is dispatched.
pub trait SceneObject: Send + Sync {
    /// Object subtype (e.g. "pathtracer", "perspective")
    fn subtype(&self) -> &str;

    /// Engine handle of this object
    fn native_handle(&self) -> NativeHandle;
}

/// Typed parameter value
#[derive(Clone)]
pub enum ParamValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    UInt32Vec2(UVec2),
    Float32(f32),
    Float32Vec3(Vec3),
    String(String),
    /// A type tag used as a value (`channel.color = FLOAT32_VEC4`)
    DataType(DataType),
    Renderer(Arc<dyn SceneObject>),
    Camera(Arc<dyn SceneObject>),
    World(Arc<dyn SceneObject>),
    FrameCompletionCallback(FrameCompletionCallback),
    VoidPointer(UserData),
}

impl ParamValue {
    /// The declared type tag of this value
    pub fn data_type(&self) -> DataType {
        match self {
            ParamValue::Bool(_) => DataType::Bool,
            ParamValue::Int32(_) => DataType::Int32,
            ParamValue::UInt32(_) => DataType::UInt32,
            ParamValue::UInt32Vec2(_) => DataType::UInt32Vec2,
            ParamValue::Float32(_) => DataType::Float32,
            ParamValue::Float32Vec3(_) => DataType::Float32Vec3,
            ParamValue::String(_) => DataType::String,
            ParamValue::DataType(_) => DataType::DataType,
            ParamValue::Renderer(_) => DataType::Renderer,
            ParamValue::Camera(_) => DataType::Camera,
            ParamValue::World(_) => DataType::World,
            ParamValue::FrameCompletionCallback(_) => DataType::FrameCompletionCallback,
            ParamValue::VoidPointer(_) => DataType::VoidPointer,
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "Bool({})", v),
            ParamValue::Int32(v) => write!(f, "Int32({})", v),
            ParamValue::UInt32(v) => write!(f, "UInt32({})", v),
            ParamValue::UInt32Vec2(v) => write!(f, "UInt32Vec2({}, {})", v.x, v.y),
            ParamValue::Float32(v) => write!(f, "Float32({})", v),
            ParamValue::Float32Vec3(v) => write!(f, "Float32Vec3({}, {}, {})", v.x, v.y, v.z),
            ParamValue::String(v) => write!(f, "String({:?})", v),
            ParamValue::DataType(v) => write!(f, "DataType({:?})", v),
            ParamValue::Renderer(o) => write!(f, "Renderer({})", o.subtype()),
            ParamValue::Camera(o) => write!(f, "Camera({})", o.subtype()),
            ParamValue::World(o) => write!(f, "World({})", o.subtype()),
            ParamValue::FrameCompletionCallback(_) => write!(f, "FrameCompletionCallback"),
            ParamValue::VoidPointer(_) => write!(f, "VoidPointer"),
        }
    }
}

bitflags! {
    /// Flags for property queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyFlags: u32 {
        /// Block until the current render task has finished
        const WAIT = 1 << 0;
    }
}

/// Value of a queried property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Float32(f32),
}

impl PropertyValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PropertyValue::Float32(v) => Some(*v),
        }
    }
}
