/// Type tags shared by parameters, properties and mapped channels

/// Data type tag
///
/// Every parameter value carries one of these, properties are requested with
/// one, and mapped channels report the element type of their pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A value that is itself a type tag (used by `channel.*` parameters)
    DataType,
    /// Opaque user pointer
    VoidPointer,
    /// Frame completion callback
    FrameCompletionCallback,
    /// Renderer object handle
    Renderer,
    /// Camera object handle
    Camera,
    /// World object handle
    World,
    String,
    Bool,
    Int32,
    UInt32,
    UInt32Vec2,
    Float32,
    Float32Vec2,
    Float32Vec3,
    Float32Vec4,
    /// 8-bit normalized RGBA, linear
    UFixed8Vec4,
    /// 8-bit normalized RGBA, sRGB encoded
    UFixed8RgbaSrgb,
}

impl DataType {
    /// Size in bytes of one element, for plain-data types
    ///
    /// Returns `None` for handles, callbacks and strings.
    pub fn size_in_bytes(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => Some(4),
            DataType::UInt32Vec2 | DataType::Float32Vec2 => Some(8),
            DataType::Float32Vec3 => Some(12),
            DataType::Float32Vec4 => Some(16),
            DataType::UFixed8Vec4 | DataType::UFixed8RgbaSrgb => Some(4),
            DataType::DataType
            | DataType::VoidPointer
            | DataType::FrameCompletionCallback
            | DataType::Renderer
            | DataType::Camera
            | DataType::World
            | DataType::String => None,
        }
    }

    /// Whether this tag names a referenced object
    pub fn is_object(&self) -> bool {
        matches!(self, DataType::Renderer | DataType::Camera | DataType::World)
    }
}
