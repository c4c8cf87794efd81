/// FrameBuffer trait and frame buffer descriptor

use std::ptr::NonNull;
use bitflags::bitflags;
use crate::data_type::DataType;

/// Pixel encoding of the color channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBufferFormat {
    /// 8-bit RGBA, linear
    Rgba8,
    /// 8-bit RGBA, sRGB encoded
    Srgba,
    /// 32-bit float RGBA
    Rgba32F,
}

impl FrameBufferFormat {
    /// Engine format for a color type tag, if the engine can store it
    pub fn from_data_type(data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::UFixed8Vec4 => Some(FrameBufferFormat::Rgba8),
            DataType::UFixed8RgbaSrgb => Some(FrameBufferFormat::Srgba),
            DataType::Float32Vec4 => Some(FrameBufferFormat::Rgba32F),
            _ => None,
        }
    }

    /// Type tag of one color pixel
    pub fn data_type(&self) -> DataType {
        match self {
            FrameBufferFormat::Rgba8 => DataType::UFixed8Vec4,
            FrameBufferFormat::Srgba => DataType::UFixed8RgbaSrgb,
            FrameBufferFormat::Rgba32F => DataType::Float32Vec4,
        }
    }
}

bitflags! {
    /// Set of planes allocated in a frame buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameBufferChannels: u32 {
        const COLOR    = 1 << 0;
        const DEPTH    = 1 << 1;
        const ACCUM    = 1 << 2;
        const VARIANCE = 1 << 3;
        const NORMAL   = 1 << 4;
        const ALBEDO   = 1 << 5;

        /// Planes every frame buffer carries
        const REQUIRED = Self::COLOR.bits() | Self::ACCUM.bits() | Self::VARIANCE.bits();
    }
}

/// A single mappable plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameBufferChannel {
    Color,
    Depth,
    Normal,
    Albedo,
}

impl FrameBufferChannel {
    /// The allocation flag backing this plane
    pub fn flag(&self) -> FrameBufferChannels {
        match self {
            FrameBufferChannel::Color => FrameBufferChannels::COLOR,
            FrameBufferChannel::Depth => FrameBufferChannels::DEPTH,
            FrameBufferChannel::Normal => FrameBufferChannels::NORMAL,
            FrameBufferChannel::Albedo => FrameBufferChannels::ALBEDO,
        }
    }

    /// Element type of one pixel of this plane in a buffer of `format`
    pub fn pixel_type(&self, format: FrameBufferFormat) -> DataType {
        match self {
            FrameBufferChannel::Color => format.data_type(),
            FrameBufferChannel::Depth => DataType::Float32,
            FrameBufferChannel::Normal | FrameBufferChannel::Albedo => DataType::Float32Vec3,
        }
    }
}

/// Descriptor for creating a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBufferDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Color channel encoding
    pub format: FrameBufferFormat,
    /// Allocated planes
    pub channels: FrameBufferChannels,
}

/// Frame buffer resource trait
///
/// Implemented by backend-specific frame buffers.
/// The frame buffer is released when the last reference is dropped.
pub trait FrameBuffer: Send + Sync {
    /// Descriptor the buffer was created with
    fn desc(&self) -> &FrameBufferDesc;

    /// Drop accumulated samples so progressive refinement restarts
    fn reset_accumulation(&self);

    /// Current estimated variance of the accumulated image
    fn variance(&self) -> f32;

    /// Map a plane for reading
    ///
    /// Returns `None` when the plane was not allocated. Otherwise the pointer
    /// stays valid for `width * height * pixel size` bytes until it is passed
    /// back to `unmap()`.
    fn map(&self, channel: FrameBufferChannel) -> Option<NonNull<u8>>;

    /// Return a pointer obtained from `map()`
    fn unmap(&self, data: NonNull<u8>);
}
