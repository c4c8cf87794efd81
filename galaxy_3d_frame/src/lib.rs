/*!
# Galaxy 3D Frame

Render targets for the Galaxy 3D rendering API.

A render target sits between the backend-agnostic API and a native rendering
engine. Clients configure its resolution, color format and auxiliary
channels, attach the renderer, camera and world to draw, and dispatch
asynchronous renders. Pixels are read back per channel once a render has
finished.

## Architecture

- **Device**: owns the engine backend and the completion notification pool
- **RenderTarget**: configuration, lazy frame buffer rebuild, render dispatch,
  property queries and channel mapping
- **EngineBackend / FrameBuffer / RenderTask**: the engine boundary, implemented
  by backend crates
- **Runtime**: process-wide logger host

Backend implementations provide concrete types that implement the engine traits.
*/

// Internal modules
mod config;
mod data_type;
mod device;
mod error;
mod notification_pool;
mod object;
mod param;
mod render_target;
mod runtime;
pub mod engine;
pub mod log;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Runtime singleton (logger host)
    pub use crate::runtime::Runtime;

    // Device and configuration
    pub use crate::config::DeviceConfig;
    pub use crate::device::{Device, DeviceHandle};

    // Render target
    pub use crate::render_target::{
        canonical_channel_name, BuildState, MappedChannel, RenderTarget,
    };

    // Values
    pub use crate::data_type::DataType;
    pub use crate::param::{
        FrameCompletionCallback, ParamValue, PropertyFlags, PropertyValue, SceneObject, UserData,
    };

    // Generic object base
    pub use crate::object::ObjectBase;

    // Notification pool
    pub use crate::notification_pool::NotificationPool;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Engine boundary sub-module
    pub mod engine {
        pub use crate::engine::*;
    }
}

// Re-export math library at crate root
pub use glam;
