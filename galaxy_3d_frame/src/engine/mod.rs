/// Engine module - the native rendering engine boundary
///
/// A render target never talks to a concrete engine directly. It goes through
/// these traits, and backend crates (or test doubles) provide the
/// implementations.

// Module declarations
pub mod engine_backend;
pub mod frame_buffer;
pub mod render_task;

// Re-export everything
pub use engine_backend::*;
pub use frame_buffer::*;
pub use render_task::*;

// Mock engine for tests (no native engine required)
#[cfg(test)]
pub mod mock_engine;
