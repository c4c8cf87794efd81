/// RenderTask trait - an in-flight or finished asynchronous render

/// Render task trait
///
/// Implemented by backend-specific task handles. The task is released when
/// dropped; dropping an unfinished task does not cancel the engine work.
pub trait RenderTask: Send + Sync {
    /// Block the calling thread until the task has finished
    fn wait(&self);

    /// Whether the task has finished (successfully or not)
    fn is_ready(&self) -> bool;

    /// Completion ratio in [0, 1]
    fn progress(&self) -> f32;

    /// Time spent rendering, in seconds
    fn duration(&self) -> f32;
}
