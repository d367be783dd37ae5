//! Task runtime contract.
//!
//! A task is a plain function that never returns. It is entered through a synthesized interrupt
//! frame, runs until the next tick takes the CPU away, and is resumed exactly where it was cut on
//! its next turn. Tasks never yield and need no cooperation with the scheduler, but anything they
//! share with another task can be observed half-updated (see `railsched_utils::flag`).

/// Entry point of a task.
pub type TaskEntry = extern "C" fn() -> !;

/// Handle object for a task.
///
/// This is just a surrogate for a task ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    pub(crate) id: usize,
}

impl TaskHandle {
    pub fn id(&self) -> usize {
        self.id
    }
}
