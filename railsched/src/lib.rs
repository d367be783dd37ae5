#![cfg_attr(not(test), no_std)]

mod log_wrapper;

pub mod arch;
pub mod boot;
pub mod pmm;
pub mod scheduler;
pub mod task;

pub use arch::{Port, StackAllocation};
pub use pmm::VCore;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use task::{TaskEntry, TaskHandle};

pub use portable_atomic;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Every slot of the task table is already occupied.
    TaskFull,
    /// The stack handed to `register` cannot hold the initial frame.
    StackTooSmall { len: usize, min: usize },
    /// Tasks can only be registered before the scheduler starts.
    AlreadyStarted,
    NotStarted,
    /// A voltage step was requested to something other than the next level.
    InvalidLevel,
    /// The supply cannot sustain `level`; the step was rolled back.
    InsufficientSupply { level: VCore },
    /// Lowering the core voltage is not supported.
    StepDownUnsupported { current: VCore, target: VCore },
}
