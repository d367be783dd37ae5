use core::{
    cell::{Cell, RefCell},
    mem::ManuallyDrop,
};

use critical_section::Mutex;

use crate::{
    Error, Port, StackAllocation, TaskEntry, TaskHandle, debug, info, trace,
};

/// Number of bytes at the bottom of each task stack holding [`CANARY_BYTE`].
#[cfg(feature = "stack-canary")]
pub const CANARY_LEN: usize = 8;
#[cfg(feature = "stack-canary")]
pub const CANARY_BYTE: u8 = 0x5A;

#[cfg(feature = "stack-canary")]
const RESERVED_BYTES: usize = CANARY_LEN;
#[cfg(not(feature = "stack-canary"))]
const RESERVED_BYTES: usize = 0;

/// Scheduler that receives ticks once started.
static ACTIVE: Mutex<Cell<Option<&'static dyn TickHandler>>> = Mutex::new(Cell::new(None));

/// Task Control Block (TCB)
#[derive(Clone, Debug)]
struct TaskInfo {
    stack_pointer: usize,
    /// Lowest address of the stack region
    stack_bottom: usize,
    /// One past the highest address of the stack region
    stack_top: usize,
}

impl TaskInfo {
    fn owns(&self, sp: usize) -> bool {
        (self.stack_bottom..=self.stack_top).contains(&sp)
    }

    #[cfg(feature = "stack-canary")]
    fn canary_intact(&self) -> bool {
        (0..CANARY_LEN).all(|i| {
            // SAFETY: the region was handed to the scheduler for the rest of the program
            unsafe { core::ptr::read_volatile((self.stack_bottom + i) as *const u8) == CANARY_BYTE }
        })
    }
}

#[derive(Clone, Debug)]
struct SchedulerState<const N: usize> {
    tasks: [Option<TaskInfo>; N],
    current_task: usize,
    started: bool,
}

#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub tick_freq: u32,
}

impl SchedulerConfig {
    pub fn with_tick_freq(self, tick_freq: u32) -> Self {
        Self { tick_freq, ..self }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_freq: 1000 }
    }
}

/// Round-robin successor of `current` among `N` tasks.
pub const fn dispatch<const N: usize>(current: usize) -> usize {
    (current + 1) % N
}

/// Receiver of the periodic tick.
pub trait TickHandler: Sync {
    /// Records `orig_sp` as the saved stack pointer of the interrupted task and returns the stack
    /// pointer of the task to resume.
    fn switch_context(&self, orig_sp: usize) -> usize;
}

/// Fixed population of `N` tasks switched in round-robin order on every tick.
pub struct Scheduler<P, const N: usize> {
    state: Mutex<RefCell<SchedulerState<N>>>,
    port: Mutex<RefCell<Option<P>>>,
    config: SchedulerConfig,
}

impl<P: Port + Send, const N: usize> Scheduler<P, N> {
    pub const fn new(port: P, config: SchedulerConfig) -> Self {
        const { assert!(N > 0, "A scheduler needs at least one task") };

        Self {
            state: Mutex::new(RefCell::new(SchedulerState {
                tasks: [const { None }; N],
                current_task: 0,
                started: false,
            })),
            port: Mutex::new(RefCell::new(Some(port))),
            config,
        }
    }

    /// Synthesizes the initial frame of a task on `stack` and stores it in the next free slot.
    pub fn register<S: StackAllocation>(
        &self,
        entry: TaskEntry,
        stack: S,
    ) -> Result<TaskHandle, Error> {
        // The stack is owned by the task from now on
        let mut stack = ManuallyDrop::new(stack);
        let region = stack.as_mut_slice();

        let min = P::MIN_STACK + RESERVED_BYTES;
        if region.len() < min {
            return Err(Error::StackTooSmall {
                len: region.len(),
                min,
            });
        }

        let task_id = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if state.started {
                return Err(Error::AlreadyStarted);
            }

            let Some((free_idx, slot)) = state
                .tasks
                .iter_mut()
                .enumerate()
                .find(|(_, v)| v.is_none())
            else {
                return Err(Error::TaskFull);
            };

            #[cfg(feature = "stack-canary")]
            region[..CANARY_LEN].fill(CANARY_BYTE);

            let range = region.as_mut_ptr_range();
            // Prepare initial stack of the task
            let initial_sp = unsafe { P::init_stack(range.end, entry as usize) };

            *slot = Some(TaskInfo {
                stack_pointer: initial_sp as usize,
                stack_bottom: range.start as usize,
                stack_top: range.end as usize,
            });

            Ok(free_idx)
        })?;

        info!("Task #{} registered", task_id);
        debug!(
            "Stack from={:08X} to={:08X}",
            region.as_ptr_range().start as usize,
            region.as_ptr_range().end as usize
        );

        Ok(TaskHandle { id: task_id })
    }

    /// ID of the task currently owning the CPU.
    pub fn current_task(&self) -> Result<usize, Error> {
        critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            if !state.started {
                return Err(Error::NotStarted);
            }

            Ok(state.current_task)
        })
    }

    /// Selects task #0, arms the tick and restores its frame. Control never comes back.
    ///
    /// Panics if fewer than `N` tasks were registered.
    pub fn start(&'static self) -> !
    where
        P: 'static,
    {
        let started = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);

            let registered = state.tasks.iter().filter(|task| task.is_some()).count();
            if registered != N {
                return Err(registered);
            }
            let Some(port) = self.port.borrow_ref_mut(cs).take() else {
                return Err(registered);
            };

            state.current_task = 0;
            state.started = true;
            ACTIVE.borrow(cs).set(Some(self));

            let Some(ref first_task) = state.tasks[0] else {
                unreachable!()
            };
            Ok((port, first_task.stack_pointer))
        });

        let (mut port, first_sp) = match started {
            Ok(started) => started,
            Err(registered) if registered != N => panic!(
                "Scheduler started with {} of {} tasks registered",
                registered, N
            ),
            Err(_) => panic!("Scheduler already started"),
        };

        port.start_tick(self.config.tick_freq);

        info!("Kernel started");

        unsafe { port.enter_first(first_sp) }
    }
}

impl<P: Port + Send, const N: usize> TickHandler for Scheduler<P, N> {
    fn switch_context(&self, orig_sp: usize) -> usize {
        let switched = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let state = &mut *state;

            let orig_task_id = state.current_task;
            let Some(ref mut orig_task) = state.tasks[orig_task_id] else {
                unreachable!()
            };

            if !orig_task.owns(orig_sp) {
                return Err(orig_task_id);
            }
            #[cfg(feature = "stack-canary")]
            if !orig_task.canary_intact() {
                return Err(orig_task_id);
            }

            // Update stack pointer
            orig_task.stack_pointer = orig_sp;

            let next_task_id = dispatch::<N>(orig_task_id);
            state.current_task = next_task_id;

            let Some(ref next_task) = state.tasks[next_task_id] else {
                unreachable!()
            };
            Ok(next_task.stack_pointer)
        });

        match switched {
            Ok(next_sp) => {
                trace!(
                    "Context switch: orig_sp = {:08X}, next_sp = {:08X}",
                    orig_sp, next_sp
                );
                next_sp
            }
            Err(task_id) => panic!("Stack overflow detected in task #{}", task_id),
        }
    }
}

/// Tick entry called by the port's interrupt vector after the register save.
///
/// Takes the stack pointer of the interrupted task and returns the one to restore.
pub unsafe extern "C" fn select_task(orig_sp: usize) -> usize {
    let active = critical_section::with(|cs| ACTIVE.borrow(cs).get());
    let Some(scheduler) = active else {
        panic!("Scheduler not started")
    };

    scheduler.switch_context(orig_sp)
}
