//! Interface for architecture-dependent functions implemented in separate crates.

/// Hardware operations the scheduler needs from an architecture port.
///
/// A port owns the register-frame layout and the interrupt-boundary save/restore code. The
/// scheduler only hands stack pointers back and forth through [`crate::scheduler::select_task`].
pub trait Port {
    /// Smallest stack region [`Port::init_stack`] can lay a frame out in.
    const MIN_STACK: usize;

    /// Writes the initial register frame of a task whose stack ends at `stack_top`.
    ///
    /// The returned pointer is what a restore must be pointed at to make the task look as if it
    /// was interrupted just before executing its first instruction at `pc`.
    ///
    /// # Safety
    /// `stack_top` must be the one-past-the-end pointer of a writable region of at least
    /// [`Port::MIN_STACK`] bytes.
    unsafe fn init_stack(stack_top: *mut u8, pc: usize) -> *mut u8;

    /// Arms the periodic tick source. The first tick must not be taken before
    /// [`Port::enter_first`] has restored the first frame.
    fn start_tick(&mut self, tick_freq: u32);

    /// Installs `sp` as the live stack pointer and restores the frame found there.
    ///
    /// # Safety
    /// `sp` must point at a frame produced by [`Port::init_stack`] or by a context save.
    unsafe fn enter_first(self, sp: usize) -> !;
}

/// Trait for a stack allocation that meets architecture-specific requirements such as alignment.
/// Modeled after `rp2040_hal`. https://docs.rs/rp2040-hal/0.11.0/rp2040_hal/multicore/struct.StackAllocation.html
///
/// The memory handed out must stay valid for the rest of the program, since a registered task
/// never gives its stack back.
pub trait StackAllocation {
    fn as_mut_slice(&mut self) -> &mut [u8];
}
