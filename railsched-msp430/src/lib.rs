//! MSP430X specific part of railsched.
//!
//! Provides the register-frame layout of a suspended task, the context switch in the watchdog
//! interval vector, and memory-mapped bindings of the PMM, UCS and watchdog of the MSP430F5529.
//!
//! The firmware has to place [`WDT`] in the watchdog slot of its interrupt vector table.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "msp430", feature(asm_experimental_arch))]

pub mod frame;
pub mod pmm;
pub mod regs;
pub mod ucs;
pub mod wdt;

use railsched::arch::StackAllocation;

pub use pmm::Pmm;
pub use ucs::Ucs;
pub use wdt::{TickClock, Watchdog, WatchdogInterval};

/// Correctly aligned stack allocation helper.
///
/// The lower bound only guarantees room for the initial frame and the canary. Every tick also
/// pushes a frame and calls into the scheduler on the task's stack, so the size has to cover the
/// deepest call chain of the task plus that.
#[repr(align(2))]
pub struct Stack<const N: usize>([u8; N]);

impl<const N: usize> Stack<N> {
    pub const fn new() -> Self {
        const {
            assert!(N % 2 == 0, "Stack size must be a whole number of words");
            assert!(N >= 64, "Stack too small for a register frame");
        };

        Self([0u8; N])
    }
}

impl<const N: usize> Default for Stack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StackAllocation for &'static mut Stack<N> {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

#[cfg(target_arch = "msp430")]
pub use target::*;

#[cfg(target_arch = "msp430")]
mod target {
    use railsched::{Port, Scheduler, SchedulerConfig};

    use crate::{
        frame,
        wdt::{TickClock, Watchdog, WatchdogInterval},
    };

    /// Port of the scheduler to the MSP430X, ticking from the watchdog interval timer.
    pub struct Msp430 {
        watchdog: Watchdog,
        tick_clock: TickClock,
        tick_clock_freq: u32,
    }

    impl Port for Msp430 {
        const MIN_STACK: usize = frame::FRAME_SIZE;

        unsafe fn init_stack(stack_top: *mut u8, pc: usize) -> *mut u8 {
            unsafe { frame::init_stack(stack_top, pc) }
        }

        fn start_tick(&mut self, tick_freq: u32) {
            let interval = WatchdogInterval::for_rate(self.tick_clock_freq, tick_freq);
            self.watchdog.start_interval(self.tick_clock, interval);
        }

        unsafe fn enter_first(self, sp: usize) -> ! {
            unsafe {
                core::arch::asm!(
                    "mov {sp}, r1",
                    "pop r15",
                    "pop r14",
                    "pop r13",
                    "pop r12",
                    "pop r11",
                    "pop r10",
                    "pop r9",
                    "pop r8",
                    "pop r7",
                    "pop r6",
                    "pop r5",
                    "pop r4",
                    // Pops SR (setting GIE) and the 20-bit PC
                    "reti",
                    sp = in(reg) sp,
                    options(noreturn),
                )
            }
        }
    }

    /// Builds the scheduler of the board.
    ///
    /// `tick_clock_freq` is the frequency of `tick_clock`, used to pick the watchdog interval.
    pub const fn init_scheduler<const N: usize>(
        watchdog: Watchdog,
        tick_clock: TickClock,
        tick_clock_freq: u32,
        config: SchedulerConfig,
    ) -> Scheduler<Msp430, N> {
        Scheduler::new(
            Msp430 {
                watchdog,
                tick_clock,
                tick_clock_freq,
            },
            config,
        )
    }

    /// Watchdog interval vector performing the context switch.
    #[unsafe(no_mangle)]
    #[unsafe(naked)]
    pub unsafe extern "C" fn WDT() {
        // PC and SR are already pushed by the hardware and GIE is cleared
        core::arch::naked_asm!(
            "push r4",
            "push r5",
            "push r6",
            "push r7",
            "push r8",
            "push r9",
            "push r10",
            "push r11",
            "push r12",
            "push r13",
            "push r14",
            "push r15",
            "mov r1, r12", // First argument and return value of `select_task`
            "call #{select_task}",
            "mov r12, r1",
            "pop r15",
            "pop r14",
            "pop r13",
            "pop r12",
            "pop r11",
            "pop r10",
            "pop r9",
            "pop r8",
            "pop r7",
            "pop r6",
            "pop r5",
            "pop r4",
            "reti",
            select_task = sym railsched::scheduler::select_task,
        );
    }
}
