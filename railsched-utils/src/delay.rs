//! `embedded-hal`-compatible delay that burns CPU cycles.
//!
//! Tasks never yield, so waiting inside a task is a busy loop that the tick preempts like any
//! other code. The delay therefore lasts at least the requested time, and longer by the share of
//! the CPU the other tasks get meanwhile.

#[derive(Clone, Debug)]
pub struct BusyDelay {
    clock_freq: u32,
}

impl BusyDelay {
    /// `clock_freq` is the CPU clock (MCLK) frequency in Hz.
    pub const fn new(clock_freq: u32) -> Self {
        Self { clock_freq }
    }

    /// Number of CPU cycles covering `ns` nanoseconds, rounded up.
    pub const fn cycles(&self, ns: u32) -> u64 {
        (ns as u64 * self.clock_freq as u64).div_ceil(1_000_000_000)
    }

    pub fn delay_cycles(&mut self, cycles: u64) {
        // Every iteration takes at least one cycle
        for i in 0..cycles {
            core::hint::black_box(i);
        }
    }
}

impl embedded_hal::delay::DelayNs for BusyDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_cycles(self.cycles(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_cycles((us as u64 * self.clock_freq as u64).div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_cycles((ms as u64 * self.clock_freq as u64).div_ceil(1_000));
    }
}
