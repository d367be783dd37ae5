//! Watchdog timer (WDT_A) used as the scheduler's tick source in interval mode.

#[cfg(target_arch = "msp430")]
use crate::regs;

/// Password that has to accompany every write of `WDTCTL`.
pub const WDTPW: u16 = 0x5A00;
pub const WDTHOLD: u16 = 0x0080;
pub const WDTSSEL0: u16 = 0x0020;
pub const WDTSSEL1: u16 = 0x0040;
/// Interval timer mode instead of watchdog mode
pub const WDTTMSEL: u16 = 0x0010;
/// Counter clear
pub const WDTCNTCL: u16 = 0x0008;
/// `SFRIE1` bit enabling the interval interrupt
pub const WDTIE: u16 = 0x0001;

/// Clock driving the watchdog counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickClock {
    Smclk,
    /// 32.768 kHz crystal on the LaunchPad
    Aclk,
    /// Internal low-power oscillator, around 10 kHz
    Vlo,
}

impl TickClock {
    pub const fn bits(self) -> u16 {
        match self {
            TickClock::Smclk => 0,
            TickClock::Aclk => WDTSSEL0,
            TickClock::Vlo => WDTSSEL1,
        }
    }
}

/// Divider between the watchdog clock and the interval interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogInterval {
    Div2G = 0,
    Div128M = 1,
    Div8192K = 2,
    Div512K = 3,
    Div32K = 4,
    Div8192 = 5,
    Div512 = 6,
    Div64 = 7,
}

impl WatchdogInterval {
    /// Fastest first
    const ALL: [WatchdogInterval; 8] = [
        WatchdogInterval::Div64,
        WatchdogInterval::Div512,
        WatchdogInterval::Div8192,
        WatchdogInterval::Div32K,
        WatchdogInterval::Div512K,
        WatchdogInterval::Div8192K,
        WatchdogInterval::Div128M,
        WatchdogInterval::Div2G,
    ];

    pub const fn divider(self) -> u32 {
        match self {
            WatchdogInterval::Div2G => 1 << 31,
            WatchdogInterval::Div128M => 1 << 27,
            WatchdogInterval::Div8192K => 1 << 23,
            WatchdogInterval::Div512K => 1 << 19,
            WatchdogInterval::Div32K => 1 << 15,
            WatchdogInterval::Div8192 => 1 << 13,
            WatchdogInterval::Div512 => 1 << 9,
            WatchdogInterval::Div64 => 1 << 6,
        }
    }

    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Slowest interval that still ticks at least `tick_freq` times per second, or the fastest
    /// one if even that is too slow.
    pub fn for_rate(clock_freq: u32, tick_freq: u32) -> Self {
        let ratio = clock_freq / tick_freq.max(1);

        Self::ALL
            .into_iter()
            .rev()
            .find(|interval| interval.divider() <= ratio)
            .unwrap_or(WatchdogInterval::Div64)
    }

    /// Tick frequency actually obtained from `clock_freq`.
    pub const fn rate(self, clock_freq: u32) -> u32 {
        clock_freq / self.divider()
    }
}

/// `WDTCTL` value running the watchdog as an interval timer.
pub const fn interval_control(clock: TickClock, interval: WatchdogInterval) -> u16 {
    WDTPW | clock.bits() | WDTTMSEL | WDTCNTCL | interval.bits()
}

/// Ownership of the watchdog peripheral.
#[derive(Debug)]
pub struct Watchdog {
    _private: (),
}

#[cfg(target_arch = "msp430")]
impl Watchdog {
    /// Starts the interval timer and unmasks its interrupt.
    ///
    /// The interrupt is only taken once GIE is set, which the first task restore does.
    pub fn start_interval(&mut self, clock: TickClock, interval: WatchdogInterval) {
        unsafe {
            regs::write16(regs::WDTCTL, interval_control(clock, interval));
            regs::modify16(regs::SFRIE1, |value| value | WDTIE);
        }
    }
}

/// Stops the watchdog so it does not reset the part during bring-up, and takes ownership of it.
#[cfg(target_arch = "msp430")]
pub fn hold_watchdog() -> Watchdog {
    unsafe {
        regs::write16(regs::WDTCTL, WDTPW | WDTHOLD);
    }

    Watchdog { _private: () }
}
