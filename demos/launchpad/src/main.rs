//! Three tasks on the MSP-EXP430F5529LP.
//!
//! Task #0 blinks the red LED (P1.0) and task #1 the green LED (P4.7). Task #2 polls the two
//! user buttons (S1 on P2.1, S2 on P1.1) and pauses or resumes the matching LED.

#![no_std]
#![no_main]

use embedded_hal::delay::DelayNs;
use msp430_rt::entry;
use panic_msp430 as _;
use portable_atomic::{AtomicU32, Ordering};
use railsched::{SchedulerConfig, VCore, boot::bring_up};
use railsched_msp430::{
    Msp430, Pmm, Stack, TickClock, Ucs, WDT, init_scheduler, wdt::hold_watchdog,
};
use railsched_utils::{BusyDelay, SharedFlag};
use static_cell::{ConstStaticCell, StaticCell};

const CPU_FREQ: u32 = 25_000_000;
/// DCO frequency out of reset
const RESET_FREQ: u32 = 1_048_576;
/// Nominal VLO frequency
const VLO_FREQ: u32 = 10_000;
const TICK_FREQ: u32 = 150;

static SCHEDULER: StaticCell<railsched::Scheduler<Msp430, 3>> = StaticCell::new();
static RED_STACK: ConstStaticCell<Stack<1024>> = ConstStaticCell::new(Stack::new());
static GREEN_STACK: ConstStaticCell<Stack<1024>> = ConstStaticCell::new(Stack::new());
static BUTTON_STACK: ConstStaticCell<Stack<1024>> = ConstStaticCell::new(Stack::new());

static RED_ENABLED: SharedFlag = SharedFlag::new(true);
static GREEN_ENABLED: SharedFlag = SharedFlag::new(true);
static CLOCK_FREQ: AtomicU32 = AtomicU32::new(RESET_FREQ);

mod gpio {
    pub const P1IN: usize = 0x0200;
    pub const P1OUT: usize = 0x0202;
    pub const P1DIR: usize = 0x0204;
    pub const P1REN: usize = 0x0206;
    pub const P2IN: usize = 0x0201;
    pub const P2OUT: usize = 0x0203;
    pub const P2REN: usize = 0x0207;
    pub const P4OUT: usize = 0x0223;
    pub const P4DIR: usize = 0x0225;

    pub const BIT0: u8 = 1 << 0;
    pub const BIT1: u8 = 1 << 1;
    pub const BIT7: u8 = 1 << 7;

    pub fn read(addr: usize) -> u8 {
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    /// Not atomic. Once the tasks run each output register is only written by one of them.
    pub fn modify(addr: usize, f: impl FnOnce(u8) -> u8) {
        unsafe { core::ptr::write_volatile(addr as *mut u8, f(read(addr))) }
    }
}

use gpio::*;

union Vector {
    handler: unsafe extern "C" fn(),
    reserved: u16,
}

/// Slot of the watchdog interval vector (0xFFF2)
const WDT_VECTOR: usize = 57;

#[unsafe(link_section = ".vector_table.interrupts")]
#[unsafe(no_mangle)]
#[used]
static __INTERRUPTS: [Vector; 63] = {
    let mut table = [const { Vector { reserved: 0 } }; 63];
    table[WDT_VECTOR] = Vector { handler: WDT };
    table
};

#[entry]
fn main() -> ! {
    let watchdog = hold_watchdog();

    // Nothing may run faster than the reset clock until the core voltage is up
    let mut pmm = unsafe { Pmm::steal() };
    let mut ucs = Ucs::new(CPU_FREQ);
    if bring_up(&mut pmm, &mut ucs, VCore::Level3).is_ok() {
        CLOCK_FREQ.store(ucs.frequency(), Ordering::Relaxed);
    }

    let scheduler: &'static _ = SCHEDULER.init(init_scheduler(
        watchdog,
        TickClock::Vlo,
        VLO_FREQ,
        SchedulerConfig::default().with_tick_freq(TICK_FREQ),
    ));

    // Pull-ups on both buttons
    gpio::modify(P2REN, |v| v | BIT1);
    gpio::modify(P2OUT, |v| v | BIT1);
    gpio::modify(P1REN, |v| v | BIT1);
    gpio::modify(P1OUT, |v| v | BIT1);

    scheduler.register(red_task, RED_STACK.take()).unwrap();
    scheduler.register(green_task, GREEN_STACK.take()).unwrap();
    scheduler.register(button_task, BUTTON_STACK.take()).unwrap();

    scheduler.start();
}

fn delay() -> BusyDelay {
    BusyDelay::new(CLOCK_FREQ.load(Ordering::Relaxed))
}

extern "C" fn red_task() -> ! {
    let mut delay = delay();
    gpio::modify(P1DIR, |v| v | BIT0);

    loop {
        if RED_ENABLED.get() {
            delay.delay_ms(240);
            gpio::modify(P1OUT, |v| v ^ BIT0);
        }
    }
}

extern "C" fn green_task() -> ! {
    let mut delay = delay();
    gpio::modify(P4DIR, |v| v | BIT7);

    loop {
        if GREEN_ENABLED.get() {
            delay.delay_ms(80);
            gpio::modify(P4OUT, |v| v ^ BIT7);
        }
    }
}

extern "C" fn button_task() -> ! {
    let mut delay = delay();

    loop {
        // Buttons pull the pin low
        if gpio::read(P2IN) & BIT1 == 0 {
            RED_ENABLED.toggle();
        }
        if gpio::read(P1IN) & BIT1 == 0 {
            GREEN_ENABLED.toggle();
        }

        // Software debouncing
        delay.delay_ms(10);
    }
}
