//! Test of stack overflow detection in the context switch


use railsched::scheduler::TickHandler;
use serial_test::serial;
use utils::{STACK_SIZE, boot, task0, task1};

// The diagnostics panic, which cannot unwind through the `extern "C"` tick entry, so these tests
// switch through the scheduler directly.

#[test]
#[serial]
#[should_panic(expected = "Stack overflow detected in task #0")]
fn overwritten_canary_is_detected() {
    let (scheduler, mut cpu) = boot([task0, task1]);

    // A local buffer as large as the whole stack
    cpu.scribble(STACK_SIZE, 0);
    cpu.tick_with(|sp| scheduler.switch_context(sp));
}

#[test]
#[serial]
#[should_panic(expected = "Stack overflow detected in task #1")]
fn stack_pointer_outside_the_region_is_detected() {
    let (scheduler, mut cpu) = boot([task0, task1]);
    cpu.tick_with(|sp| scheduler.switch_context(sp));

    let elsewhere: &'static mut [u8; 64] = Box::leak(Box::new([0; 64]));
    cpu.sp = elsewhere.as_mut_ptr_range().end as usize;
    cpu.tick_with(|sp| scheduler.switch_context(sp));
}

#[test]
#[serial]
fn deep_but_bounded_usage_is_fine() {
    let (scheduler, mut cpu) = boot([task0, task1]);

    // Leaves the canary and room for the frame pushed by the tick
    cpu.scribble(STACK_SIZE / 2, 0);
    cpu.tick_with(|sp| scheduler.switch_context(sp));
    cpu.tick_with(|sp| scheduler.switch_context(sp));

    assert_eq!(scheduler.current_task(), Ok(0));
}
