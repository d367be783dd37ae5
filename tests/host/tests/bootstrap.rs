//! Test of task registration and the one-time entry into task #0


use railsched::{Error, StackAllocation, scheduler::CANARY_LEN};
use railsched_msp430::frame::{DEFAULT_SR, FRAME_SIZE, pc_of};
use serial_test::serial;
use utils::{Cpu, scheduler, stack, start, task0, task1, task2};

#[test]
#[serial]
fn start_enters_task_zero_and_arms_the_tick() {
    let scheduler = scheduler::<3>(250);
    let first = scheduler.register(task0, stack()).unwrap();
    let second = scheduler.register(task1, stack()).unwrap();
    let third = scheduler.register(task2, stack()).unwrap();
    assert_eq!([first.id(), second.id(), third.id()], [0, 1, 2]);
    assert_eq!(scheduler.current_task(), Err(Error::NotStarted));

    let entered = start(scheduler);
    assert_eq!(entered.tick_freq, Some(250));
    assert_eq!(scheduler.current_task(), Ok(0));

    let cpu = Cpu::enter(entered.sp);
    assert_eq!(cpu.pc, pc_of(task0 as usize));
    assert_eq!(cpu.sr, DEFAULT_SR);
}

#[test]
fn registration_is_bounded_by_task_count() {
    let scheduler = scheduler::<2>(1000);
    scheduler.register(task0, stack()).unwrap();
    scheduler.register(task1, stack()).unwrap();

    assert_eq!(
        scheduler.register(task2, stack()).map(|task| task.id()),
        Err(Error::TaskFull)
    );
}

struct Slice(&'static mut [u8]);

impl StackAllocation for Slice {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

fn slice(len: usize) -> Slice {
    Slice(Box::leak(vec![0xEE; len].into_boxed_slice()))
}

#[test]
fn stack_must_hold_frame_and_canary() {
    let scheduler = scheduler::<1>(1000);
    let min = FRAME_SIZE + CANARY_LEN;

    for len in [4, CANARY_LEN, min - 2] {
        assert_eq!(
            scheduler.register(task0, slice(len)).map(|task| task.id()),
            Err(Error::StackTooSmall { len, min })
        );
    }
    assert_eq!(scheduler.register(task0, slice(min)).map(|task| task.id()), Ok(0));
}

#[test]
#[serial]
fn registration_closes_once_started() {
    let scheduler = scheduler::<1>(1000);
    scheduler.register(task0, stack()).unwrap();
    start(scheduler);

    assert_eq!(
        scheduler.register(task1, stack()).map(|task| task.id()),
        Err(Error::AlreadyStarted)
    );
}

#[test]
#[should_panic(expected = "Scheduler started with 2 of 3 tasks registered")]
fn start_requires_every_task() {
    let scheduler = scheduler::<3>(1000);
    scheduler.register(task0, stack()).unwrap();
    scheduler.register(task1, stack()).unwrap();

    start(scheduler);
}

#[test]
#[serial]
#[should_panic(expected = "Scheduler already started")]
fn start_only_once() {
    let scheduler = scheduler::<1>(1000);
    scheduler.register(task0, stack()).unwrap();
    start(scheduler);

    start(scheduler);
}
