//! Test of a flag shared between two tasks preempted in the middle of an update
//!
//! Task #0 flips the flag, task #1 toggles it atomically. Each time slice runs one step of the
//! current task; the step counter lives in R5 and the loaded value in R4, so both only survive
//! through the context switch.


use railsched_utils::SharedFlag;
use serial_test::serial;
use utils::{Cpu, boot, task0, task1};

const R4: usize = 0;
const R5: usize = 1;

fn run_slice(cpu: &mut Cpu, task: usize, flag: &SharedFlag, atomic: bool) {
    let step = cpu.regs[R5];
    match (task, step) {
        (0, 0) if atomic => {
            flag.toggle();
        }
        (0, 0) => cpu.regs[R4] = flag.get() as u16,
        (0, 1) if !atomic => flag.set(cpu.regs[R4] == 0),
        (1, 0) => {
            flag.toggle();
            // Clobber whatever task #0 left in R4
            cpu.regs[R4] = 0xFFFF;
        }
        _ => {}
    }
    cpu.regs[R5] = step + 1;
}

fn flips_after_two_updates(atomic: bool) -> bool {
    let (scheduler, mut cpu) = boot([task0, task1]);
    let flag = SharedFlag::new(false);

    for _ in 0..4 {
        let task = scheduler.current_task().unwrap();
        run_slice(&mut cpu, task, &flag, atomic);
        cpu.tick();
    }

    flag.get()
}

#[test]
#[serial]
fn load_store_update_is_lost_when_preempted() {
    // Two flips from `false` should give `false`
    assert!(flips_after_two_updates(false));
}

#[test]
#[serial]
fn toggle_is_not_split_by_the_tick() {
    assert!(!flips_after_two_updates(true));
}
