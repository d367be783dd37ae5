//! Test that the clock is only reconfigured after the core voltage is raised


use railsched::{Error, VCore, boot::bring_up};
use utils::{Event, SimClock, SimPmm};

#[test]
fn clock_follows_successful_ramp() {
    let mut pmm = SimPmm::new(None);
    let mut clock = SimClock {
        journal: pmm.journal.clone(),
    };

    assert_eq!(bring_up(&mut pmm, &mut clock, VCore::Level3), Ok(VCore::Level3));
    assert_eq!(
        pmm.journal.borrow().as_slice(),
        [
            Event::CoreLevel(VCore::Level1),
            Event::CoreLevel(VCore::Level2),
            Event::CoreLevel(VCore::Level3),
            Event::ClockConfigured,
        ]
    );
}

#[test]
fn clock_untouched_after_failed_ramp() {
    let mut pmm = SimPmm::new(Some(VCore::Level3));
    let mut clock = SimClock {
        journal: pmm.journal.clone(),
    };

    assert_eq!(
        bring_up(&mut pmm, &mut clock, VCore::Level3),
        Err(Error::InsufficientSupply {
            level: VCore::Level3
        })
    );
    assert_eq!(pmm.level, VCore::Level2);
    assert!(!pmm.journal.borrow().contains(&Event::ClockConfigured));
}

#[test]
fn clock_untouched_when_asked_to_step_down() {
    let mut pmm = SimPmm::new(None);
    pmm.level = VCore::Level2;
    let mut clock = SimClock::default();

    assert!(matches!(
        bring_up(&mut pmm, &mut clock, VCore::Level1),
        Err(Error::StepDownUnsupported { .. })
    ));
    assert!(clock.journal.borrow().is_empty());
}
