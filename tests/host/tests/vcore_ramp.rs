//! Test of the core voltage step and ramp against a simulated PMM


use railsched::{
    Error, VCore,
    pmm::{
        self,
        bits::{SUPERVISOR_FLAGS, SVSMHCTL_LEVEL_BITS, SVSMLCTL_LEVEL_BITS},
        ramp_to, step_up,
    },
};
use utils::SimPmm;

const LEVELS: [VCore; 4] = [VCore::Level0, VCore::Level1, VCore::Level2, VCore::Level3];

#[test]
fn successful_step_replaces_only_level_bits() {
    for level in [VCore::Level1, VCore::Level2, VCore::Level3] {
        let mut pmm = SimPmm::new(None);
        pmm.level = LEVELS[level as usize - 1];
        let (high_side, low_side, enable) = pmm.snapshot();

        critical_section::with(|cs| step_up(cs, &mut pmm, level)).unwrap();

        assert_eq!(pmm.level, level);
        assert_eq!(
            pmm.high_side,
            (high_side & !SVSMHCTL_LEVEL_BITS) | level.high_side_bits()
        );
        assert_eq!(
            pmm.low_side,
            (low_side & !SVSMLCTL_LEVEL_BITS) | level.low_side_bits()
        );
        assert_eq!(pmm.enable, enable);
        assert_eq!(pmm.flags & SUPERVISOR_FLAGS, 0);
        assert!(pmm.locked);
    }
}

#[test]
fn failed_step_leaves_everything_in_place() {
    for level in [VCore::Level1, VCore::Level2, VCore::Level3] {
        let mut pmm = SimPmm::new(Some(level));
        pmm.level = LEVELS[level as usize - 1];
        let before = pmm.snapshot();

        let result = critical_section::with(|cs| step_up(cs, &mut pmm, level));

        assert_eq!(result, Err(Error::InsufficientSupply { level }));
        assert_eq!(pmm.level, LEVELS[level as usize - 1]);
        assert_eq!(pmm.snapshot(), before);
        assert_eq!(pmm.flags & SUPERVISOR_FLAGS, 0);
        assert!(pmm.locked);
        assert!(pmm.journal.borrow().is_empty());
    }
}

#[test]
fn step_must_be_exactly_one_level() {
    let mut pmm = SimPmm::new(None);

    for level in [VCore::Level0, VCore::Level2, VCore::Level3] {
        let result = critical_section::with(|cs| step_up(cs, &mut pmm, level));
        assert_eq!(result, Err(Error::InvalidLevel));
    }
    assert_eq!(pmm.level, VCore::Level0);
    assert!(pmm.locked);
}

#[test]
fn ramp_reaches_target_one_level_at_a_time() {
    let mut pmm = SimPmm::new(None);

    assert_eq!(ramp_to(&mut pmm, VCore::Level3), Ok(VCore::Level3));
    assert_eq!(
        pmm.journal.borrow().as_slice(),
        [
            utils::Event::CoreLevel(VCore::Level1),
            utils::Event::CoreLevel(VCore::Level2),
            utils::Event::CoreLevel(VCore::Level3),
        ]
    );
}

#[test]
fn ramp_stops_at_first_shortfall() {
    let mut pmm = SimPmm::new(Some(VCore::Level2));

    // Registers as they are once level 1 is committed
    let mut reference = SimPmm::new(None);
    ramp_to(&mut reference, VCore::Level1).unwrap();

    assert_eq!(
        ramp_to(&mut pmm, VCore::Level3),
        Err(Error::InsufficientSupply {
            level: VCore::Level2
        })
    );
    assert_eq!(pmm.level, VCore::Level1);
    assert_eq!(pmm.snapshot(), reference.snapshot());
    assert_eq!(pmm.journal.borrow().len(), 1);
}

#[test]
fn ramp_never_lowers_the_level() {
    for start in LEVELS {
        for target in LEVELS {
            for shortfall in [None, Some(VCore::Level1), Some(VCore::Level2), Some(VCore::Level3)] {
                let mut pmm = SimPmm::new(shortfall);
                pmm.level = start;

                let result = ramp_to(&mut pmm, target);
                assert!(pmm.level >= start);
                match result {
                    Ok(level) => {
                        assert_eq!(level, target);
                        assert_eq!(pmm.level, target);
                    }
                    Err(Error::InsufficientSupply { level }) => {
                        assert!(start < target && level <= target);
                        assert!(shortfall.is_some_and(|limit| level >= limit));
                        // Highest committed level is the one below the failed step
                        assert_eq!(pmm.level.next(), Some(level));
                    }
                    Err(Error::StepDownUnsupported { current, target: requested }) => {
                        assert_eq!((current, requested), (start, target));
                        assert!(target < start);
                        assert_eq!(pmm.level, start);
                    }
                    Err(error) => panic!("Unexpected {:?}", error),
                }
            }
        }
    }
}

#[test]
fn ramp_to_current_level_is_a_no_op() {
    let mut pmm = SimPmm::new(Some(VCore::Level1));
    let before = pmm.snapshot();

    assert_eq!(ramp_to(&mut pmm, VCore::Level0), Ok(VCore::Level0));
    assert_eq!(pmm.snapshot(), before);
    assert!(pmm.locked);
}

#[test]
fn step_down_is_rejected_without_touching_the_pmm() {
    let mut pmm = SimPmm::new(None);
    ramp_to(&mut pmm, VCore::Level2).unwrap();
    let before = pmm.snapshot();

    assert_eq!(
        pmm::ramp_to(&mut pmm, VCore::Level1),
        Err(Error::StepDownUnsupported {
            current: VCore::Level2,
            target: VCore::Level1
        })
    );
    assert_eq!(pmm.level, VCore::Level2);
    assert_eq!(pmm.snapshot(), before);
}
