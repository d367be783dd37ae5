//! Bring-up ordering: core voltage first, clock second.
//!
//! Task stacks are synthesized afterwards by [`crate::Scheduler::register`] and the first task is
//! entered by [`crate::Scheduler::start`].

use crate::{
    Error, VCore, info,
    pmm::{self, RegulatorControl},
    warn,
};

/// Clock tree configuration that needs the core voltage already raised.
pub trait ClockControl {
    fn configure(&mut self);
}

/// Ramps the core voltage to `target` and only then configures the clock.
///
/// If the ramp fails the clock is left untouched and the error is returned; the part keeps
/// running at its reset frequency with the last committed voltage.
pub fn bring_up<R: RegulatorControl, C: ClockControl>(
    regulator: &mut R,
    clock: &mut C,
    target: VCore,
) -> Result<VCore, Error> {
    let level = pmm::ramp_to(regulator, target).inspect_err(|_| {
        warn!("Clock left at reset configuration");
    })?;

    clock.configure();
    info!("Clock configured at VCore level {}", level as u8);

    Ok(level)
}
