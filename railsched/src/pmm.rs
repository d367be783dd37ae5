//! Core voltage (VCore) stepping through the Power Management Module.
//!
//! The core voltage has to be raised before the CPU clock is, one level at a time. Each step
//! first moves the high-side supervisor to the new level as a probe; if the supply is too weak
//! the step is rolled back before the level register is touched.

use critical_section::CriticalSection;

use crate::{Error, debug, info, warn};

/// Register bit definitions of the PMM.
pub mod bits {
    /// `PMMCTL0`
    pub const PMMCOREV0: u16 = 0x0001;
    pub const PMMCOREV1: u16 = 0x0002;
    pub const PMMCOREV_MASK: u16 = PMMCOREV0 | PMMCOREV1;
    /// Password unlocking the PMM registers when written to the high byte of `PMMCTL0`.
    pub const PMMPW_H: u8 = 0xA5;

    /// `SVSMHCTL`
    pub const SVSMHRRL0: u16 = 0x0001;
    pub const SVSMHRRL1: u16 = 0x0002;
    pub const SVSMHRRL2: u16 = 0x0004;
    pub const SVSMHDLYST: u16 = 0x0008;
    pub const SVSHMD: u16 = 0x0010;
    pub const SVSMHEVM: u16 = 0x0040;
    pub const SVSMHACE: u16 = 0x0080;
    pub const SVSHRVL0: u16 = 0x0100;
    pub const SVSHRVL1: u16 = 0x0200;
    pub const SVSHE: u16 = 0x0400;
    pub const SVSHFP: u16 = 0x0800;
    pub const SVMHOVPE: u16 = 0x1000;
    pub const SVMHE: u16 = 0x4000;
    pub const SVMHFP: u16 = 0x8000;
    pub const SVSMHCTL_LEVEL_BITS: u16 = SVSHRVL0 | SVSHRVL1 | SVSMHRRL0 | SVSMHRRL1 | SVSMHRRL2;

    /// `SVSMLCTL`
    pub const SVSMLRRL0: u16 = 0x0001;
    pub const SVSMLRRL1: u16 = 0x0002;
    pub const SVSMLRRL2: u16 = 0x0004;
    pub const SVSMLDLYST: u16 = 0x0008;
    pub const SVSLMD: u16 = 0x0010;
    pub const SVSMLEVM: u16 = 0x0040;
    pub const SVSMLACE: u16 = 0x0080;
    pub const SVSLRVL0: u16 = 0x0100;
    pub const SVSLRVL1: u16 = 0x0200;
    pub const SVSLE: u16 = 0x0400;
    pub const SVSLFP: u16 = 0x0800;
    pub const SVMLOVPE: u16 = 0x1000;
    pub const SVMLE: u16 = 0x4000;
    pub const SVMLFP: u16 = 0x8000;
    pub const SVSMLCTL_LEVEL_BITS: u16 = SVSLRVL0 | SVSLRVL1 | SVSMLRRL0 | SVSMLRRL1 | SVSMLRRL2;

    /// `PMMIFG`
    pub const SVSMLDLYIFG: u16 = 0x0001;
    pub const SVMLIFG: u16 = 0x0002;
    pub const SVMLVLRIFG: u16 = 0x0004;
    pub const SVSMHDLYIFG: u16 = 0x0010;
    pub const SVMHIFG: u16 = 0x0020;
    pub const SVMHVLRIFG: u16 = 0x0040;
    pub const SUPERVISOR_FLAGS: u16 =
        SVMHVLRIFG | SVMHIFG | SVSMHDLYIFG | SVMLVLRIFG | SVMLIFG | SVSMLDLYIFG;

    /// `PMMRIE`
    pub const SVSMLDLYIE: u16 = 0x0001;
    pub const SVMLIE: u16 = 0x0002;
    pub const SVMLVLRIE: u16 = 0x0004;
    pub const SVSMHDLYIE: u16 = 0x0010;
    pub const SVMHIE: u16 = 0x0020;
    pub const SVMHVLRIE: u16 = 0x0040;
    pub const SVSLPE: u16 = 0x0100;
    pub const SVMLVLRPE: u16 = 0x0200;
    pub const SVSHPE: u16 = 0x1000;
    pub const SVMHVLRPE: u16 = 0x2000;
    /// Resets and interrupts that could fire while the supervisors are being moved.
    pub const SUPERVISOR_EVENTS: u16 = SVMHVLRPE
        | SVSHPE
        | SVMLVLRPE
        | SVSLPE
        | SVMHVLRIE
        | SVMHIE
        | SVSMHDLYIE
        | SVMLVLRIE
        | SVMLIE
        | SVSMLDLYIE;
}

use bits::*;

/// Core voltage level. Higher levels allow higher clock frequencies.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VCore {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
}

impl VCore {
    pub const MAX: VCore = VCore::Level3;

    /// Decodes the `PMMCOREV` field of `PMMCTL0`.
    pub const fn from_bits(bits: u16) -> Self {
        match bits & PMMCOREV_MASK {
            0 => VCore::Level0,
            1 => VCore::Level1,
            2 => VCore::Level2,
            _ => VCore::Level3,
        }
    }

    pub const fn bits(self) -> u16 {
        self as u16
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            VCore::Level0 => Some(VCore::Level1),
            VCore::Level1 => Some(VCore::Level2),
            VCore::Level2 => Some(VCore::Level3),
            VCore::Level3 => None,
        }
    }

    /// Level fields of `SVSMHCTL` (reset voltage and release level) for this level.
    pub const fn high_side_bits(self) -> u16 {
        SVSHRVL0 * self.bits() | SVSMHRRL0 * self.bits()
    }

    /// Level fields of `SVSMLCTL` (reset voltage and release level) for this level.
    pub const fn low_side_bits(self) -> u16 {
        SVSLRVL0 * self.bits() | SVSMLRRL0 * self.bits()
    }
}

impl TryFrom<u8> for VCore {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Error> {
        match level {
            0 => Ok(VCore::Level0),
            1 => Ok(VCore::Level1),
            2 => Ok(VCore::Level2),
            3 => Ok(VCore::Level3),
            _ => Err(Error::InvalidLevel),
        }
    }
}

/// 16-bit PMM registers accessed by the step sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// `SVSMHCTL`
    HighSideControl,
    /// `SVSMLCTL`
    LowSideControl,
    /// `PMMIFG`
    InterruptFlags,
    /// `PMMRIE`
    InterruptEnable,
}

/// Control surface of the core voltage regulator and its supervisors.
pub trait RegulatorControl {
    /// Opens the PMM registers for writing.
    fn unlock(&mut self);
    fn lock(&mut self);
    fn core_level(&self) -> VCore;
    /// Programs `PMMCOREV`.
    fn set_core_level(&mut self, level: VCore);
    fn read(&self, reg: Register) -> u16;
    fn write(&mut self, reg: Register, value: u16);

    fn modify(&mut self, reg: Register, f: impl FnOnce(u16) -> u16) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// Registers that are put back after a step whatever its outcome.
struct Backup {
    interrupt_enable: u16,
    high_side: u16,
    low_side: u16,
}

/// Busy-waits until every bit of `mask` is set in `PMMIFG`.
fn wait_for<R: RegulatorControl>(regulator: &R, mask: u16) {
    while regulator.read(Register::InterruptFlags) & mask != mask {
        core::hint::spin_loop();
    }
}

fn clear_flags<R: RegulatorControl>(regulator: &mut R, mask: u16) {
    regulator.modify(Register::InterruptFlags, |flags| flags & !mask);
}

/// Raises the core voltage by one level to `level`.
///
/// Requires interrupts to be masked for its whole duration. On `InsufficientSupply` the level
/// and the supervisor and interrupt-enable registers are left exactly as they were.
pub fn step_up<R: RegulatorControl>(
    _cs: CriticalSection<'_>,
    regulator: &mut R,
    level: VCore,
) -> Result<(), Error> {
    if regulator.core_level().next() != Some(level) {
        return Err(Error::InvalidLevel);
    }

    regulator.unlock();

    let backup = Backup {
        interrupt_enable: regulator.read(Register::InterruptEnable),
        high_side: regulator.read(Register::HighSideControl),
        low_side: regulator.read(Register::LowSideControl),
    };
    regulator.write(
        Register::InterruptEnable,
        backup.interrupt_enable & !SUPERVISOR_EVENTS,
    );
    regulator.write(Register::InterruptFlags, 0);

    // Probe: move the high-side monitor to the new level and see whether Vcc keeps up
    regulator.write(
        Register::HighSideControl,
        SVMHE | SVSHE | SVSMHRRL0 * level.bits(),
    );
    wait_for(regulator, SVSMHDLYIFG);
    clear_flags(regulator, SVSMHDLYIFG);

    if regulator.read(Register::InterruptFlags) & SVMHIFG != 0 {
        regulator.write(Register::HighSideControl, backup.high_side);
        wait_for(regulator, SVSMHDLYIFG);
        clear_flags(regulator, SUPERVISOR_FLAGS);

        regulator.write(Register::InterruptEnable, backup.interrupt_enable);
        regulator.lock();

        return Err(Error::InsufficientSupply { level });
    }

    // Vcc is high enough: protect the high side at the new level too
    regulator.modify(Register::HighSideControl, |value| {
        value | SVSHRVL0 * level.bits()
    });
    wait_for(regulator, SVSMHDLYIFG);
    clear_flags(regulator, SVSMHDLYIFG);

    regulator.set_core_level(level);

    regulator.write(
        Register::LowSideControl,
        SVMLE | SVSLE | level.low_side_bits(),
    );
    wait_for(regulator, SVSMLDLYIFG);
    clear_flags(regulator, SVSMLDLYIFG);

    // Put back the previous supervisor configuration with only the level fields replaced
    regulator.modify(Register::LowSideControl, |value| {
        (value & SVSMLCTL_LEVEL_BITS) | (backup.low_side & !SVSMLCTL_LEVEL_BITS)
    });
    regulator.modify(Register::HighSideControl, |value| {
        (value & SVSMHCTL_LEVEL_BITS) | (backup.high_side & !SVSMHCTL_LEVEL_BITS)
    });
    wait_for(regulator, SVSMLDLYIFG | SVSMHDLYIFG);
    clear_flags(regulator, SUPERVISOR_FLAGS);

    regulator.write(Register::InterruptEnable, backup.interrupt_enable);
    regulator.lock();

    Ok(())
}

/// Raises the core voltage step by step up to `target`.
///
/// Interrupts stay masked during the whole ramp and are restored to their previous state
/// afterwards. Returns the reached level, or the level of the step that failed.
pub fn ramp_to<R: RegulatorControl>(regulator: &mut R, target: VCore) -> Result<VCore, Error> {
    let ramped = critical_section::with(|cs| {
        let mut current = regulator.core_level();
        if target < current {
            return Err(Error::StepDownUnsupported { current, target });
        }

        while current < target {
            let Some(next) = current.next() else {
                unreachable!()
            };
            step_up(cs, regulator, next)?;
            debug!("VCore stepped to level {}", next as u8);
            current = next;
        }

        Ok(current)
    });

    match &ramped {
        Ok(level) => info!("VCore at level {}", *level as u8),
        Err(Error::InsufficientSupply { level }) => {
            warn!("Supply too low for VCore level {}", *level as u8)
        }
        Err(_) => {}
    }

    ramped
}
