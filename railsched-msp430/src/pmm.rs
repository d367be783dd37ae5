//! Memory-mapped binding of the Power Management Module.

use railsched::{
    VCore,
    pmm::{Register, RegulatorControl, bits::PMMPW_H},
};

use crate::regs;

/// The PMM registers of the running part.
#[derive(Debug)]
pub struct Pmm {
    _private: (),
}

impl Pmm {
    /// # Safety
    /// Only one `Pmm` may exist, and nothing else may touch the PMM registers while it does.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }

    const fn address(reg: Register) -> usize {
        match reg {
            Register::HighSideControl => regs::SVSMHCTL,
            Register::LowSideControl => regs::SVSMLCTL,
            Register::InterruptFlags => regs::PMMIFG,
            Register::InterruptEnable => regs::PMMRIE,
        }
    }
}

impl RegulatorControl for Pmm {
    fn unlock(&mut self) {
        unsafe { regs::write8(regs::PMMCTL0_H, PMMPW_H) }
    }

    fn lock(&mut self) {
        // Any value other than the password locks
        unsafe { regs::write8(regs::PMMCTL0_H, 0) }
    }

    fn core_level(&self) -> VCore {
        VCore::from_bits(unsafe { regs::read16(regs::PMMCTL0) })
    }

    fn set_core_level(&mut self, level: VCore) {
        // Byte access leaves the password in the high byte alone
        unsafe { regs::write8(regs::PMMCTL0, level as u8) }
    }

    fn read(&self, reg: Register) -> u16 {
        unsafe { regs::read16(Self::address(reg)) }
    }

    fn write(&mut self, reg: Register, value: u16) {
        unsafe { regs::write16(Self::address(reg), value) }
    }
}
