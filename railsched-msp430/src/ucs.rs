//! Unified Clock System: DCO driven by the FLL from the 32.768 kHz REFO.

/// FLL reference frequency (REFO)
pub const FLL_REFERENCE: u32 = 32_768;

/// `UCSCTL3`: FLL reference is REFO
pub const SELREF_2: u16 = 0x0020;
/// `UCSCTL1`: DCO range for up to 50 MHz
pub const DCORSEL_7: u16 = 0x0070;
/// `UCSCTL4`: SMCLK from DCOCLKDIV
pub const SELS_4: u16 = 0x0040;
/// `UCSCTL4`: MCLK from DCOCLKDIV
pub const SELM_4: u16 = 0x0004;
const FLLN_MASK: u16 = 0x03FF;

/// DCO configuration driving MCLK and SMCLK.
///
/// Only valid once the core voltage supports `dco_freq`, which is why it is applied through
/// [`railsched::boot::bring_up`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ucs {
    dco_freq: u32,
}

impl Ucs {
    pub const fn new(dco_freq: u32) -> Self {
        Self { dco_freq }
    }

    pub const fn frequency(&self) -> u32 {
        self.dco_freq
    }

    /// `FLLN` such that `(FLLN + 1) * FLL_REFERENCE` is closest to the requested frequency.
    pub const fn fll_multiplier(&self) -> u16 {
        let n = (self.dco_freq + FLL_REFERENCE / 2) / FLL_REFERENCE;
        (n.saturating_sub(1) as u16) & FLLN_MASK
    }

    /// Worst-case DCO settling time after a range change, in MCLK cycles (32 x 32 reference
    /// periods).
    pub const fn settle_cycles(&self) -> u32 {
        (self.dco_freq / FLL_REFERENCE) * 32 * 32
    }
}

#[cfg(target_arch = "msp430")]
impl railsched::boot::ClockControl for Ucs {
    fn configure(&mut self) {
        use crate::regs;

        unsafe {
            regs::write16(regs::UCSCTL3, SELREF_2);
            // FLL off while the DCO taps are reset
            core::arch::asm!("bis.w #0x40, r2", options(nomem, nostack));
            regs::write16(regs::UCSCTL0, 0);
            regs::write16(regs::UCSCTL1, DCORSEL_7);
            regs::write16(regs::UCSCTL2, self.fll_multiplier());
            core::arch::asm!("bic.w #0x40, r2", options(nomem, nostack));
        }

        // Each iteration takes more than one cycle
        for _ in 0..self.settle_cycles() {
            msp430::asm::nop();
        }

        unsafe {
            regs::modify16(regs::UCSCTL4, |value| value | SELS_4 | SELM_4);
        }
    }
}
