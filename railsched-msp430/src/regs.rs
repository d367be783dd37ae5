//! Peripheral addresses of the MSP430F5529.

pub const SFRIE1: usize = 0x0100;

pub const PMMCTL0: usize = 0x0120;
pub const PMMCTL0_H: usize = PMMCTL0 + 1;
pub const SVSMHCTL: usize = 0x0124;
pub const SVSMLCTL: usize = 0x0126;
pub const PMMIFG: usize = 0x012C;
pub const PMMRIE: usize = 0x012E;

pub const WDTCTL: usize = 0x015C;

pub const UCSCTL0: usize = 0x0160;
pub const UCSCTL1: usize = 0x0162;
pub const UCSCTL2: usize = 0x0164;
pub const UCSCTL3: usize = 0x0166;
pub const UCSCTL4: usize = 0x0168;

/// # Safety
/// `addr` must be a readable 16-bit peripheral register.
#[inline(always)]
pub unsafe fn read16(addr: usize) -> u16 {
    unsafe { core::ptr::read_volatile(addr as *const u16) }
}

/// # Safety
/// `addr` must be a writable 16-bit peripheral register.
#[inline(always)]
pub unsafe fn write16(addr: usize, value: u16) {
    unsafe { core::ptr::write_volatile(addr as *mut u16, value) }
}

/// # Safety
/// `addr` must be a writable byte of a peripheral register.
#[inline(always)]
pub unsafe fn write8(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

/// # Safety
/// Same as [`read16`] and [`write16`].
#[inline(always)]
pub unsafe fn modify16(addr: usize, f: impl FnOnce(u16) -> u16) {
    unsafe { write16(addr, f(read16(addr))) }
}
