//! Register frame of a suspended task.
//!
//! On interrupt entry the MSP430X CPU pushes `PC[15:0]` and then a word holding `PC[19:16]` in
//! its top nibble and `SR[11:0]` below. The context switch then pushes R4 to R15. Seen from the
//! saved stack pointer upwards a suspended task therefore looks like:
//!
//! ```text
//! sp + 0   R15
//! ...
//! sp + 22  R4
//! sp + 24  PC[19:16] << 12 | SR[11:0]
//! sp + 26  PC[15:0]
//! ```

use core::mem::size_of;

/// Number of general-purpose registers saved by software (R4 to R15).
pub const BACKUP_REGS: usize = 12;

/// General interrupt enable
pub const GIE: u16 = 0x0008;
/// Turns the FLL off; needed for the 25 MHz DCO setting
pub const SCG0: u16 = 0x0040;
/// Status register a task starts with. GIE makes the first restore also open the tick.
pub const DEFAULT_SR: u16 = GIE | SCG0;

/// Width of the program counter.
pub const PC_MASK: u32 = 0x000F_FFFF;
const SR_MASK: u16 = 0x0FFF;

/// Size in bytes of a complete frame.
pub const FRAME_SIZE: usize =
    size_of::<SoftwareSavedRegisters>() + size_of::<HardwareSavedRegisters>();

/// Merges the upper four bits of a 20-bit `pc` into the status word pushed by interrupt entry.
pub const fn pack_sr_pc(sr: u16, pc: u32) -> u16 {
    (((pc & 0x000F_0000) >> 4) as u16) | (sr & SR_MASK)
}

/// Splits the status word and the low PC word back into `(sr, pc)`.
pub const fn unpack_sr_pc(sr_pc: u16, pc_low: u16) -> (u16, u32) {
    let pc = (((sr_pc & !SR_MASK) as u32) << 4) | pc_low as u32;
    (sr_pc & SR_MASK, pc)
}

/// Program counter of a code address.
pub const fn pc_of(addr: usize) -> u32 {
    addr as u32 & PC_MASK
}

#[repr(C, align(2))]
#[derive(Clone, Debug)]
struct HardwareSavedRegisters {
    sr_pc: u16,
    pc_low: u16,
}

impl HardwareSavedRegisters {
    fn from_pc(pc: u32) -> Self {
        Self {
            sr_pc: pack_sr_pc(DEFAULT_SR, pc),
            pc_low: pc as u16,
        }
    }
}

/// Registers pushed by the context switch, lowest address first.
#[repr(C, align(2))]
#[derive(Clone, Debug, Default)]
struct SoftwareSavedRegisters {
    r15: u16,
    r14: u16,
    r13: u16,
    r12: u16,
    r11: u16,
    r10: u16,
    r9: u16,
    r8: u16,
    r7: u16,
    r6: u16,
    r5: u16,
    r4: u16,
}

/// Decoded view of a suspended task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// R4 to R15
    pub registers: [u16; BACKUP_REGS],
    pub sr: u16,
    pub pc: u32,
}

impl Frame {
    /// Decodes the frame a saved stack pointer points at.
    ///
    /// # Safety
    /// `sp` must point at [`FRAME_SIZE`] readable bytes laid out by a context save or by
    /// [`init_stack`].
    pub unsafe fn read(sp: *const u8) -> Self {
        let (software, hardware) = unsafe {
            (
                core::ptr::read(sp as *const SoftwareSavedRegisters),
                core::ptr::read(
                    sp.byte_add(size_of::<SoftwareSavedRegisters>())
                        as *const HardwareSavedRegisters,
                ),
            )
        };
        let (sr, pc) = unpack_sr_pc(hardware.sr_pc, hardware.pc_low);

        Self {
            registers: [
                software.r4,
                software.r5,
                software.r6,
                software.r7,
                software.r8,
                software.r9,
                software.r10,
                software.r11,
                software.r12,
                software.r13,
                software.r14,
                software.r15,
            ],
            sr,
            pc,
        }
    }
}

/// Builds the frame of a task that has not run yet, as if it had been interrupted right before
/// its first instruction, and returns the stack pointer to restore it from.
///
/// # Safety
/// `sp` must be the 2-byte aligned end of a writable region of at least [`FRAME_SIZE`] bytes.
pub unsafe fn init_stack(sp: *mut u8, pc: usize) -> *mut u8 {
    unsafe {
        let sp = push_to_stack(
            sp,
            &HardwareSavedRegisters::from_pc(pc_of(pc)) as *const _ as *const u8,
            size_of::<HardwareSavedRegisters>(),
        );
        push_to_stack(
            sp,
            &SoftwareSavedRegisters::default() as *const _ as *const u8,
            size_of::<SoftwareSavedRegisters>(),
        )
    }
}

unsafe fn push_to_stack(sp: *mut u8, obj: *const u8, obj_size: usize) -> *mut u8 {
    unsafe {
        // Keep word alignment
        let size = obj_size + obj_size % 2;

        let sp = sp.byte_sub(size);
        core::ptr::copy(obj, sp, obj_size);

        sp
    }
}
