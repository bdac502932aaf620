//! Contexts for AArch64 with the AAPCS64 calling convention.
//!
//! A suspended context's stack pointer points at this frame:
//!
//! ```text
//! sp + 0x00   x19  x20
//! sp + 0x10   x21  x22
//! sp + 0x20   x23  x24
//! sp + 0x30   x25  x26
//! sp + 0x40   x27  x28
//! sp + 0x50   x29  x30 (return address)
//! sp + 0x60   d8   d9
//! sp + 0x70   d10  d11
//! sp + 0x80   d12  d13
//! sp + 0x90   d14  d15
//! ```

use {
    super::{Entry, ExecutionContext},
    std::{arch::global_asm, mem::size_of},
};

extern "C"
{
    /// Store callee-saved registers, store the stack pointer into `from`,
    /// load the stack pointer from `to`, load callee-saved registers,
    /// and return into `to`.
    pub fn fubuki_switch_context(
        from: *mut ExecutionContext,
        to:   *const ExecutionContext,
    );

    /// First code to run on a fresh stack.
    ///
    /// Calls x20 with x19 as its argument. That call never returns.
    fn fubuki_context_start();
}

global_asm!(
    ".text",
    ".p2align 4",
    ".global fubuki_switch_context",
    ".hidden fubuki_switch_context",
    ".type fubuki_switch_context, %function",
    "fubuki_switch_context:",
    "    sub sp, sp, #0xa0",
    "    stp x19, x20, [sp, #0x00]",
    "    stp x21, x22, [sp, #0x10]",
    "    stp x23, x24, [sp, #0x20]",
    "    stp x25, x26, [sp, #0x30]",
    "    stp x27, x28, [sp, #0x40]",
    "    stp x29, x30, [sp, #0x50]",
    "    stp d8,  d9,  [sp, #0x60]",
    "    stp d10, d11, [sp, #0x70]",
    "    stp d12, d13, [sp, #0x80]",
    "    stp d14, d15, [sp, #0x90]",
    "    mov x9, sp",
    "    str x9, [x0]",
    "    ldr x9, [x1]",
    "    mov sp, x9",
    "    ldp x19, x20, [sp, #0x00]",
    "    ldp x21, x22, [sp, #0x10]",
    "    ldp x23, x24, [sp, #0x20]",
    "    ldp x25, x26, [sp, #0x30]",
    "    ldp x27, x28, [sp, #0x40]",
    "    ldp x29, x30, [sp, #0x50]",
    "    ldp d8,  d9,  [sp, #0x60]",
    "    ldp d10, d11, [sp, #0x70]",
    "    ldp d12, d13, [sp, #0x80]",
    "    ldp d14, d15, [sp, #0x90]",
    "    add sp, sp, #0xa0",
    "    ret",
    ".size fubuki_switch_context, . - fubuki_switch_context",
    "",
    ".p2align 4",
    ".global fubuki_context_start",
    ".hidden fubuki_context_start",
    ".type fubuki_context_start, %function",
    "fubuki_context_start:",
    "    mov x0, x19",
    "    blr x20",
    "    brk #0",
    ".size fubuki_context_start, . - fubuki_context_start",
);

/// Frame loaded by the first switch into a fresh context.
#[repr(C)]
struct InitialFrame
{
    x19_x28: [usize; 10],
    x29: usize,
    x30: usize,
    d8_d15: [u64; 8],
}

/// Required alignment of the stack pointer at all times.
const STACK_ALIGN: usize = 16;

/// Write an initial frame below `top` and return the stack pointer to it.
///
/// After the switch loads the frame and pops it,
/// the stack pointer equals the aligned top
/// and the return lands in `fubuki_context_start`.
pub unsafe fn prepare(top: *mut u8, entry: Entry, arg: *mut ()) -> *mut u8
{
    let top = top.sub(top as usize % STACK_ALIGN);
    let frame = top.sub(size_of::<InitialFrame>()).cast::<InitialFrame>();

    let mut x19_x28 = [0; 10];
    x19_x28[0] = arg as usize;
    x19_x28[1] = entry as usize;

    frame.write(InitialFrame{
        x19_x28,
        // Terminates frame pointer chains.
        x29: 0,
        x30: fubuki_context_start as unsafe extern "C" fn() as usize,
        d8_d15: [0; 8],
    });

    frame.cast()
}
