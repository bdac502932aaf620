//! Contexts for x86-64 with the System V calling convention.
//!
//! A suspended context's stack pointer points at this frame:
//!
//! ```text
//! sp + 0x00   r15
//! sp + 0x08   r14
//! sp + 0x10   r13
//! sp + 0x18   r12
//! sp + 0x20   rbx
//! sp + 0x28   rbp
//! sp + 0x30   return address
//! ```

use {
    super::{Entry, ExecutionContext},
    std::{arch::global_asm, mem::size_of},
};

extern "C"
{
    /// Push callee-saved registers, store the stack pointer into `from`,
    /// load the stack pointer from `to`, pop callee-saved registers,
    /// and return into `to`.
    pub fn fubuki_switch_context(
        from: *mut ExecutionContext,
        to:   *const ExecutionContext,
    );

    /// First code to run on a fresh stack.
    ///
    /// Calls r13 with r12 as its argument. That call never returns.
    fn fubuki_context_start();
}

global_asm!(
    ".text",
    ".p2align 4",
    ".global fubuki_switch_context",
    ".hidden fubuki_switch_context",
    ".type fubuki_switch_context, @function",
    "fubuki_switch_context:",
    "    push rbp",
    "    push rbx",
    "    push r12",
    "    push r13",
    "    push r14",
    "    push r15",
    "    mov [rdi], rsp",
    "    mov rsp, [rsi]",
    "    pop r15",
    "    pop r14",
    "    pop r13",
    "    pop r12",
    "    pop rbx",
    "    pop rbp",
    "    ret",
    ".size fubuki_switch_context, . - fubuki_switch_context",
    "",
    ".p2align 4",
    ".global fubuki_context_start",
    ".hidden fubuki_context_start",
    ".type fubuki_context_start, @function",
    "fubuki_context_start:",
    "    mov rdi, r12",
    "    call r13",
    "    ud2",
    ".size fubuki_context_start, . - fubuki_context_start",
);

/// Frame popped by the first switch into a fresh context.
#[repr(C)]
struct InitialFrame
{
    r15: usize,
    r14: usize,
    r13: usize,
    r12: usize,
    rbx: usize,
    rbp: usize,
    rip: usize,
}

/// Required alignment of the stack pointer at a call instruction.
const STACK_ALIGN: usize = 16;

/// Write an initial frame below `top` and return the stack pointer to it.
///
/// After the switch pops the frame and returns,
/// the stack pointer equals the aligned top.
/// `fubuki_context_start` then calls `entry`,
/// whose prologue sees the usual pushed return address.
pub unsafe fn prepare(top: *mut u8, entry: Entry, arg: *mut ()) -> *mut u8
{
    let top = top.sub(top as usize % STACK_ALIGN);
    let frame = top.sub(size_of::<InitialFrame>()).cast::<InitialFrame>();

    frame.write(InitialFrame{
        r15: 0,
        r14: 0,
        r13: entry as usize,
        r12: arg as usize,
        rbx: 0,
        // Terminates frame pointer chains.
        rbp: 0,
        rip: fubuki_context_start as unsafe extern "C" fn() as usize,
    });

    frame.cast()
}
