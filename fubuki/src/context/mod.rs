//! Suspended execution contexts and the symmetric switch between them.
//!
//! An [`ExecutionContext`] is a single stack pointer.
//! Everything else a suspended context needs (callee-saved registers and
//! the address to resume at) is pushed onto its own stack by the switch.
//! The register set and frame layout are target-specific;
//! each supported target has its own module implementing them.

use {
    crate::Stack,
    std::ptr::null_mut,
};

#[cfg_attr(target_arch = "x86_64", path = "x86_64.rs")]
#[cfg_attr(target_arch = "aarch64", path = "aarch64.rs")]
mod arch;

#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64"),
)))]
compile_error!("fubuki only supports Linux on x86_64 and aarch64");

/// Function at which a freshly set up context starts running.
///
/// It receives the argument passed to [`ExecutionContext::setup`].
/// It must never return, because there is no frame to return to.
/// Its only way out is switching to another context.
pub type Entry = unsafe extern "C" fn(arg: *mut ()) -> !;

/// Snapshot of a suspended point of execution.
#[repr(C)]
pub struct ExecutionContext
{
    /// Stack pointer at the last suspension point.
    ///
    /// The switch routines read and write this field directly.
    sp: *mut u8,
}

impl ExecutionContext
{
    /// Create a context that is not set up.
    ///
    /// Such a context may only be used as the `from` side of a switch,
    /// which fills it in.
    pub const fn new() -> Self
    {
        Self{sp: null_mut()}
    }

    /// Prepare the context so that the next switch into it
    /// calls `entry(arg)` on a fresh frame at the top of `stack`.
    ///
    /// # Safety
    ///
    ///  - `stack` must outlive every switch into this context.
    ///  - Nothing else may run on `stack` while this context is in use.
    pub unsafe fn setup(&mut self, stack: &Stack, entry: Entry, arg: *mut ())
    {
        self.sp = arch::prepare(stack.top().as_ptr(), entry, arg);
    }

    /// Save the running context into `from` and continue at `to`.
    ///
    /// The call returns once another switch names `from` as its target.
    /// In the meantime, arbitrary code may have run on other stacks.
    ///
    /// # Safety
    ///
    ///  - `from` must be valid for writes and `to` valid for reads.
    ///  - `to` must have been set up or filled in by an earlier switch,
    ///    and must not be running.
    pub unsafe fn switch_to(from: *mut Self, to: *const Self)
    {
        debug_assert!(!(*to).sp.is_null(), "Switch into a blank context");
        arch::fubuki_switch_context(from, to);
    }
}

impl Default for ExecutionContext
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod tests
{
    use {
        super::*,
        std::cell::{Cell, UnsafeCell},
    };

    /// A main context and one other context that bounce control back and
    /// forth, counting how often the other context ran.
    struct PingPong
    {
        main: UnsafeCell<ExecutionContext>,
        other: UnsafeCell<ExecutionContext>,
        hits: Cell<u32>,
        aligned: Cell<bool>,
    }

    #[repr(align(16))]
    struct Aligned([u8; 16]);

    unsafe extern "C" fn bounce(arg: *mut ()) -> !
    {
        let ping_pong = &*arg.cast::<PingPong>();

        // The compiler assumes an ABI-aligned frame and does not realign.
        let local = Aligned([0; 16]);
        let addr = &local as *const Aligned as usize;
        ping_pong.aligned.set(addr % 16 == 0);

        loop {
            ping_pong.hits.set(ping_pong.hits.get() + 1);
            ExecutionContext::switch_to(ping_pong.other.get(), ping_pong.main.get());
            std::hint::black_box(&local);
        }
    }

    fn ping_pong() -> PingPong
    {
        PingPong{
            main: UnsafeCell::new(ExecutionContext::new()),
            other: UnsafeCell::new(ExecutionContext::new()),
            hits: Cell::new(0),
            aligned: Cell::new(false),
        }
    }

    #[test]
    fn switch_round_trips()
    {
        let stack = Stack::new(4).unwrap();
        let ping_pong = ping_pong();
        let arg = &ping_pong as *const PingPong as *mut ();

        unsafe { (*ping_pong.other.get()).setup(&stack, bounce, arg); }
        assert_eq!(ping_pong.hits.get(), 0);

        for expected in 1 ..= 5 {
            unsafe {
                ExecutionContext::switch_to(
                    ping_pong.main.get(),
                    ping_pong.other.get(),
                );
            }
            assert_eq!(ping_pong.hits.get(), expected);
        }
    }

    #[test]
    fn entry_frame_is_aligned()
    {
        let stack = Stack::new(1).unwrap();
        let ping_pong = ping_pong();
        let arg = &ping_pong as *const PingPong as *mut ();

        unsafe {
            (*ping_pong.other.get()).setup(&stack, bounce, arg);
            ExecutionContext::switch_to(ping_pong.main.get(), ping_pong.other.get());
        }

        assert!(ping_pong.aligned.get());
    }

    #[test]
    fn caller_locals_survive_switch()
    {
        let stack = Stack::new(4).unwrap();
        let ping_pong = ping_pong();
        let arg = &ping_pong as *const PingPong as *mut ();
        unsafe { (*ping_pong.other.get()).setup(&stack, bounce, arg); }

        let values: Vec<u64> = (0 .. 32).map(|i| i * i).collect();
        let mut sum = 0;
        for (i, value) in values.iter().enumerate() {
            unsafe {
                ExecutionContext::switch_to(
                    ping_pong.main.get(),
                    ping_pong.other.get(),
                );
            }
            sum += value;
            assert_eq!(ping_pong.hits.get() as usize, i + 1);
        }

        assert_eq!(sum, values.iter().sum::<u64>());
    }
}
