//! Generators backed by stackful coroutines.
//!
//! A generator runs its routine on a stack of its own.
//! The routine hands values to the caller with [`yield_`],
//! which may be called at any depth of nested function calls.
//! Each [`Generator::resume`] continues the routine right after the
//! yield that suspended it, with every frame of the routine intact.

use {
    crate::{
        ExecutionContext,
        Result,
        Stack,
        context::Entry,
        current,
        stack::DEFAULT_STACK_PAGES,
    },
    std::{
        cell::{Cell, UnsafeCell},
        fmt,
        marker::PhantomData,
        mem::{ManuallyDrop, transmute},
        panic::{AssertUnwindSafe, catch_unwind},
        process::abort,
        thread,
    },
    tracing::{debug, error, trace},
};

/// Routine with its borrows erased, see [`Builder::build`].
type Routine = Box<dyn FnOnce()>;

/// Lifecycle of a generator.
///
/// A generator moves from `NotStarted` to `Running` on its first resume,
/// then between `Running` and `Suspended` for every yield,
/// and ends in `Completed` when its routine returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State
{
    /// The routine has not run yet.
    NotStarted,

    /// The routine is running, so a resume is active on the call stack.
    Running,

    /// The routine yielded and waits for the next resume.
    Suspended,

    /// The routine returned. This state is terminal.
    Completed,
}

/// Configures and creates generators.
#[derive(Clone, Debug)]
pub struct Builder
{
    stack_pages: usize,
}

impl Builder
{
    /// Builder with a stack of [`DEFAULT_STACK_PAGES`] pages.
    pub fn new() -> Self
    {
        Self{stack_pages: DEFAULT_STACK_PAGES}
    }

    /// Set the number of usable stack pages.
    ///
    /// The routine and everything it calls must fit on this stack.
    pub fn stack_pages(mut self, pages: usize) -> Self
    {
        self.stack_pages = pages;
        self
    }

    /// Create a generator that runs `routine` on the first resume.
    pub fn build<'a, T, F>(self, routine: F) -> Result<Generator<'a, T>>
        where T: 'static, F: FnOnce() + 'a
    {
        let stack = Stack::new(self.stack_pages)?;

        let routine: Box<dyn FnOnce() + 'a> = Box::new(routine);
        // SAFETY: Only the lifetime changes. The routine only runs during
        //         resume, which borrows the generator, which lives for 'a.
        let routine = unsafe { transmute::<_, Routine>(routine) };

        let shared = Box::new(Shared{
            state: Cell::new(State::NotStarted),
            routine: Cell::new(Some(routine)),
            result: Cell::new(None),
            routine_context: UnsafeCell::new(ExecutionContext::new()),
            caller_context: UnsafeCell::new(ExecutionContext::new()),
        });

        let entry: Entry = trampoline::<T>;
        let arg = &*shared as *const Shared<T> as *mut ();
        // SAFETY: The generator owns the stack and the shared state,
        //         and only it switches into the routine context.
        unsafe { (*shared.routine_context.get()).setup(&stack, entry, arg); }

        debug!(
            stack_size = stack.len(),
            value_type = std::any::type_name::<T>(),
            "created generator"
        );

        Ok(Generator{
            shared: ManuallyDrop::new(shared),
            stack: ManuallyDrop::new(stack),
            _routine: PhantomData,
        })
    }
}

impl Default for Builder
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Routine on its own stack that produces values of type `T`.
///
/// Create one with [`Generator::new`] or [`Builder`].
/// Drive it with [`resume`](`Self::resume`) or iterate it.
///
/// The routine must run to completion before the generator is dropped.
/// Dropping a generator whose routine is suspended panics,
/// because the frames left on its stack can never be unwound.
/// Those frames may still be borrowed (by a scoped thread, for example),
/// so the stack and the shared state are leaked rather than released.
pub struct Generator<'a, T>
    where T: 'static
{
    /// Boxed, so the routine can refer to it while the generator moves.
    /// Released by drop only once no routine frames remain.
    shared: ManuallyDrop<Box<Shared<T>>>,

    /// Released by drop only once no routine frames remain.
    stack: ManuallyDrop<Stack>,

    /// The routine borrows for 'a. Generators stay on their thread,
    /// because the routine stack may refer to thread-local state.
    _routine: PhantomData<(&'a (), *mut ())>,
}

/// State shared between the caller side and the routine side.
pub (crate) struct Shared<T>
{
    state: Cell<State>,

    /// Taken by the trampoline when the routine starts.
    routine: Cell<Option<Routine>>,

    /// Set by a yield and taken by the resume it returns to.
    /// Empty at every other time, so no value is ever delivered twice.
    result: Cell<Option<T>>,

    routine_context: UnsafeCell<ExecutionContext>,

    /// Overwritten by every resume.
    caller_context: UnsafeCell<ExecutionContext>,
}

impl<'a, T> Generator<'a, T>
    where T: 'static
{
    /// Create a generator with the default configuration.
    ///
    /// Panics if the stack cannot be allocated.
    pub fn new<F>(routine: F) -> Self
        where F: FnOnce() + 'a
    {
        Self::try_new(routine)
            .expect("Cannot create a generator")
    }

    /// Create a generator with the default configuration.
    pub fn try_new<F>(routine: F) -> Result<Self>
        where F: FnOnce() + 'a
    {
        Builder::new().build(routine)
    }

    /// Run the routine until it yields or returns.
    ///
    /// Returns the yielded value, or [`None`] when the routine returned.
    /// Once the routine has returned, every further call returns [`None`]
    /// without running anything.
    pub fn resume(&mut self) -> Option<T>
    {
        let shared: &Shared<T> = &self.shared;

        match shared.state.get() {
            State::Completed => return None,
            State::Running => unreachable!("Generator resumed while running"),
            State::NotStarted | State::Suspended => (),
        }

        shared.state.set(State::Running);

        {
            let _enter = current::enter(shared);
            // SAFETY: The routine context was set up by Builder::build,
            //         and it is suspended because the state was not Running.
            unsafe {
                ExecutionContext::switch_to(
                    shared.caller_context.get(),
                    shared.routine_context.get(),
                );
            }
        }

        shared.result.take()
    }

    /// Hand `value` to the running generator of this type and suspend.
    ///
    /// Same as the free function [`yield_`].
    pub fn yield_(value: T)
    {
        yield_(value)
    }

    /// The current lifecycle state.
    pub fn state(&self) -> State
    {
        self.shared.state.get()
    }

    /// Whether the routine has returned.
    pub fn is_completed(&self) -> bool
    {
        self.state() == State::Completed
    }

    /// Number of usable bytes on the routine stack.
    pub fn stack_size(&self) -> usize
    {
        self.stack.len()
    }
}

impl<T> Drop for Generator<'_, T>
    where T: 'static
{
    fn drop(&mut self)
    {
        match self.shared.state.get() {
            State::NotStarted | State::Completed => {
                // SAFETY: No frames remain on the stack,
                //         and neither field is used after this.
                unsafe {
                    ManuallyDrop::drop(&mut self.shared);
                    ManuallyDrop::drop(&mut self.stack);
                }
            },
            State::Running | State::Suspended => {
                // Frames on the stack are abandoned without being dropped,
                // and may still be borrowed. Keep the mapping alive.
                error!(
                    stack_size = self.stack.len(),
                    "generator dropped before its routine completed; \
                     leaking its stack"
                );
                if !thread::panicking() {
                    panic!("Generator dropped before its routine completed");
                }
            },
        }
    }
}

impl<T> fmt::Debug for Generator<'_, T>
    where T: 'static
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("Generator")
            .field("state", &self.state())
            .field("stack_size", &self.stack_size())
            .finish_non_exhaustive()
    }
}

/// Hand `value` to the generator whose routine is running and suspend.
///
/// The matching [`Generator::resume`] returns `Some(value)`.
/// This call returns when the generator is resumed again.
///
/// Panics if no generator routine runs on this thread, or if the running
/// generator yields a different type. Inside a routine, that panic
/// aborts the process, see [`try_yield`].
pub fn yield_<T>(value: T)
    where T: 'static
{
    if let Err(err) = try_yield(value) {
        panic!("{}", err);
    }
}

/// Like [`yield_`], but reports misuse as an error.
///
/// On error, `value` is dropped and nothing is suspended.
pub fn try_yield<T>(value: T) -> Result<()>
    where T: 'static
{
    let shared = current::get::<T>()?;
    // SAFETY: The slot only names generators with an active resume,
    //         and their shared state lives at least as long.
    let shared = unsafe { shared.as_ref() };

    debug_assert_eq!(shared.state.get(), State::Running);

    shared.result.set(Some(value));
    shared.state.set(State::Suspended);

    // SAFETY: The caller context was filled in by the active resume.
    unsafe {
        ExecutionContext::switch_to(
            shared.routine_context.get(),
            shared.caller_context.get(),
        );
    }

    Ok(())
}

/// Entry point of every routine context.
///
/// The frame of this function lives at the top of the routine stack
/// for as long as the routine runs. It never returns; its last act is
/// switching back to the caller after marking the generator completed.
unsafe extern "C" fn trampoline<T>(arg: *mut ()) -> !
    where T: 'static
{
    let shared = &*arg.cast::<Shared<T>>();

    if let Some(routine) = shared.routine.take() {
        // Unwinding cannot continue past the top of this stack.
        if catch_unwind(AssertUnwindSafe(routine)).is_err() {
            error!("generator routine panicked");
            abort();
        }
    }

    shared.state.set(State::Completed);
    drop(shared.result.take());

    trace!("generator routine completed");

    ExecutionContext::switch_to(
        shared.routine_context.get(),
        shared.caller_context.get(),
    );

    // Completed generators are never switched into again.
    abort()
}
