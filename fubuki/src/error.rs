use {std::io, thiserror::Error};

/// Result of fallible generator operations.
pub type Result<T> =
    std::result::Result<T, Error>;

/// Error raised while creating or driving a generator.
#[derive(Debug, Error)]
pub enum Error
{
    /// The stack for a new generator could not be mapped.
    #[error("Cannot allocate a stack of {size} bytes: {source}")]
    AllocateStack
    {
        /// Requested size in bytes, excluding the guard page.
        size: usize,

        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// The page size could not be determined.
    #[error("Cannot determine the page size: {0}")]
    PageSize(#[source] io::Error),

    /// A stack of zero pages was requested.
    #[error("Stack must span at least one page")]
    ZeroStackSize,

    /// A value was yielded while no generator routine was running.
    #[error("Yield outside of a generator routine")]
    NotInRoutine,

    /// A value was yielded to a generator of a different value type.
    #[error("Yield of `{found}` inside a generator of `{expected}`")]
    TypeMismatch
    {
        /// Value type of the running generator.
        expected: &'static str,

        /// Type of the yielded value.
        found: &'static str,
    },
}
