//! Stackful coroutines and generators built on them.
//!
//! A [`Generator`] runs a routine on a stack of its own.
//! The routine may call [`yield_`] at any call depth to hand a value to
//! whoever called [`Generator::resume`], and continues right after that
//! call on the next resume. Control moves between exactly two contexts
//! per generator, the caller's and the routine's, by a symmetric switch
//! that saves and restores a fixed set of registers.
//!
//! ```
//! use fubuki::{Generator, yield_};
//!
//! fn countdown(n: u32)
//! {
//!     if n > 0 {
//!         yield_(n);
//!         countdown(n - 1);
//!     }
//! }
//!
//! let mut generator = Generator::<u32>::new(|| countdown(3));
//! assert_eq!(generator.resume(), Some(3));
//! assert_eq!(generator.iter().collect::<Vec<_>>(), [2, 1]);
//! assert_eq!(generator.resume(), None);
//! ```
//!
//! Everything runs on the thread that drives the generator.
//! A blocking call in a routine blocks that thread.
//! Panics must not escape a routine; if one does, the process aborts.

#![warn(missing_docs)]

pub use self::{
    context::ExecutionContext,
    error::*,
    generator::*,
    iter::*,
    stack::*,
};

pub mod context;
pub mod walk;

mod current;
mod error;
mod generator;
mod iter;
mod stack;
