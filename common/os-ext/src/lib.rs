//! Extra items for talking to the operating system.
//!
//! This crate provides a safe, low-level interface to the operating system.
//! The functions in this crate are named after their underlying system calls,
//! and their behavior is identical except for the differences listed below.
//! The exact semantics of each function can be found in their man pages.
//! This is in contrast with the std crate, which gives no such guarantees.
//! This is a trade-off against cross-platform compatibility.
//!
//! # Differences with underlying system calls
//!
//! Errors are reported using [`Result`] rather than
//! through `errno` and an arbitrary return value.
//!
//! Memory mappings are handed out as [`NonNull<u8>`] rather than
//! as untyped pointers, and [`mmap_anonymous`] never takes a file.
//!
//! [`Result`]: `std::io::Result`
//! [`NonNull<u8>`]: `std::ptr::NonNull`

#![warn(missing_docs)]

pub use {
    self::{sys_mman::*, unistd::*},
    libc::{
        MAP_NORESERVE, MAP_STACK,
        PROT_NONE, PROT_READ, PROT_WRITE,
    },
};

mod sys_mman;
mod unistd;
