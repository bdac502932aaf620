//! Memory for routine call stacks.

use {
    crate::{Error, Result},
    os_ext::{MAP_NORESERVE, MAP_STACK, PROT_NONE, PROT_READ, PROT_WRITE},
    std::{io, ptr::NonNull},
    tracing::{trace, warn},
};

/// Number of pages in a stack unless configured otherwise.
pub const DEFAULT_STACK_PAGES: usize = 16;

/// Owned, fixed-size call stack.
///
/// The stack is an anonymous private mapping of one guard page
/// followed by the requested number of usable pages.
/// Stacks grow down, so the guard page sits below the lowest usable byte;
/// running off the end faults instead of corrupting adjacent memory.
/// Nothing else checks bounds.
///
/// ```text
/// base            bottom                                  top
///  | guard page    | usable pages ...                      |
/// ```
pub struct Stack
{
    /// Start of the mapping, which is the start of the guard page.
    base: NonNull<u8>,

    /// Length of the mapping, including the guard page.
    mapping_len: usize,

    /// Length of the guard page.
    guard_len: usize,
}

impl Stack
{
    /// Map a stack with the given number of usable pages.
    pub fn new(pages: usize) -> Result<Self>
    {
        if pages == 0 {
            return Err(Error::ZeroStackSize);
        }

        let page_size = os_ext::page_size().map_err(Error::PageSize)?;

        let too_large = |size| Error::AllocateStack{
            size,
            source: io::Error::from_raw_os_error(libc::ENOMEM),
        };
        let size = pages.checked_mul(page_size)
            .ok_or_else(|| too_large(usize::MAX))?;
        let mapping_len = size.checked_add(page_size)
            .ok_or_else(|| too_large(size))?;

        let base = os_ext::mmap_anonymous(
            mapping_len,
            PROT_READ | PROT_WRITE,
            MAP_STACK | MAP_NORESERVE,
        ).map_err(|source| Error::AllocateStack{size, source})?;

        // From here on, dropping `this` unmaps the memory.
        let this = Self{base, mapping_len, guard_len: page_size};

        // SAFETY: Nothing uses the guard page.
        unsafe { os_ext::mprotect(base, page_size, PROT_NONE) }
            .map_err(|source| Error::AllocateStack{size, source})?;

        trace!(size, "mapped stack");

        Ok(this)
    }

    /// Number of usable bytes, excluding the guard page.
    pub fn len(&self) -> usize
    {
        self.mapping_len - self.guard_len
    }

    /// Lowest usable address.
    pub fn bottom(&self) -> NonNull<u8>
    {
        // SAFETY: The guard page is part of the mapping.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(self.guard_len)) }
    }

    /// One past the highest usable address.
    ///
    /// This is where a fresh call frame starts.
    /// It is page-aligned, so it satisfies every ABI stack alignment.
    pub fn top(&self) -> NonNull<u8>
    {
        // SAFETY: One past the end of the mapping is a valid pointer.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(self.mapping_len)) }
    }
}

impl Drop for Stack
{
    fn drop(&mut self)
    {
        // SAFETY: base and mapping_len come from Stack::new,
        //         and the owner no longer runs code on this stack.
        let result = unsafe { os_ext::munmap(self.base, self.mapping_len) };

        match result {
            Ok(()) => trace!(size = self.len(), "unmapped stack"),
            Err(err) => warn!(%err, "cannot unmap stack"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use {super::*, proptest::proptest};

    #[test]
    fn zero_pages_is_rejected()
    {
        assert!(matches!(Stack::new(0), Err(Error::ZeroStackSize)));
    }

    #[test]
    fn absurd_size_is_rejected()
    {
        let err = Stack::new(usize::MAX).err().unwrap();
        assert!(matches!(err, Error::AllocateStack{..}));
    }

    proptest!
    {
        #[test]
        fn stack_is_page_sized_and_aligned(pages in 1usize .. 64)
        {
            let stack = Stack::new(pages).unwrap();
            let page_size = os_ext::page_size().unwrap();

            assert_eq!(stack.len(), pages * page_size);
            assert_eq!(stack.top().as_ptr() as usize % page_size, 0);
            assert_eq!(
                stack.top().as_ptr() as usize - stack.bottom().as_ptr() as usize,
                stack.len(),
            );

            // Both ends of the usable range are writable.
            // SAFETY: These addresses are within the usable range.
            unsafe {
                stack.bottom().as_ptr().write(0xAA);
                stack.top().as_ptr().sub(1).write(0x55);
                assert_eq!(stack.bottom().as_ptr().read(), 0xAA);
                assert_eq!(stack.top().as_ptr().sub(1).read(), 0x55);
            }
        }
    }
}
