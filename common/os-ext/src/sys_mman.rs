use std::{io, ptr::{NonNull, null_mut}};

/// Call mmap(2) to create an anonymous private mapping.
///
/// The mapping is not backed by any file, so `fd` is -1 and `offset` is 0.
/// `MAP_ANONYMOUS | MAP_PRIVATE` is added to `flags` implicitly.
pub fn mmap_anonymous(
    length: usize,
    prot:   libc::c_int,
    flags:  libc::c_int,
) -> io::Result<NonNull<u8>>
{
    let flags = flags | libc::MAP_ANONYMOUS | libc::MAP_PRIVATE;

    // SAFETY: A null hint never replaces an existing mapping.
    let ptr = unsafe {
        libc::mmap(
            /* addr   */ null_mut(),
            /* length */ length,
            /* prot   */ prot,
            /* flags  */ flags,
            /* fd     */ -1,
            /* offset */ 0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    // mmap(2) reports failure through MAP_FAILED, never through null.
    NonNull::new(ptr.cast::<u8>())
        .ok_or_else(|| io::Error::from_raw_os_error(libc::ENOMEM))
}

/// Call munmap(2) with the given arguments.
///
/// # Safety
///
/// Nothing may access the unmapped memory afterwards.
pub unsafe fn munmap(addr: NonNull<u8>, length: usize) -> io::Result<()>
{
    let result = libc::munmap(addr.as_ptr().cast(), length);

    if result == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Call mprotect(2) with the given arguments.
///
/// # Safety
///
/// Revoking access from memory that is still in use
/// turns later accesses into faults.
pub unsafe fn mprotect(addr: NonNull<u8>, length: usize, prot: libc::c_int)
    -> io::Result<()>
{
    let result = libc::mprotect(addr.as_ptr().cast(), length, prot);

    if result == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[cfg(test)]
mod tests
{
    use {super::*, crate::{PROT_NONE, PROT_READ, PROT_WRITE, page_size}};

    #[test]
    fn mmap_anonymous_is_page_aligned_and_zeroed()
    {
        let len = 3 * page_size().unwrap();
        let ptr = mmap_anonymous(len, PROT_READ | PROT_WRITE, 0).unwrap();
        assert_eq!(ptr.as_ptr() as usize % page_size().unwrap(), 0);

        // SAFETY: The mapping is readable and len bytes long.
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) };
        assert!(bytes.iter().all(|&b| b == 0));

        unsafe { munmap(ptr, len).unwrap(); }
    }

    #[test]
    fn mprotect_rejects_unaligned_address()
    {
        let len = page_size().unwrap();
        let ptr = mmap_anonymous(len, PROT_READ | PROT_WRITE, 0).unwrap();

        // SAFETY: The address is inside the mapping.
        let unaligned = unsafe { NonNull::new_unchecked(ptr.as_ptr().add(1)) };
        let err = unsafe { mprotect(unaligned, 1, PROT_NONE) }.unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));

        unsafe { munmap(ptr, len).unwrap(); }
    }

    #[test]
    fn mmap_anonymous_zero_length_fails()
    {
        let err = mmap_anonymous(0, PROT_READ, 0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }
}
