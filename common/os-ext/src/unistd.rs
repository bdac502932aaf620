use std::{io, sync::OnceLock};

/// Call sysconf(3) with the given argument.
///
/// Limits that are indeterminate (sysconf returns -1 without setting
/// `errno`) are reported as [`None`].
pub fn sysconf(name: libc::c_int) -> io::Result<Option<libc::c_long>>
{
    // sysconf(3) does not clear errno on success.
    // SAFETY: This is always safe.
    unsafe { *libc::__errno_location() = 0; }

    // SAFETY: This is always safe.
    let result = unsafe { libc::sysconf(name) };

    if result == -1 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(0) => Ok(None),
            _       => Err(err),
        };
    }

    Ok(Some(result))
}

/// The size of a memory page in bytes.
///
/// The value is obtained from `sysconf(_SC_PAGESIZE)`
/// and cached after the first successful call.
/// It is always a power of two.
/// If the limit is indeterminate, the call fails with `EINVAL`.
pub fn page_size() -> io::Result<usize>
{
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

    if let Some(&size) = PAGE_SIZE.get() {
        return Ok(size);
    }

    let size = match sysconf(libc::_SC_PAGESIZE)? {
        Some(size) if size > 0 => size as usize,
        _ => return Err(io::Error::from_raw_os_error(libc::EINVAL)),
    };

    Ok(*PAGE_SIZE.get_or_init(|| size))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn page_size_is_power_of_two()
    {
        let size = page_size().unwrap();
        assert!(size.is_power_of_two());
        assert!(size >= 4096);
    }

    #[test]
    fn page_size_matches_sysconf()
    {
        let size = sysconf(libc::_SC_PAGESIZE).unwrap().unwrap();
        assert_eq!(page_size().unwrap(), size as usize);

        // The cached value is served on later calls.
        assert_eq!(page_size().unwrap(), size as usize);
    }

    #[test]
    fn sysconf_rejects_unknown_name()
    {
        let err = sysconf(-1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }
}
