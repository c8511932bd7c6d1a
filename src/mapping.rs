use core::{mem, ptr};

use crate::libc::{errno::Errno, mem as sys};

/// An owned region of the address space, unmapped on drop.
#[derive(Debug)]
pub struct Mapping {
    address: *mut u8,
    length: usize,
}

impl Mapping {
    /// Maps `length` bytes of `file_descriptor` at `offset` wherever the
    /// kernel finds room.
    pub fn map_file(
        length: usize,
        protection: usize,
        file_descriptor: i32,
        offset: usize,
    ) -> Result<Self, Errno> {
        let address = unsafe {
            sys::mmap(
                ptr::null_mut(),
                length,
                protection,
                sys::MAP_PRIVATE,
                file_descriptor,
                offset,
            )?
        };
        Ok(Self { address, length })
    }

    pub fn address(&self) -> usize {
        self.address as usize
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn contains(&self, start: usize, length: usize) -> bool {
        start >= self.address() && start.saturating_add(length) <= self.address() + self.length
    }

    /// Gives up ownership: the region stays mapped for the rest of the
    /// process' life, e.g. as part of the image control is handed to.
    pub fn leak(self) -> (usize, usize) {
        let region = (self.address(), self.length);
        mem::forget(self);
        region
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // Nothing useful can be done about a failure here.
        let _ = unsafe { sys::munmap(self.address, self.length) };
    }
}

/// Replaces pages inside an owned region. The result belongs to `within`.
///
/// # Safety
///
/// `[address, address + length)` must lie inside `within` and may not be
/// referenced by any live Rust value.
pub unsafe fn map_fixed(
    within: &Mapping,
    address: usize,
    length: usize,
    protection: usize,
    file_descriptor: Option<i32>,
    offset: usize,
) -> Result<(), Errno> {
    debug_assert!(within.contains(address, length));
    let (flags, file_descriptor) = match file_descriptor {
        Some(file_descriptor) => (sys::MAP_PRIVATE | sys::MAP_FIXED, file_descriptor),
        None => (sys::MAP_PRIVATE | sys::MAP_FIXED | sys::MAP_ANONYMOUS, -1),
    };
    sys::mmap(
        address as *mut u8,
        length,
        protection,
        flags,
        file_descriptor,
        offset,
    )
    .map(drop)
}
