use crate::{arch, libc::errno::Errno};

pub const PROT_READ: usize = 1;
pub const PROT_WRITE: usize = 2;
pub const PROT_EXEC: usize = 4;

pub const MAP_PRIVATE: usize = 0x02;
pub const MAP_FIXED: usize = 0x10;
pub const MAP_ANONYMOUS: usize = 0x20;

/// `mmap(2)`. A `file_descriptor` of `-1` together with `MAP_ANONYMOUS`
/// requests zeroed memory.
pub unsafe fn mmap(
    address: *mut u8,
    length: usize,
    protection: usize,
    flags: usize,
    file_descriptor: i32,
    offset: usize,
) -> Result<*mut u8, Errno> {
    let result = arch::mmap(address, length, protection, flags, file_descriptor, offset);
    Errno::from_return(result).map(|address| address as *mut u8)
}

pub unsafe fn munmap(address: *mut u8, length: usize) -> Result<(), Errno> {
    Errno::from_return(arch::munmap(address, length)).map(drop)
}

pub unsafe fn bcmp(left_pointer: *const u8, right_pointer: *const u8, length: usize) -> i32 {
    memcmp(left_pointer, right_pointer, length)
}

pub unsafe fn memmove(destination: *mut u8, source: *const u8, number_of_bytes: usize) -> *mut u8 {
    arch::memmove(destination, source, number_of_bytes)
}

pub unsafe fn memcpy(
    destination: *mut u8,
    source: *const u8,
    number_of_bytes_to_copy: usize,
) -> *mut u8 {
    arch::memcpy(destination, source, number_of_bytes_to_copy)
}

pub unsafe fn memset(destination: *mut u8, byte: i32, number_of_bytes_to_set: usize) -> *mut u8 {
    arch::memset(destination, byte as u8, number_of_bytes_to_set)
}

pub unsafe fn memcmp(
    left_pointer: *const u8,
    right_pointer: *const u8,
    length_of_comparison: usize,
) -> i32 {
    arch::memcmp(left_pointer, right_pointer, length_of_comparison)
}
