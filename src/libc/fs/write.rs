use core::ffi::c_void;

use crate::arch;

pub const STD_ERR: i32 = 2;

pub(crate) unsafe fn write(
    file_descriptor: i32,
    buffer_pointer: *const c_void,
    buffer_length_in_bytes: usize,
) -> isize {
    arch::write(file_descriptor, buffer_pointer, buffer_length_in_bytes)
}

/// Writes all of `bytes` to a file descriptor, giving up on the first error.
pub fn write_all(file_descriptor: i32, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let written = unsafe { write(file_descriptor, bytes.as_ptr().cast(), bytes.len()) };
        if written <= 0 {
            return;
        }
        bytes = &bytes[written as usize..];
    }
}

/// Helper function to write a string slice to a file descriptor
pub fn write_str(file_descriptor: i32, s: &str) {
    write_all(file_descriptor, s.as_bytes());
}

/// `core::fmt` sink for unbuffered writes to standard error.
pub struct Stderr;

impl core::fmt::Write for Stderr {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        write_str(STD_ERR, s);
        Ok(())
    }
}
