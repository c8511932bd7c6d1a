use core::ffi::CStr;

use crate::{arch, libc::errno::Errno};

pub mod write;

pub use write::{write_all, write_str, Stderr, STD_ERR};

/// An open, read-only file descriptor. Closed on drop.
#[derive(Debug)]
pub struct File(i32);

impl File {
    pub fn open(path: &CStr) -> Result<Self, Errno> {
        let result = unsafe { arch::openat_readonly(path.as_ptr()) };
        Errno::from_return(result).map(|fd| Self(fd as i32))
    }

    pub fn as_raw_fd(&self) -> i32 {
        self.0
    }

    /// Reads at `offset` until `buffer` is full or the file ends. Returns the
    /// number of bytes read, which is short only at end of file.
    pub fn read_at(&self, buffer: &mut [u8], offset: usize) -> Result<usize, Errno> {
        let mut filled = 0;
        while filled < buffer.len() {
            let remaining = &mut buffer[filled..];
            let result = unsafe {
                arch::pread(self.0, remaining.as_mut_ptr(), remaining.len(), offset + filled)
            };
            match Errno::from_return(result) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(Errno(4)) => continue, // EINTR
                Err(errno) => return Err(errno),
            }
        }
        Ok(filled)
    }
}

impl Drop for File {
    fn drop(&mut self) {
        arch::close(self.0);
    }
}
