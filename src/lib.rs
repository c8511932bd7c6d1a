//! A stand-in ELF interpreter: loads the dynamic linker named by `NIX_LD`
//! the way the kernel would have, then hands the process over to it.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod context;
pub mod elf;
pub mod error;
pub mod global_allocator;
mod io_macros;
pub mod libc;
pub mod library_path;
pub mod logger;
pub mod mapping;
pub mod page_size;
pub mod runtime_loader;
pub mod shared_object;
pub mod start;

pub use error::{Error, ErrorKind, Report};
pub use runtime_loader::{prepare, run, Handoff};
pub use start::ProcessImage;
