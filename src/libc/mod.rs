//! The handful of C library routines the loader needs, on top of raw system
//! calls.

pub mod errno;
pub mod fs;
pub mod mem;
pub mod process;
