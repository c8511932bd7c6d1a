use core::ffi::{c_char, c_void};

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "aarch64")]
use self::aarch64 as imp;
#[cfg(target_arch = "x86_64")]
use self::x86_64 as imp;

#[cfg(not(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64"))))]
compile_error!("nix-ld only supports x86_64 and aarch64 Linux");

/// Suffix of the architecture-tagged configuration variables, e.g. `NIX_LD_x86_64_linux`.
pub const SYSTEM: &str = imp::SYSTEM;

/// `e_machine` of ELF objects this process can execute.
pub const EM_SELF: u16 = imp::EM_SELF;

/// The `R_*_RELATIVE` relocation type of this architecture.
pub const R_RELATIVE: u32 = imp::R_RELATIVE;

#[inline(always)]
pub(crate) unsafe fn openat_readonly(path_ptr: *const c_char) -> isize {
    imp::openat(-100, path_ptr, 0, 0)
}

#[inline(always)]
pub(crate) unsafe fn pread(fd: i32, buf: *mut u8, len: usize, offset: usize) -> isize {
    imp::pread(fd, buf, len, offset)
}

#[inline(always)]
pub(crate) unsafe fn write(fd: i32, buf: *const c_void, len: usize) -> isize {
    imp::write(fd, buf, len)
}

#[inline(always)]
pub(crate) fn close(fd: i32) -> isize {
    imp::close(fd)
}

#[inline(always)]
pub(crate) unsafe fn mmap(
    addr: *mut u8,
    len: usize,
    prot: usize,
    flags: usize,
    fd: i32,
    offset: usize,
) -> isize {
    imp::mmap(addr, len, prot, flags, fd, offset)
}

#[inline(always)]
pub(crate) unsafe fn munmap(addr: *mut u8, len: usize) -> isize {
    imp::munmap(addr, len)
}

#[inline(always)]
pub(crate) unsafe fn execve(
    path_ptr: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> isize {
    imp::execve(path_ptr, argv, envp)
}

#[inline(always)]
pub(crate) fn exit_group(code: i32) -> ! {
    imp::exit_group(code)
}

#[inline(always)]
pub(crate) fn gettid() -> i32 {
    imp::gettid()
}

#[inline(always)]
pub(crate) fn getpid() -> i32 {
    imp::getpid()
}

#[inline(always)]
pub(crate) fn tgkill(pid: i32, tid: i32, sig: i32) -> isize {
    imp::tgkill(pid, tid, sig)
}

#[inline(always)]
pub(crate) unsafe fn trap() -> ! {
    imp::trap()
}

/// Resets the stack pointer to `stack` and branches to `entry`.
///
/// # Safety
///
/// `stack` must point at a kernel-style start-up block (argc, argv, envp,
/// auxv) and `entry` at the entry point of a fully mapped image. Nothing on
/// the current stack survives the jump.
#[inline(always)]
pub unsafe fn jump_to_entry(entry: usize, stack: *const usize) -> ! {
    imp::jump_to_entry(entry, stack)
}

/// Run-time address of this image's own ELF header.
///
/// Resolved PC-relatively, so it is usable before self relocation.
#[inline(always)]
pub fn image_base() -> usize {
    imp::image_base()
}

#[inline(always)]
pub(crate) unsafe fn memmove(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    imp::memmove(dst, src, len)
}

#[inline(always)]
pub(crate) unsafe fn memcpy(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    imp::memcpy(dst, src, len)
}

#[inline(always)]
pub(crate) unsafe fn memset(dst: *mut u8, value: u8, len: usize) -> *mut u8 {
    imp::memset(dst, value, len)
}

#[inline(always)]
pub(crate) unsafe fn memcmp(left: *const u8, right: *const u8, len: usize) -> i32 {
    imp::memcmp(left, right, len)
}
