use core::{
    arch::asm,
    ffi::{c_char, c_void},
};

pub(super) const SYSTEM: &str = "aarch64_linux";
pub(super) const EM_SELF: u16 = 183; // EM_AARCH64
pub(super) const R_RELATIVE: u32 = 1027; // R_AARCH64_RELATIVE

const OPENAT: usize = 56;
const CLOSE: usize = 57;
const WRITE: usize = 64;
const PREAD64: usize = 67;
const EXIT_GROUP: usize = 94;
const TGKILL: usize = 131;
const GETPID: usize = 172;
const GETTID: usize = 178;
const MUNMAP: usize = 215;
const EXECVE: usize = 221;
const MMAP: usize = 222;

#[inline(always)]
unsafe fn syscall0(number: usize) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        lateout("x0") rc,
        options(nostack),
    );
    rc
}

#[inline(always)]
unsafe fn syscall1(number: usize, arg0: usize) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        inlateout("x0") arg0 as isize => rc,
        options(nostack),
    );
    rc
}

#[inline(always)]
unsafe fn syscall3(number: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        inlateout("x0") arg0 as isize => rc,
        in("x1") arg1,
        in("x2") arg2,
        options(nostack),
    );
    rc
}

#[inline(always)]
unsafe fn syscall4(number: usize, arg0: usize, arg1: usize, arg2: usize, arg3: usize) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        inlateout("x0") arg0 as isize => rc,
        in("x1") arg1,
        in("x2") arg2,
        in("x3") arg3,
        options(nostack),
    );
    rc
}

#[inline(always)]
unsafe fn syscall6(
    number: usize,
    arg0: usize,
    arg1: usize,
    arg2: usize,
    arg3: usize,
    arg4: usize,
    arg5: usize,
) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        inlateout("x0") arg0 as isize => rc,
        in("x1") arg1,
        in("x2") arg2,
        in("x3") arg3,
        in("x4") arg4,
        in("x5") arg5,
        options(nostack),
    );
    rc
}

#[inline(always)]
pub(crate) unsafe fn openat(dirfd: i32, path_ptr: *const c_char, flags: i32, mode: u32) -> isize {
    syscall4(
        OPENAT,
        dirfd as isize as usize,
        path_ptr as usize,
        flags as isize as usize,
        mode as usize,
    )
}

#[inline(always)]
pub(crate) unsafe fn pread(fd: i32, buf: *mut u8, len: usize, offset: usize) -> isize {
    syscall4(PREAD64, fd as isize as usize, buf as usize, len, offset)
}

#[inline(always)]
pub(crate) unsafe fn write(fd: i32, buf: *const c_void, len: usize) -> isize {
    syscall3(WRITE, fd as isize as usize, buf as usize, len)
}

#[inline(always)]
pub(crate) fn close(fd: i32) -> isize {
    unsafe { syscall1(CLOSE, fd as isize as usize) }
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
    syscall6(
        MMAP,
        addr as usize,
        len,
        prot,
        flags,
        fd as isize as usize,
        offset,
    )
}

#[inline(always)]
pub(crate) unsafe fn munmap(addr: *mut u8, len: usize) -> isize {
    syscall3(MUNMAP, addr as usize, len, 0)
}

#[inline(always)]
pub(crate) unsafe fn execve(
    path_ptr: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> isize {
    syscall3(EXECVE, path_ptr as usize, argv as usize, envp as usize)
}

#[inline(always)]
pub(crate) fn exit_group(code: i32) -> ! {
    unsafe {
        asm!(
            "svc 0",
            in("x8") EXIT_GROUP,
            in("x0") code as isize,
            options(noreturn, nostack),
        );
    }
}

#[inline(always)]
pub(crate) fn gettid() -> i32 {
    unsafe { syscall0(GETTID) as i32 }
}

#[inline(always)]
pub(crate) fn getpid() -> i32 {
    unsafe { syscall0(GETPID) as i32 }
}

#[inline(always)]
pub(crate) fn tgkill(pid: i32, tid: i32, sig: i32) -> isize {
    unsafe {
        syscall3(
            TGKILL,
            pid as isize as usize,
            tid as isize as usize,
            sig as isize as usize,
        )
    }
}

#[inline(always)]
pub(crate) unsafe fn trap() -> ! {
    asm!("brk #0", options(noreturn, nostack));
}

#[inline(always)]
pub(crate) unsafe fn jump_to_entry(entry: usize, stack: *const usize) -> ! {
    // x0 carries the exit handler for the started program; the kernel
    // leaves it zero.
    asm!(
        "mov sp, x1",
        "mov x0, xzr",
        "mov x29, xzr",
        "mov x30, xzr",
        "br x2",
        in("x1") stack,
        in("x2") entry,
        options(noreturn),
    );
}

#[inline(always)]
pub(crate) fn image_base() -> usize {
    let base: usize;
    unsafe {
        asm!(
            "adrp {0}, __ehdr_start",
            "add {0}, {0}, :lo12:__ehdr_start",
            out(reg) base,
            options(nomem, nostack, preserves_flags),
        );
    }
    base
}

// Byte loops in assembly so the compiler cannot turn them back into calls to
// the very symbols they implement.

#[inline(always)]
pub(crate) unsafe fn memmove(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    if (dst as usize) <= (src as usize) {
        return memcpy(dst, src, len);
    }

    asm!(
        "2:",
        "cbz {len}, 3f",
        "sub {len}, {len}, #1",
        "ldrb {byte:w}, [{src}, {len}]",
        "strb {byte:w}, [{dst}, {len}]",
        "b 2b",
        "3:",
        len = inout(reg) len => _,
        src = in(reg) src,
        dst = in(reg) dst,
        byte = out(reg) _,
        options(nostack)
    );
    dst
}

#[inline(always)]
pub(crate) unsafe fn memcpy(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    asm!(
        "2:",
        "cbz {len}, 3f",
        "ldrb {byte:w}, [{src}], #1",
        "strb {byte:w}, [{dst}], #1",
        "sub {len}, {len}, #1",
        "b 2b",
        "3:",
        len = inout(reg) len => _,
        src = inout(reg) src => _,
        dst = inout(reg) dst => _,
        byte = out(reg) _,
        options(nostack)
    );
    dst
}

#[inline(always)]
pub(crate) unsafe fn memset(dst: *mut u8, value: u8, len: usize) -> *mut u8 {
    asm!(
        "2:",
        "cbz {len}, 3f",
        "strb {value:w}, [{dst}], #1",
        "sub {len}, {len}, #1",
        "b 2b",
        "3:",
        len = inout(reg) len => _,
        dst = inout(reg) dst => _,
        value = in(reg) value as u32,
        options(nostack)
    );
    dst
}

#[inline(always)]
pub(crate) unsafe fn memcmp(left: *const u8, right: *const u8, len: usize) -> i32 {
    let mut idx = 0usize;
    while idx < len {
        let l = core::ptr::read_volatile(left.add(idx));
        let r = core::ptr::read_volatile(right.add(idx));
        if l != r {
            return (l as i32) - (r as i32);
        }
        idx += 1;
    }
    0
}
