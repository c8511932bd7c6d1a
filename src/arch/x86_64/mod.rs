use core::{
    arch::asm,
    ffi::{c_char, c_void},
};

pub(super) const SYSTEM: &str = "x86_64_linux";
pub(super) const EM_SELF: u16 = 62; // EM_X86_64
pub(super) const R_RELATIVE: u32 = 8; // R_X86_64_RELATIVE

const WRITE: usize = 1;
const CLOSE: usize = 3;
const MMAP: usize = 9;
const MUNMAP: usize = 11;
const PREAD64: usize = 17;
const GETPID: usize = 39;
const EXECVE: usize = 59;
const GETTID: usize = 186;
const EXIT_GROUP: usize = 231;
const TGKILL: usize = 234;
const OPENAT: usize = 257;

#[inline(always)]
unsafe fn syscall1(number: usize, arg0: usize) -> isize {
    let rc: isize;
    asm!(
        "syscall",
        inlateout("rax") number as isize => rc,
        in("rdi") arg0,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack, preserves_flags),
    );
    rc
}

#[inline(always)]
unsafe fn syscall3(number: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let rc: isize;
    asm!(
        "syscall",
        inlateout("rax") number as isize => rc,
        in("rdi") arg0,
        in("rsi") arg1,
        in("rdx") arg2,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack, preserves_flags),
    );
    rc
}

#[inline(always)]
unsafe fn syscall4(number: usize, arg0: usize, arg1: usize, arg2: usize, arg3: usize) -> isize {
    let rc: isize;
    asm!(
        "syscall",
        inlateout("rax") number as isize => rc,
        in("rdi") arg0,
        in("rsi") arg1,
        in("rdx") arg2,
        in("r10") arg3,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack, preserves_flags),
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
        "syscall",
        inlateout("rax") number as isize => rc,
        in("rdi") arg0,
        in("rsi") arg1,
        in("rdx") arg2,
        in("r10") arg3,
        in("r8") arg4,
        in("r9") arg5,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack, preserves_flags),
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
            "syscall",
            in("rax") EXIT_GROUP,
            in("rdi") code as isize,
            options(noreturn, nostack),
        );
    }
}

#[inline(always)]
pub(crate) fn gettid() -> i32 {
    unsafe { syscall1(GETTID, 0) as i32 }
}

#[inline(always)]
pub(crate) fn getpid() -> i32 {
    unsafe { syscall1(GETPID, 0) as i32 }
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
    asm!("ud2", options(noreturn, nostack));
}

#[inline(always)]
pub(crate) unsafe fn jump_to_entry(entry: usize, stack: *const usize) -> ! {
    // The kernel starts an interpreter with rdx = 0 (no exit handler) and an
    // undefined frame pointer; mirror that.
    asm!(
        "mov rsp, rsi",
        "xor ebp, ebp",
        "xor edx, edx",
        "jmp rdi",
        in("rdi") entry,
        in("rsi") stack,
        options(noreturn),
    );
}

#[inline(always)]
pub(crate) fn image_base() -> usize {
    let base: usize;
    unsafe {
        asm!(
            "lea {}, [rip + __ehdr_start]",
            out(reg) base,
            options(nomem, nostack, preserves_flags),
        );
    }
    base
}

#[inline(always)]
pub(crate) unsafe fn memmove(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    if len == 0 {
        return dst;
    }

    if (dst as usize) <= (src as usize) {
        asm!(
            "rep movsb",
            inout("rdi") dst => _,
            inout("rsi") src => _,
            inout("rcx") len => _,
            options(nostack, preserves_flags)
        );
    } else {
        asm!(
            "std",
            "rep movsb",
            "cld",
            inout("rdi") dst.add(len - 1) => _,
            inout("rsi") src.add(len - 1) => _,
            inout("rcx") len => _,
            options(nostack)
        );
    }
    dst
}

#[inline(always)]
pub(crate) unsafe fn memcpy(dst: *mut u8, src: *const u8, len: usize) -> *mut u8 {
    asm!(
        "rep movsb",
        inout("rdi") dst => _,
        inout("rsi") src => _,
        inout("rcx") len => _,
        options(nostack, preserves_flags)
    );
    dst
}

#[inline(always)]
pub(crate) unsafe fn memset(dst: *mut u8, value: u8, len: usize) -> *mut u8 {
    asm!(
        "rep stosb",
        inout("rdi") dst => _,
        in("al") value,
        inout("rcx") len => _,
        options(nostack, preserves_flags)
    );
    dst
}

#[inline(always)]
pub(crate) unsafe fn memcmp(left: *const u8, right: *const u8, len: usize) -> i32 {
    let ordering: i32;
    asm!(
        "xor {ordering:e}, {ordering:e}",
        "repe cmpsb",
        "seta {ordering:l}",
        "sbb {ordering:e}, 0",
        // cmpsb compares [rsi] against [rdi].
        inout("rsi") left => _,
        inout("rdi") right => _,
        inout("rcx") len => _,
        ordering = out(reg) ordering,
        options(nostack)
    );
    ordering
}
