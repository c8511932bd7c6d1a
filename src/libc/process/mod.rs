use core::{
    ffi::{c_char, CStr},
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{arch, libc::errno::Errno};

pub fn getpid() -> i32 {
    arch::getpid()
}

fn syscall_gettid() -> i32 {
    arch::gettid()
}

pub fn raise(signal_number: i32) -> i32 {
    let process_id = getpid();
    let thread_id = syscall_gettid();

    arch::tgkill(process_id, thread_id, signal_number) as i32
}

/// Replaces the process image. Only returns on failure.
pub unsafe fn execve(
    path: &CStr,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> Errno {
    match Errno::from_return(arch::execve(path.as_ptr(), argv, envp)) {
        Err(errno) => errno,
        Ok(_) => Errno::INVAL,
    }
}

pub fn exit(status: i32) -> ! {
    arch::exit_group(status)
}

pub fn abort() -> ! {
    const SIGABRT: i32 = 6;

    static ABORT_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

    if ABORT_IN_PROGRESS
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        unsafe { arch::trap() };
    }

    raise(SIGABRT);

    unsafe { arch::trap() };
}
