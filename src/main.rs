#![no_std]
#![no_main]
#![no_builtins]

use core::{arch::global_asm, fmt::Write as _, panic::PanicInfo};

use nix_ld::{
    elf::relocate::relocate_self,
    global_allocator::BumpAllocator,
    libc::{fs::Stderr, mem, process},
    runtime_loader,
};

#[global_allocator]
static ALLOCATOR: BumpAllocator<{ 64 * 1024 }> = BumpAllocator::new();

// The kernel enters with the stack pointer at `argc`.
#[cfg(target_arch = "x86_64")]
global_asm!(
    ".globl _start",
    ".type _start, @function",
    "_start:",
    "mov rdi, rsp",
    "and rsp, -16",
    "call {main}",
    "ud2",
    main = sym nix_ld_main,
);

#[cfg(target_arch = "aarch64")]
global_asm!(
    ".globl _start",
    ".type _start, %function",
    "_start:",
    "mov x0, sp",
    "mov x29, xzr",
    "mov x30, xzr",
    "bl {main}",
    "brk #0",
    main = sym nix_ld_main,
);

unsafe extern "C" fn nix_ld_main(stack_pointer: *mut usize) -> ! {
    relocate_self();
    runtime_loader::run(stack_pointer)
}

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    let _ = writeln!(Stderr, "[nix-ld] FATAL: {info}");
    process::abort()
}

#[no_mangle]
unsafe extern "C" fn memcpy(destination: *mut u8, source: *const u8, length: usize) -> *mut u8 {
    mem::memcpy(destination, source, length)
}

#[no_mangle]
unsafe extern "C" fn memmove(destination: *mut u8, source: *const u8, length: usize) -> *mut u8 {
    mem::memmove(destination, source, length)
}

#[no_mangle]
unsafe extern "C" fn memset(destination: *mut u8, byte: i32, length: usize) -> *mut u8 {
    mem::memset(destination, byte, length)
}

#[no_mangle]
unsafe extern "C" fn memcmp(left: *const u8, right: *const u8, length: usize) -> i32 {
    mem::memcmp(left, right, length)
}

#[no_mangle]
unsafe extern "C" fn bcmp(left: *const u8, right: *const u8, length: usize) -> i32 {
    mem::bcmp(left, right, length)
}

// `CStr::from_ptr` links against the C `strlen`, which no libc provides here.
#[no_mangle]
unsafe extern "C" fn strlen(string: *const u8) -> usize {
    let mut length = 0;
    while *string.add(length) != 0 {
        length += 1;
    }
    length
}

// The prebuilt `alloc` references the unwinding personality even with
// `panic = "abort"`; it is never called.
#[no_mangle]
extern "C" fn rust_eh_personality() {}
