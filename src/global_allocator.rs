use core::{
    alloc::{GlobalAlloc, Layout},
    cell::UnsafeCell,
    ptr::null_mut,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Hands out memory from a fixed arena and never takes it back.
///
/// The loader allocates a few small buffers before the process image is
/// replaced, so reclaiming memory would buy nothing.
#[repr(C, align(4096))]
pub struct BumpAllocator<const N: usize> {
    arena: UnsafeCell<[u8; N]>,
    offset: AtomicUsize,
}

unsafe impl<const N: usize> Sync for BumpAllocator<N> {}

impl<const N: usize> BumpAllocator<N> {
    pub const fn new() -> Self {
        Self {
            arena: UnsafeCell::new([0; N]),
            offset: AtomicUsize::new(0),
        }
    }
}

impl<const N: usize> Default for BumpAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<const N: usize> GlobalAlloc for BumpAllocator<N> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let base = self.arena.get() as usize;
        let mut offset = self.offset.load(Ordering::Relaxed);
        loop {
            let start = match (base + offset).checked_next_multiple_of(layout.align()) {
                Some(start) => start - base,
                None => return null_mut(),
            };
            let end = match start.checked_add(layout.size()) {
                Some(end) if end <= N => end,
                _ => return null_mut(),
            };
            match self
                .offset
                .compare_exchange_weak(offset, end, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return (base + start) as *mut u8,
                Err(current) => offset = current,
            }
        }
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
}
