use core::{
    ffi::{c_char, CStr},
    marker::PhantomData,
    slice,
};

use crate::io_macros::{fatal, fatal_assert};

/// One `NAME=VALUE` entry of the environment block.
#[derive(Clone, Copy, Debug)]
pub struct EnvironmentVariable<'a> {
    /// Index of the entry's pointer within the block.
    pub slot: usize,
    pub name: &'a [u8],
    pub value: &'a [u8],
    value_with_nul: &'a [u8],
}

impl<'a> EnvironmentVariable<'a> {
    pub fn value_cstr(&self) -> &'a CStr {
        match CStr::from_bytes_with_nul(self.value_with_nul) {
            Ok(value) => value,
            Err(_) => fatal!("environment entry {} is not NUL-terminated", self.slot),
        }
    }
}

/// The null-terminated list of pointers to `NAME=VALUE` strings the kernel
/// places after the argument vector.
///
/// ```text
/// |---------------------|
/// | arg_count           |
/// |---------------------|
/// | arg_values...       |
/// |---------------------|
/// | null                |
/// |---------------------|
/// | env_pointers...     |
/// |---------------------|
/// | null                |
/// |---------------------|
/// | ...                 |
/// |---------------------|
/// ```
///
/// The number of slots and their address are fixed: entries can be rewritten
/// within their existing storage or have their pointer replaced, nothing else.
pub struct Environment<'a> {
    slots: *mut *mut u8,
    len: usize,
    _block: PhantomData<&'a mut [*mut u8]>,
}

impl<'a> Environment<'a> {
    /// # Safety
    ///
    /// `environment_pointer` must reference a null-terminated array of
    /// pointers to NUL-terminated strings, all valid and otherwise unaliased
    /// for `'a`.
    pub unsafe fn from_raw(environment_pointer: *mut *mut u8) -> Self {
        let mut len = 0;
        while !(*environment_pointer.add(len)).is_null() {
            len += 1;
        }
        Self {
            slots: environment_pointer,
            len,
            _block: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The pointer to hand to `execve` or to leave on the stack for the next
    /// program.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.slots as *const *const c_char
    }

    /// The entry at `slot` including its terminating NUL.
    fn entry_with_nul(&self, slot: usize) -> &'a [u8] {
        fatal_assert!(slot < self.len, "environment slot {slot} out of range");
        unsafe {
            let string_pointer = *self.slots.add(slot);
            CStr::from_ptr(string_pointer.cast()).to_bytes_with_nul()
        }
    }

    /// The variable at `slot`. Entries without `=` define nothing and read
    /// as `None`, as they do for `getenv`.
    pub fn get(&self, slot: usize) -> Option<EnvironmentVariable<'a>> {
        if slot >= self.len {
            return None;
        }
        let entry = self.entry_with_nul(slot);
        let content = &entry[..entry.len() - 1];
        let split_at = memchr::memchr(b'=', content)?;
        let (name, value_start) = (&content[..split_at], split_at + 1);
        Some(EnvironmentVariable {
            slot,
            name,
            value: &content[value_start..],
            value_with_nul: &entry[value_start..],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = EnvironmentVariable<'a>> + '_ {
        (0..self.len).filter_map(move |slot| self.get(slot))
    }

    pub fn find(&self, name: &[u8]) -> Option<EnvironmentVariable<'a>> {
        self.iter().find(|variable| variable.name == name)
    }

    /// Copies `entry` over the string at `slot` and terminates it. The new
    /// string may not be longer than the one it replaces.
    pub fn overwrite(&mut self, slot: usize, entry: &[u8]) {
        let current = self.entry_with_nul(slot);
        fatal_assert!(
            entry.len() < current.len(),
            "rewritten environment entry outgrows its storage ({} > {})",
            entry.len(),
            current.len() - 1,
        );
        unsafe {
            let storage = slice::from_raw_parts_mut(*self.slots.add(slot), entry.len() + 1);
            storage[..entry.len()].copy_from_slice(entry);
            storage[entry.len()] = 0;
        }
    }

    /// Points `slot` at `entry`, which the process never frees.
    pub fn replace(&mut self, slot: usize, entry: &'static CStr) {
        fatal_assert!(slot < self.len, "environment slot {slot} out of range");
        unsafe {
            *self.slots.add(slot) = entry.as_ptr().cast_mut().cast();
        }
    }
}
