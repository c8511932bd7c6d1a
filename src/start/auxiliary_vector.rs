use core::slice;

pub const AT_NULL: usize = 0;
pub const AT_PAGE_SIZE: usize = 6;
pub const AT_BASE: usize = 7;

/// An item in the auxiliary vector.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuxiliaryVectorItem {
    pub a_type: usize,
    pub a_val: usize,
}

/// The `AT_NULL` terminated list of auxiliary vector items, as a view that
/// allows changing values but never adding or removing entries.
///
/// It starts right after the null pointer that ends the environment pointers:
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
/// | auxiliary_vector... |
/// |---------------------|
/// | AT_NULL             |
/// |---------------------|
/// | ...                 |
/// |---------------------|
/// ```
pub struct AuxiliaryVector<'a> {
    items: &'a mut [AuxiliaryVectorItem],
}

impl<'a> AuxiliaryVector<'a> {
    /// Wraps the vector starting at `auxiliary_vector_pointer`, up to but not
    /// including its `AT_NULL` item.
    ///
    /// # Safety
    ///
    /// The pointer must reference a valid, `AT_NULL` terminated vector that
    /// outlives `'a` and is not accessed through other pointers meanwhile.
    pub unsafe fn from_raw(auxiliary_vector_pointer: *mut AuxiliaryVectorItem) -> Self {
        let mut count = 0;
        while (*auxiliary_vector_pointer.add(count)).a_type != AT_NULL {
            count += 1;
        }
        Self {
            items: slice::from_raw_parts_mut(auxiliary_vector_pointer, count),
        }
    }

    pub fn get(&self, a_type: usize) -> Option<usize> {
        self.items
            .iter()
            .find(|item| item.a_type == a_type)
            .map(|item| item.a_val)
    }

    /// Overwrites the value of the first `a_type` item. Returns whether one
    /// was present.
    pub fn set(&mut self, a_type: usize, a_val: usize) -> bool {
        match self.items.iter_mut().find(|item| item.a_type == a_type) {
            Some(item) => {
                item.a_val = a_val;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuxiliaryVectorItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
