/// Page granularity reported by the kernel in `AT_PAGESZ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSize(usize);

impl PageSize {
    /// Returns `None` unless `size` is a non-zero power of two.
    pub fn new(size: usize) -> Option<Self> {
        size.is_power_of_two().then_some(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn page_start(self, address: usize) -> usize {
        address & !(self.0 - 1)
    }

    pub fn page_end(self, address: usize) -> usize {
        self.page_start(address.saturating_add(self.0 - 1))
    }
}
