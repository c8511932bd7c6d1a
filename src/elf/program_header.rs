use core::fmt::{self, Display};

use crate::libc::mem::{PROT_EXEC, PROT_READ, PROT_WRITE};

pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;

pub const PF_X: u32 = 1;
pub const PF_W: u32 = 2;
pub const PF_R: u32 = 4;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: usize,
    pub p_vaddr: usize,
    pub p_paddr: usize,
    pub p_filesz: usize,
    pub p_memsz: usize,
    pub p_align: usize,
}

impl ProgramHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// A `PT_LOAD` segment that occupies memory. Empty ones are never mapped.
    pub fn is_mapped(&self) -> bool {
        self.p_type == PT_LOAD && self.p_memsz > 0
    }

    pub fn is_writable(&self) -> bool {
        self.p_flags & PF_W != 0
    }

    /// End of the segment's memory image, relative to the link-time base.
    pub fn memory_end(&self) -> usize {
        self.p_vaddr.saturating_add(self.p_memsz)
    }

    /// End of the file-backed part of the segment's memory image.
    pub fn file_end(&self) -> usize {
        self.p_vaddr.saturating_add(self.p_filesz)
    }

    pub fn protection(&self) -> usize {
        let mut protection = 0;
        if self.p_flags & PF_R != 0 {
            protection |= PROT_READ;
        }
        if self.p_flags & PF_W != 0 {
            protection |= PROT_WRITE;
        }
        if self.p_flags & PF_X != 0 {
            protection |= PROT_EXEC;
        }
        protection
    }

    pub fn flags(&self) -> DisplayFlags {
        DisplayFlags(self.p_flags)
    }
}

/// `p_flags` the way `readelf` prints them, e.g. `R E`.
pub struct DisplayFlags(u32);

impl Display for DisplayFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |bit: u32, name: char| if self.0 & bit != 0 { name } else { ' ' };
        write!(f, "{}{}{}", flag(PF_R, 'R'), flag(PF_W, 'W'), flag(PF_X, 'E'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PF_R, PROT_READ, "R  ")]
    #[case(PF_R | PF_X, PROT_READ | PROT_EXEC, "R E")]
    #[case(PF_R | PF_W, PROT_READ | PROT_WRITE, "RW ")]
    #[case(0, 0, "   ")]
    fn translates_flags(#[case] p_flags: u32, #[case] protection: usize, #[case] shown: &str) {
        let header = ProgramHeader {
            p_type: PT_LOAD,
            p_flags,
            ..Default::default()
        };
        assert_eq!(header.protection(), protection);
        assert_eq!(header.flags().to_string(), shown);
    }

    #[test]
    fn skips_empty_and_foreign_segments() {
        let loadable = ProgramHeader {
            p_type: PT_LOAD,
            p_memsz: 1,
            ..Default::default()
        };
        assert!(loadable.is_mapped());
        assert!(!ProgramHeader { p_memsz: 0, ..loadable }.is_mapped());
        assert!(!ProgramHeader { p_type: PT_DYNAMIC, ..loadable }.is_mapped());
    }
}
