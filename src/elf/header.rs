use crate::{arch, error::Error};

pub const ELFMAG: [u8; 4] = *b"\x7fELF";
pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;

pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

#[cfg(target_endian = "little")]
const ELFDATA_SELF: u8 = ELFDATA2LSB;
#[cfg(target_endian = "big")]
const ELFDATA_SELF: u8 = ELFDATA2MSB;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElfHeader {
    /// ELF identification array, containing the magic number and other information.
    ///
    /// The layout is as follows:
    /// - [0..4]: Magic Number (0x7F, 'E', 'L', 'F')
    /// - [4]: File Class (1 = 32-bit, 2 = 64-bit)
    /// - [5]: Endianness (1 = little-endian, 2 = big-endian)
    /// - [6]: Elf Version (should be 1)
    /// - [7]: OS ABI (0 = System V, 3 = Linux, etc.)
    /// - [8]: ABI Version
    /// - [9..16]: Padding (currently unused)
    pub e_ident: [u8; 16],
    /// The Elf file type, see the ET_.* constants.
    pub e_type: u16,
    /// The target architecture, see [`arch::EM_SELF`].
    pub e_machine: u16,
    /// The Elf format version, only version one is currently available.
    pub e_version: u32,
    /// The virtual address to which the kernel or dynamic linker will jump when beginning execution.
    pub e_entry: usize,
    /// The offset into the file at which the program header table resides.
    pub e_phoff: usize,
    /// The offset into the file at which the section header table resides.
    pub e_shoff: usize,
    /// A collection of processor-specific flags.
    pub e_flags: u32,
    /// The size of this header, 64 for 64-bit objects.
    pub e_ehsize: u16,
    /// The size of each Elf program header table entry in bytes.
    pub e_phentsize: u16,
    /// The number of Elf program header table entries.
    pub e_phnum: u16,
    /// The size of each Elf section header table entry in bytes.
    pub e_shentsize: u16,
    /// The number of Elf section header table entries.
    pub e_shnum: u16,
    /// The index into the section header table at which the string table resides.
    pub e_shstrndx: u16,
}

impl ElfHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Decodes a header from the start of `bytes`.
    ///
    /// A buffer too short to hold a whole header is rejected as not being an
    /// ELF file unless it at least starts with the magic number.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < ELFMAG.len() || bytes[..ELFMAG.len()] != ELFMAG {
            return Err(Error::NotElf);
        }
        if bytes.len() < Self::SIZE {
            return Err(Error::TruncatedHeader);
        }
        // The buffer carries no alignment guarantee.
        Ok(unsafe { bytes.as_ptr().cast::<Self>().read_unaligned() })
    }

    /// Checks that this process can map the object: a 64-bit, native byte
    /// order, position independent object for this machine.
    pub fn validate(&self) -> Result<(), Error> {
        if self.e_ident[EI_CLASS] != ELFCLASS64 {
            return Err(Error::UnsupportedClass(self.e_ident[EI_CLASS]));
        }
        if self.e_ident[EI_DATA] != ELFDATA_SELF {
            return Err(Error::UnsupportedEncoding(self.e_ident[EI_DATA]));
        }
        if self.e_machine != arch::EM_SELF {
            return Err(Error::WrongArchitecture {
                expected: arch::EM_SELF,
                found: self.e_machine,
            });
        }
        if self.e_type != ET_DYN {
            return Err(Error::NotDynamic(self.e_type));
        }
        Ok(())
    }
}
