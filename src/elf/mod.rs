//! Reading the interpreter's ELF header and program header table.

use alloc::vec::Vec;
use core::ffi::CStr;

use smallvec::SmallVec;

use crate::{
    error::Error,
    libc::{errno::Errno, fs::File},
};

pub mod header;
pub mod program_header;
pub mod relocate;

use header::ElfHeader;
use program_header::ProgramHeader;

/// Upper bound on the size of a program header table.
pub const MAX_PROGRAM_HEADER_TABLE_SIZE: usize = 65536;

pub type ProgramHeaders = SmallVec<[ProgramHeader; 16]>;

/// An opened and validated ELF object.
#[derive(Debug)]
pub struct ElfFile {
    pub file: File,
    pub header: ElfHeader,
    pub program_headers: ProgramHeaders,
}

impl ElfFile {
    /// Opens `path` read-only. A path taken from a text file may carry a
    /// trailing newline: when the file does not exist, retry without it.
    pub fn open_file(path: &CStr) -> Result<File, Error> {
        match File::open(path) {
            Err(Errno::NOENT) => {
                let Some(stripped) = path.to_bytes().strip_suffix(b"\n") else {
                    return Err(Error::Open(Errno::NOENT));
                };
                let mut retry = Vec::new();
                retry
                    .try_reserve_exact(stripped.len() + 1)
                    .map_err(|_| Error::OutOfMemory)?;
                retry.extend_from_slice(stripped);
                retry.push(0);
                let retry = CStr::from_bytes_with_nul(&retry).map_err(|_| Error::NotElf)?;
                File::open(retry).map_err(Error::Open)
            }
            opened => opened.map_err(Error::Open),
        }
    }

    pub fn open(path: &CStr) -> Result<Self, Error> {
        Self::from_file(Self::open_file(path)?)
    }

    pub fn from_file(file: File) -> Result<Self, Error> {
        let mut bytes = [0u8; ElfHeader::SIZE];
        let read = file.read_at(&mut bytes, 0).map_err(Error::ReadHeader)?;
        let header = ElfHeader::parse(&bytes[..read])?;
        header.validate()?;

        let program_headers = read_program_headers(&file, &header)?;
        Ok(Self {
            file,
            header,
            program_headers,
        })
    }

    pub fn loadable_segments(&self) -> impl Iterator<Item = &ProgramHeader> {
        self.program_headers.iter().filter(|header| header.is_mapped())
    }
}

fn read_program_headers(file: &File, header: &ElfHeader) -> Result<ProgramHeaders, Error> {
    let entry_size = header.e_phentsize as usize;
    let table_size = header.e_phnum as usize * entry_size;
    if table_size == 0 || table_size > MAX_PROGRAM_HEADER_TABLE_SIZE {
        return Err(Error::ProgramHeaderSize(table_size));
    }
    if entry_size < ProgramHeader::SIZE {
        return Err(Error::ProgramHeaderSize(table_size));
    }

    let mut table = Vec::new();
    table
        .try_reserve_exact(table_size)
        .map_err(|_| Error::OutOfMemory)?;
    table.resize(table_size, 0u8);
    let read = file
        .read_at(&mut table, header.e_phoff)
        .map_err(Error::ReadProgramHeaders)?;
    if read != table_size {
        return Err(Error::TruncatedProgramHeaders);
    }

    let mut program_headers = ProgramHeaders::new();
    program_headers
        .try_reserve_exact(header.e_phnum as usize)
        .map_err(|_| Error::OutOfMemory)?;
    program_headers.extend(
        table
            .chunks_exact(entry_size)
            .map(|entry| unsafe { entry.as_ptr().cast::<ProgramHeader>().read_unaligned() }),
    );
    Ok(program_headers)
}

#[cfg(test)]
mod tests {
    use super::{header::*, program_header::*, *};
    use crate::arch;
    use std::{ffi::CString, io::Write, os::unix::ffi::OsStrExt};

    fn header_bytes(e_type: u16, e_phnum: u16, e_phentsize: u16) -> Vec<u8> {
        let header = ElfHeader {
            e_ident: [0x7f, b'E', b'L', b'F', ELFCLASS64, ELFDATA2LSB, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            e_type,
            e_machine: arch::EM_SELF,
            e_version: 1,
            e_entry: 0x40,
            e_phoff: ElfHeader::SIZE,
            e_ehsize: ElfHeader::SIZE as u16,
            e_phentsize,
            e_phnum,
            ..Default::default()
        };
        unsafe {
            core::slice::from_raw_parts((&header as *const ElfHeader).cast::<u8>(), ElfHeader::SIZE)
        }
        .to_vec()
    }

    fn load_segment() -> Vec<u8> {
        let segment = ProgramHeader {
            p_type: PT_LOAD,
            p_flags: PF_R | PF_X,
            p_filesz: 0x100,
            p_memsz: 0x100,
            p_align: 0x1000,
            ..Default::default()
        };
        unsafe {
            core::slice::from_raw_parts(
                (&segment as *const ProgramHeader).cast::<u8>(),
                ProgramHeader::SIZE,
            )
        }
        .to_vec()
    }

    fn open_bytes(bytes: &[u8]) -> Result<ElfFile, Error> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        let path = CString::new(file.path().as_os_str().as_bytes()).unwrap();
        ElfFile::open(&path)
    }

    #[test]
    fn reads_a_minimal_object() {
        let mut bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        bytes.extend(load_segment());
        let elf = open_bytes(&bytes).unwrap();
        assert_eq!(elf.header.e_entry, 0x40);
        assert_eq!(elf.program_headers.len(), 1);
        assert_eq!(elf.loadable_segments().count(), 1);
        assert_eq!(elf.program_headers[0].p_flags, PF_R | PF_X);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        bytes[..4].copy_from_slice(b"#!/b");
        assert_eq!(open_bytes(&bytes).unwrap_err(), Error::NotElf);
        assert_eq!(open_bytes(b"").unwrap_err(), Error::NotElf);
    }

    #[test]
    fn rejects_truncated_headers() {
        let bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        let error = open_bytes(&bytes[..20]).unwrap_err();
        assert_eq!(error, Error::TruncatedHeader);
        assert!(error.is_corrupt());
    }

    #[test]
    fn rejects_executables() {
        let mut bytes = header_bytes(ET_EXEC, 1, ProgramHeader::SIZE as u16);
        bytes.extend(load_segment());
        assert_eq!(open_bytes(&bytes).unwrap_err(), Error::NotDynamic(ET_EXEC));
    }

    #[test]
    fn rejects_foreign_machines() {
        let mut bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        bytes[18..20].copy_from_slice(&0xf3u16.to_le_bytes());
        assert_eq!(
            open_bytes(&bytes).unwrap_err(),
            Error::WrongArchitecture {
                expected: arch::EM_SELF,
                found: 0xf3
            }
        );
    }

    #[test]
    fn rejects_32_bit_objects() {
        let mut bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        bytes[EI_CLASS] = 1;
        assert_eq!(open_bytes(&bytes).unwrap_err(), Error::UnsupportedClass(1));
    }

    #[rstest::rstest]
    #[case(0, ProgramHeader::SIZE as u16, 0)]
    #[case(1, 0, 0)]
    #[case(1200, ProgramHeader::SIZE as u16, 1200 * ProgramHeader::SIZE)]
    #[case(2, 16, 32)]
    fn rejects_program_header_table_sizes(
        #[case] e_phnum: u16,
        #[case] e_phentsize: u16,
        #[case] reported: usize,
    ) {
        // No table follows the header: the size check must come first.
        let bytes = header_bytes(ET_DYN, e_phnum, e_phentsize);
        assert_eq!(
            open_bytes(&bytes).unwrap_err(),
            Error::ProgramHeaderSize(reported)
        );
    }

    #[test]
    fn rejects_short_program_header_tables() {
        let mut bytes = header_bytes(ET_DYN, 2, ProgramHeader::SIZE as u16);
        bytes.extend(load_segment());
        let error = open_bytes(&bytes).unwrap_err();
        assert_eq!(error, Error::TruncatedProgramHeaders);
        assert!(error.is_corrupt());
    }

    #[test]
    fn retries_without_a_trailing_newline() {
        let mut bytes = header_bytes(ET_DYN, 1, ProgramHeader::SIZE as u16);
        bytes.extend(load_segment());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let mut path = file.path().as_os_str().as_bytes().to_vec();
        path.push(b'\n');
        let path = CString::new(path).unwrap();
        assert!(ElfFile::open(&path).is_ok());

        let missing = CString::new("/nonexistent/ld.so\n").unwrap();
        assert_eq!(
            ElfFile::open(&missing).unwrap_err(),
            Error::Open(Errno::NOENT)
        );
    }
}
