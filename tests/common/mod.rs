#![allow(dead_code)]

use std::{ffi::CStr, io::Write, path::Path};

use nix_ld::{
    arch,
    start::auxiliary_vector::{AT_NULL, AT_PAGE_SIZE},
};
use tempfile::NamedTempFile;

pub const PAGE_SIZE: usize = 0x1000;

const ET_DYN: u16 = 3;
const PT_LOAD: u32 = 1;
const PF_X: u32 = 1;
const PF_R: u32 = 4;

/// A dynamic object with one read+execute `PT_LOAD` segment at address 0
/// covering the whole file.
pub fn minimal_interpreter(entry: u64) -> Vec<u8> {
    let ehdr_size = 64usize;
    let phdr_size = 56usize;
    let file_size = PAGE_SIZE;

    let mut out = Vec::with_capacity(file_size);
    out.extend_from_slice(b"\x7fELF");
    out.push(2); // ELFCLASS64
    out.push(1); // ELFDATA2LSB
    out.push(1); // EV_CURRENT
    out.resize(16, 0);
    out.extend_from_slice(&ET_DYN.to_le_bytes()); // e_type
    out.extend_from_slice(&arch::EM_SELF.to_le_bytes()); // e_machine
    out.extend_from_slice(&1u32.to_le_bytes()); // e_version
    out.extend_from_slice(&entry.to_le_bytes()); // e_entry
    out.extend_from_slice(&(ehdr_size as u64).to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&(ehdr_size as u16).to_le_bytes()); // e_ehsize
    out.extend_from_slice(&(phdr_size as u16).to_le_bytes()); // e_phentsize
    out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx
    assert_eq!(out.len(), ehdr_size);

    out.extend_from_slice(&PT_LOAD.to_le_bytes()); // p_type
    out.extend_from_slice(&(PF_R | PF_X).to_le_bytes()); // p_flags
    out.extend_from_slice(&0u64.to_le_bytes()); // p_offset
    out.extend_from_slice(&0u64.to_le_bytes()); // p_vaddr
    out.extend_from_slice(&0u64.to_le_bytes()); // p_paddr
    out.extend_from_slice(&(file_size as u64).to_le_bytes()); // p_filesz
    out.extend_from_slice(&(file_size as u64).to_le_bytes()); // p_memsz
    out.extend_from_slice(&(PAGE_SIZE as u64).to_le_bytes()); // p_align
    assert_eq!(out.len(), ehdr_size + phdr_size);

    out.resize(file_size, 0xcc);
    out
}

pub fn write_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// An `argc, argv, NULL, envp, NULL, auxv, AT_NULL` block like the one the
/// kernel puts on a new process' stack.
pub struct StartupBlock {
    strings: Vec<Vec<u8>>,
    words: Vec<usize>,
    argc: usize,
    envc: usize,
}

impl StartupBlock {
    pub fn new(arguments: &[&str], environment: &[&str], auxv: &[(usize, usize)]) -> Self {
        let mut strings: Vec<Vec<u8>> = arguments
            .iter()
            .chain(environment)
            .map(|s| {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                bytes
            })
            .collect();

        let mut words = vec![arguments.len()];
        let (argument_strings, environment_strings) = strings.split_at_mut(arguments.len());
        words.extend(argument_strings.iter_mut().map(|s| s.as_mut_ptr() as usize));
        words.push(0);
        words.extend(environment_strings.iter_mut().map(|s| s.as_mut_ptr() as usize));
        words.push(0);
        for &(key, value) in auxv {
            words.extend([key, value]);
        }
        words.extend([AT_NULL, 0]);

        Self {
            strings,
            words,
            argc: arguments.len(),
            envc: environment.len(),
        }
    }

    /// Arguments plus a page size, which every run needs.
    pub fn with_page_size(
        arguments: &[&str],
        environment: &[&str],
        auxv: &[(usize, usize)],
    ) -> Self {
        let mut full = vec![(AT_PAGE_SIZE, PAGE_SIZE)];
        full.extend_from_slice(auxv);
        Self::new(arguments, environment, &full)
    }

    pub fn stack_pointer(&mut self) -> *mut usize {
        self.words.as_mut_ptr()
    }

    pub fn argv(&self) -> *const usize {
        self.words[1..].as_ptr()
    }

    pub fn envp(&self) -> *const usize {
        self.words[self.argc + 2..].as_ptr()
    }

    /// The environment as it reads now, following the slot pointers.
    pub fn environment(&self) -> Vec<String> {
        let start = self.argc + 2;
        self.words[start..start + self.envc]
            .iter()
            .map(|&pointer| {
                unsafe { CStr::from_ptr(pointer as *const _) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    pub fn auxv(&self, key: usize) -> Option<usize> {
        self.words[self.argc + self.envc + 3..]
            .chunks_exact(2)
            .take_while(|pair| pair[0] != AT_NULL)
            .find(|pair| pair[0] == key)
            .map(|pair| pair[1])
    }
}
