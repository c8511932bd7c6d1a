//! Self relocation of the static PIE binary.
//!
//! Runs before any relocated data is valid: no panics, no formatting, no
//! slices, no calls through pointers that need relocating.

use crate::{
    arch,
    elf::{
        header::ElfHeader,
        program_header::{ProgramHeader, PT_DYNAMIC},
    },
    libc::process,
};

pub const DT_NULL: usize = 0;
pub const DT_RELA: usize = 7;
pub const DT_RELASZ: usize = 8;
pub const DT_RELAENT: usize = 9;
pub const DT_REL: usize = 17;
pub const DT_RELRSZ: usize = 35;
pub const DT_RELR: usize = 36;
pub const DT_RELRENT: usize = 37;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct DynamicArrayItem {
    pub d_tag: usize,
    pub d_val: usize,
}

/// An ELF relocation entry with an addend.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Rela {
    pub r_offset: usize,
    pub r_info: usize,
    pub r_addend: isize,
}

impl Rela {
    /// Extracts the symbol table index from the `r_info` field.
    pub fn r_sym(&self) -> u32 {
        (self.r_info >> 32) as u32
    }

    /// Extracts the relocation type from the `r_info` field.
    pub fn r_type(&self) -> u32 {
        (self.r_info & 0xFFFFFFFF) as u32
    }
}

#[derive(Clone, Copy, Default)]
struct RelocationTables {
    rela: usize,
    rela_size: usize,
    rela_entry_size: usize,
    relr: usize,
    relr_size: usize,
    has_rel: bool,
}

/// Applies this image's own relative relocations.
///
/// # Safety
///
/// Must run exactly once, first thing after process entry, on a static PIE
/// whose only dynamic relocations are relative ones.
pub unsafe fn relocate_self() {
    let base = arch::image_base();
    let header = &*(base as *const ElfHeader);

    let mut dynamic = 0usize;
    let mut index = 0usize;
    while index < header.e_phnum as usize {
        let program_header = &*((base + header.e_phoff + index * header.e_phentsize as usize)
            as *const ProgramHeader);
        if program_header.p_type == PT_DYNAMIC {
            dynamic = base + program_header.p_vaddr;
        }
        index += 1;
    }
    if dynamic == 0 {
        return;
    }

    let tables = read_dynamic(dynamic as *const DynamicArrayItem);
    if tables.has_rel {
        process::abort();
    }
    if tables.rela != 0 {
        apply_rela_relocations(base, &tables);
    }
    if tables.relr != 0 {
        apply_relr_relocations(base, (base + tables.relr) as *const usize, tables.relr_size);
    }
}

unsafe fn read_dynamic(mut item: *const DynamicArrayItem) -> RelocationTables {
    let mut tables = RelocationTables {
        rela_entry_size: core::mem::size_of::<Rela>(),
        ..RelocationTables::default()
    };
    while (*item).d_tag != DT_NULL {
        let value = (*item).d_val;
        match (*item).d_tag {
            DT_RELA => tables.rela = value,
            DT_RELASZ => tables.rela_size = value,
            DT_RELAENT => tables.rela_entry_size = value,
            DT_RELR => tables.relr = value,
            DT_RELRSZ => tables.relr_size = value,
            DT_REL => tables.has_rel = true,
            _ => {}
        }
        item = item.add(1);
    }
    tables
}

unsafe fn apply_rela_relocations(base: usize, tables: &RelocationTables) {
    if tables.rela_entry_size == 0 {
        process::abort();
    }
    let mut offset = 0usize;
    while offset < tables.rela_size {
        let rela = &*(base.wrapping_add(tables.rela).wrapping_add(offset) as *const Rela);
        if rela.r_type() != arch::R_RELATIVE {
            process::abort();
        }
        let address = base.wrapping_add(rela.r_offset) as *mut usize;
        address.write(base.wrapping_add_signed(rela.r_addend));
        offset += tables.rela_entry_size;
    }
}

/// Applies a `DT_RELR` table of `size` bytes: even entries name an address
/// to relocate, odd entries are bitmaps over the words that follow it.
unsafe fn apply_relr_relocations(base: usize, table: *const usize, size: usize) {
    let word_size = core::mem::size_of::<usize>();
    let count = size / word_size;
    let mut where_addr = 0usize;

    let mut index = 0usize;
    while index < count {
        let entry = *table.add(index);
        if entry & 1 == 0 {
            where_addr = base.wrapping_add(entry);
            let value = core::ptr::read(where_addr as *const usize);
            core::ptr::write(where_addr as *mut usize, value.wrapping_add(base));
            where_addr = where_addr.wrapping_add(word_size);
        } else {
            let mut bitmap = entry >> 1;
            let mut bit = 0usize;
            while bitmap != 0 {
                if bitmap & 1 != 0 {
                    let addr = where_addr.wrapping_add(bit * word_size);
                    let value = core::ptr::read(addr as *const usize);
                    core::ptr::write(addr as *mut usize, value.wrapping_add(base));
                }
                bitmap >>= 1;
                bit += 1;
            }
            where_addr = where_addr.wrapping_add((usize::BITS as usize - 1) * word_size);
        }
        index += 1;
    }
}
