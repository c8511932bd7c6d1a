//! Mapping the interpreter's loadable segments the way the kernel maps a
//! `PT_INTERP` object.

use log::debug;

use crate::{
    elf::{program_header::ProgramHeader, ElfFile},
    error::Error,
    libc::mem::memset,
    mapping::{self, Mapping},
    page_size::PageSize,
};

/// Link-time address range covered by the loadable segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadableSpan {
    pub min_vaddr: usize,
    pub max_end: usize,
}

impl LoadableSpan {
    /// Fails when no segment occupies memory.
    pub fn of<'h>(segments: impl IntoIterator<Item = &'h ProgramHeader>) -> Result<Self, Error> {
        let mut min_vaddr = usize::MAX;
        let mut max_end = 0;
        for segment in segments.into_iter().filter(|segment| segment.is_mapped()) {
            min_vaddr = min_vaddr.min(segment.p_vaddr);
            max_end = max_end.max(segment.memory_end());
        }
        if max_end <= min_vaddr {
            return Err(Error::NoLoadableSegments);
        }
        Ok(Self { min_vaddr, max_end })
    }

    pub fn len(&self) -> usize {
        self.max_end - self.min_vaddr
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes to reserve so every segment's pages fit.
    pub fn reservation_size(&self, page_size: PageSize) -> usize {
        page_size.page_end(self.max_end) - page_size.page_start(self.min_vaddr)
    }
}

/// The interpreter's memory image.
#[derive(Debug)]
pub struct LoadedInterpreter {
    /// The reservation holding every segment.
    pub image: Mapping,
    /// Added to link-time addresses to get run-time ones.
    pub load_bias: usize,
    pub entry_point: usize,
}

impl LoadedInterpreter {
    /// Maps every loadable segment of `elf`. On failure everything mapped so
    /// far is released.
    pub fn map(elf: &ElfFile, page_size: PageSize) -> Result<Self, Error> {
        let span = LoadableSpan::of(elf.program_headers.iter())?;
        debug!(
            "loadable span {:#x}..{:#x} ({:#x} bytes)",
            span.min_vaddr,
            span.max_end,
            span.len()
        );

        let file_descriptor = elf.file.as_raw_fd();
        let mut image: Option<(Mapping, usize)> = None;

        for segment in elf.loadable_segments() {
            let map_start = page_size.page_start(segment.p_vaddr);
            let offset = page_size.page_start(segment.p_offset);
            let protection = segment.protection();

            let (reservation, load_bias) = match image.take() {
                Some((reservation, load_bias)) => {
                    let size = page_size.page_end(segment.memory_end()) - map_start;
                    unsafe {
                        mapping::map_fixed(
                            &reservation,
                            load_bias.wrapping_add(map_start),
                            size,
                            protection,
                            Some(file_descriptor),
                            offset,
                        )
                    }
                    .map_err(Error::MapSegment)?;
                    (reservation, load_bias)
                }
                None => {
                    // Segments are sorted by address, so the first one
                    // anchors the reservation for the whole span.
                    if segment.p_vaddr != span.min_vaddr {
                        return Err(Error::SegmentOrder);
                    }
                    let reservation = Mapping::map_file(
                        span.reservation_size(page_size),
                        protection,
                        file_descriptor,
                        offset,
                    )
                    .map_err(Error::MapSegment)?;
                    let load_bias = reservation.address().wrapping_sub(map_start);
                    (reservation, load_bias)
                }
            };
            debug!(
                "mapped segment {:#x}+{:#x} [{}] at {:#x}",
                segment.p_vaddr,
                segment.p_memsz,
                segment.flags(),
                load_bias.wrapping_add(segment.p_vaddr)
            );

            if segment.p_memsz > segment.p_filesz && segment.is_writable() {
                zero_fill_bss(&reservation, segment, load_bias, page_size)?;
            }
            image = Some((reservation, load_bias));
        }

        let Some((image, load_bias)) = image else {
            return Err(Error::NoLoadableSegments);
        };
        let entry_point = load_bias.wrapping_add(elf.header.e_entry);
        debug!("load bias {load_bias:#x}, entry point {entry_point:#x}");
        Ok(Self {
            image,
            load_bias,
            entry_point,
        })
    }
}

/// Zeroes a writable segment's memory past its file data: the rest of the
/// last file-backed page in place, whole pages with an anonymous mapping.
fn zero_fill_bss(
    reservation: &Mapping,
    segment: &ProgramHeader,
    load_bias: usize,
    page_size: PageSize,
) -> Result<(), Error> {
    let brk = load_bias.wrapping_add(segment.file_end());
    let page_brk = page_size.page_end(brk);
    let segment_end = load_bias.wrapping_add(page_size.page_end(segment.memory_end()));

    unsafe { memset(brk as *mut u8, 0, page_brk - brk) };

    if page_brk < segment_end {
        unsafe {
            mapping::map_fixed(
                reservation,
                page_brk,
                segment_end - page_brk,
                segment.protection(),
                None,
                0,
            )
        }
        .map_err(Error::MapSegment)?;
    }
    Ok(())
}
